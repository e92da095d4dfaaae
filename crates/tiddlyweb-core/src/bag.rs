//! Bags: named containers of tiddlers.

use serde::{Deserialize, Serialize};

use crate::policy::{Policy, Protected};

/// A named collection of tiddlers with an access policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bag {
    /// The bag name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub desc: String,
    /// Access policy.
    #[serde(default)]
    pub policy: Policy,
}

impl Bag {
    /// Creates a bag with an unrestricted policy.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            desc: String::new(),
            policy: Policy::default(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }

    /// Sets the policy.
    #[must_use]
    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }
}

impl Protected for Bag {
    fn policy(&self) -> &Policy {
        &self.policy
    }
}
