//! Recipes: ordered compositions of bags.

use serde::{Deserialize, Serialize};

use crate::policy::{Policy, Protected};

/// A named, ordered list of `(bag, filter)` pairs with an access policy.
///
/// Later entries take precedence when the same title appears in several
/// bags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// The recipe name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub desc: String,
    /// Access policy.
    #[serde(default)]
    pub policy: Policy,
    /// The `(bag name, filter expression)` pairs, in order.
    #[serde(default)]
    pub recipe: Vec<(String, String)>,
}

impl Recipe {
    /// Creates an empty recipe with an unrestricted policy.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Appends a `(bag, filter)` pair.
    #[must_use]
    pub fn with_bag(mut self, bag: impl Into<String>, filter: impl Into<String>) -> Self {
        self.recipe.push((bag.into(), filter.into()));
        self
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

    /// Returns the bag names in recipe order.
    pub fn bag_names(&self) -> impl Iterator<Item = &str> {
        self.recipe.iter().map(|(bag, _)| bag.as_str())
    }
}

impl Protected for Recipe {
    fn policy(&self) -> &Policy {
        &self.policy
    }
}
