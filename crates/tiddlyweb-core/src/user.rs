//! User records.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::identity::CallerIdentity;

/// A stored user: name, roles and a password digest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// The user name.
    pub usersign: String,
    /// Free-form note.
    #[serde(default)]
    pub note: String,
    /// Roles held by the user.
    #[serde(default)]
    pub roles: BTreeSet<String>,
    /// Hex SHA-256 digest of the password.
    #[serde(default)]
    password: String,
}

impl User {
    /// Creates a user with no password and no roles.
    #[must_use]
    pub fn new(usersign: impl Into<String>) -> Self {
        Self {
            usersign: usersign.into(),
            ..Self::default()
        }
    }

    /// Sets the password.
    pub fn set_password(&mut self, password: &str) {
        self.password = hex::encode(Sha256::digest(password.as_bytes()));
    }

    /// Returns true if `password` matches. Users without a password never
    /// match.
    #[must_use]
    pub fn check_password(&self, password: &str) -> bool {
        !self.password.is_empty()
            && self.password == hex::encode(Sha256::digest(password.as_bytes()))
    }

    /// Adds a role.
    pub fn add_role(&mut self, role: impl Into<String>) {
        self.roles.insert(role.into());
    }

    /// Returns the identity this user resolves to.
    #[must_use]
    pub fn identity(&self) -> CallerIdentity {
        CallerIdentity::user(self.usersign.clone(), self.roles.iter().cloned())
    }
}
