//! Caller identity.
//!
//! A [`CallerIdentity`] is the principal resolved for a request by the
//! identity extraction stage. Requests without usable credentials run as
//! [`CallerIdentity::Anonymous`], which fails every constraint that requires
//! authentication.

use serde::{Deserialize, Serialize};

/// Name reported for the anonymous principal.
pub const GUEST_NAME: &str = "GUEST";

/// The resolved principal for a request.
///
/// # Example
///
/// ```
/// use tiddlyweb_core::CallerIdentity;
///
/// let identity = CallerIdentity::user("alice", ["ADMIN"]);
/// assert!(identity.has_role("ADMIN"));
/// assert_eq!(identity.log_id(), "alice");
/// assert_eq!(CallerIdentity::anonymous().log_id(), "GUEST");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CallerIdentity {
    /// No credentials were presented (or none were accepted).
    #[default]
    Anonymous,

    /// An authenticated user.
    User {
        /// The user name.
        name: String,
        /// Roles held by the user.
        roles: Vec<String>,
    },
}

impl CallerIdentity {
    /// Returns the anonymous principal.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self::Anonymous
    }

    /// Creates an authenticated identity.
    #[must_use]
    pub fn user<I, S>(name: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::User {
            name: name.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns true for the anonymous principal.
    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }

    /// Returns the user name, if authenticated.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::User { name, .. } => Some(name),
            Self::Anonymous => None,
        }
    }

    /// Returns the roles held by this identity.
    #[must_use]
    pub fn roles(&self) -> &[String] {
        match self {
            Self::User { roles, .. } => roles,
            Self::Anonymous => &[],
        }
    }

    /// Returns true if the identity holds `role`.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles().iter().any(|r| r == role)
    }

    /// Returns a string identifier suitable for logging.
    #[must_use]
    pub fn log_id(&self) -> &str {
        self.name().unwrap_or(GUEST_NAME)
    }
}
