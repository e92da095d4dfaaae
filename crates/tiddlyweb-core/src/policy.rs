//! Access policies.
//!
//! Every bag and recipe carries a [`Policy`]: for each [`Constraint`] a list
//! of [`Principal`] requirements. An empty list leaves the constraint
//! unrestricted; otherwise the caller must match at least one entry.
//!
//! Principals are written as strings in stored and serialized policies:
//!
//! | String   | Principal                              |
//! |----------|----------------------------------------|
//! | `ANY`    | any authenticated identity             |
//! | `R:NAME` | an identity holding role `NAME`        |
//! | `alice`  | the identity named `alice`             |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::PermissionError;
use crate::identity::CallerIdentity;

/// Role prefix used in policy strings.
pub const ROLE_PREFIX: &str = "R:";

/// Policy string meaning "any authenticated identity".
pub const ANY: &str = "ANY";

/// Role required by the `ADMIN` create policy setting.
pub const ADMIN_ROLE: &str = "ADMIN";

/// The actions a policy can constrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Constraint {
    /// Read the entity or its contents.
    Read,
    /// Modify existing contents.
    Write,
    /// Create new contents.
    Create,
    /// Delete the entity or its contents.
    Delete,
    /// Change the entity itself (policy, description).
    Manage,
    /// Accept contributions into the entity.
    Accept,
}

impl Constraint {
    /// Returns all constraints in canonical order.
    #[must_use]
    pub const fn all() -> [Constraint; 6] {
        [
            Self::Read,
            Self::Write,
            Self::Create,
            Self::Delete,
            Self::Manage,
            Self::Accept,
        ]
    }

    /// Returns the constraint name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Create => "create",
            Self::Delete => "delete",
            Self::Manage => "manage",
            Self::Accept => "accept",
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Constraint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown constraint: {s}"))
    }
}

/// A single requirement within a constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Principal {
    /// Any authenticated identity.
    AnyAuthenticated,
    /// An identity holding the named role.
    Role(String),
    /// The identity with this exact name.
    User(String),
}

impl Principal {
    /// Returns true if `identity` satisfies this requirement.
    #[must_use]
    pub fn admits(&self, identity: &CallerIdentity) -> bool {
        match self {
            Self::AnyAuthenticated => !identity.is_anonymous(),
            Self::Role(role) => identity.has_role(role),
            Self::User(name) => identity.name() == Some(name.as_str()),
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnyAuthenticated => f.write_str(ANY),
            Self::Role(role) => write!(f, "{ROLE_PREFIX}{role}"),
            Self::User(name) => f.write_str(name),
        }
    }
}

impl From<&str> for Principal {
    fn from(s: &str) -> Self {
        if s == ANY {
            Self::AnyAuthenticated
        } else if let Some(role) = s.strip_prefix(ROLE_PREFIX) {
            Self::Role(role.to_string())
        } else {
            Self::User(s.to_string())
        }
    }
}

impl Serialize for Principal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Principal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s.as_str()))
    }
}

/// Per-constraint access rules for a bag or recipe.
///
/// # Example
///
/// ```
/// use tiddlyweb_core::{CallerIdentity, Constraint, Policy, Principal};
///
/// let mut policy = Policy::default();
/// policy.set(Constraint::Write, vec![Principal::Role("ADMIN".into())]);
///
/// assert!(policy.allows(&CallerIdentity::anonymous(), Constraint::Read).is_ok());
/// assert!(policy.allows(&CallerIdentity::user("bob", ["ADMIN"]), Constraint::Write).is_ok());
/// let eve = CallerIdentity::user("eve", Vec::<String>::new());
/// assert!(policy.allows(&eve, Constraint::Write).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    /// The owning user, informational only.
    pub owner: Option<String>,
    /// Who may read.
    pub read: Vec<Principal>,
    /// Who may write.
    pub write: Vec<Principal>,
    /// Who may create.
    pub create: Vec<Principal>,
    /// Who may delete.
    pub delete: Vec<Principal>,
    /// Who may manage.
    pub manage: Vec<Principal>,
    /// Who may contribute.
    pub accept: Vec<Principal>,
}

impl Policy {
    /// Creates an unrestricted policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a policy restricting every constraint to `principals`.
    #[must_use]
    pub fn restricted_to(principals: Vec<Principal>) -> Self {
        let mut policy = Self::default();
        for constraint in Constraint::all() {
            policy.set(constraint, principals.clone());
        }
        policy
    }

    /// Returns the requirements for a constraint.
    #[must_use]
    pub fn requirements(&self, constraint: Constraint) -> &[Principal] {
        match constraint {
            Constraint::Read => &self.read,
            Constraint::Write => &self.write,
            Constraint::Create => &self.create,
            Constraint::Delete => &self.delete,
            Constraint::Manage => &self.manage,
            Constraint::Accept => &self.accept,
        }
    }

    /// Replaces the requirements for a constraint.
    pub fn set(&mut self, constraint: Constraint, principals: Vec<Principal>) {
        let slot = match constraint {
            Constraint::Read => &mut self.read,
            Constraint::Write => &mut self.write,
            Constraint::Create => &mut self.create,
            Constraint::Delete => &mut self.delete,
            Constraint::Manage => &mut self.manage,
            Constraint::Accept => &mut self.accept,
        };
        *slot = principals;
    }

    /// Checks whether `identity` may perform `constraint`.
    ///
    /// Anonymous callers that fail a restricted constraint get
    /// [`PermissionError::UserRequired`]; authenticated callers get
    /// [`PermissionError::Forbidden`].
    pub fn allows(
        &self,
        identity: &CallerIdentity,
        constraint: Constraint,
    ) -> Result<(), PermissionError> {
        let requirements = self.requirements(constraint);
        if requirements.is_empty() || requirements.iter().any(|p| p.admits(identity)) {
            return Ok(());
        }

        let message = format!("{} may not {}", identity.log_id(), constraint);
        if identity.is_anonymous() {
            Err(PermissionError::UserRequired(message))
        } else {
            Err(PermissionError::Forbidden(message))
        }
    }
}

/// An entity guarded by a policy.
pub trait Protected {
    /// Returns the entity's policy.
    fn policy(&self) -> &Policy;
}

/// Checks `constraint` for `identity` against `entity`'s policy.
pub fn check<E>(
    identity: &CallerIdentity,
    entity: &E,
    constraint: Constraint,
) -> Result<(), PermissionError>
where
    E: Protected + ?Sized,
{
    entity.policy().allows(identity, constraint)
}

/// Checks a server-level create policy setting.
///
/// `""` lets anyone create, `ANY` requires an authenticated identity and
/// `ADMIN` requires the `ADMIN` role.
pub fn check_create_policy(
    identity: &CallerIdentity,
    setting: &str,
) -> Result<(), PermissionError> {
    let admitted = match setting {
        "" => true,
        ANY => !identity.is_anonymous(),
        ADMIN_ROLE => identity.has_role(ADMIN_ROLE),
        other => identity.name() == Some(other),
    };

    if admitted {
        Ok(())
    } else if identity.is_anonymous() {
        Err(PermissionError::UserRequired(format!(
            "{} may not create",
            identity.log_id()
        )))
    } else {
        Err(PermissionError::Forbidden(format!(
            "{} may not create",
            identity.log_id()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin_only(constraint: Constraint) -> Policy {
        let mut policy = Policy::new();
        policy.set(constraint, vec![Principal::Role("ADMIN".to_string())]);
        policy
    }

    #[test]
    fn test_role_requirement() {
        let policy = admin_only(Constraint::Manage);

        let plain = CallerIdentity::user("bob", Vec::<String>::new());
        let admin = CallerIdentity::user("alice", ["ADMIN"]);

        assert_eq!(
            policy.allows(&plain, Constraint::Manage),
            Err(PermissionError::Forbidden("bob may not manage".to_string()))
        );
        assert!(policy.allows(&admin, Constraint::Manage).is_ok());
    }

    #[test]
    fn test_empty_requirements_admit_anyone() {
        let policy = admin_only(Constraint::Write);
        assert!(policy.allows(&CallerIdentity::anonymous(), Constraint::Read).is_ok());
        assert!(policy
            .allows(&CallerIdentity::user("x", Vec::<String>::new()), Constraint::Delete)
            .is_ok());
    }

    #[test]
    fn test_anonymous_gets_user_required() {
        let policy = Policy::restricted_to(vec![Principal::AnyAuthenticated]);
        let result = policy.allows(&CallerIdentity::anonymous(), Constraint::Read);
        assert!(matches!(result, Err(PermissionError::UserRequired(_))));

        let user = CallerIdentity::user("carol", Vec::<String>::new());
        assert!(policy.allows(&user, Constraint::Read).is_ok());
    }

    #[test]
    fn test_allow_list() {
        let mut policy = Policy::new();
        policy.set(
            Constraint::Write,
            vec![Principal::User("carol".into()), Principal::User("dave".into())],
        );

        assert!(policy
            .allows(&CallerIdentity::user("dave", Vec::<String>::new()), Constraint::Write)
            .is_ok());
        assert!(policy
            .allows(&CallerIdentity::user("erin", Vec::<String>::new()), Constraint::Write)
            .is_err());
    }

    #[test]
    fn test_principal_strings() {
        assert_eq!(Principal::from("ANY"), Principal::AnyAuthenticated);
        assert_eq!(Principal::from("R:ADMIN"), Principal::Role("ADMIN".into()));
        assert_eq!(Principal::from("alice"), Principal::User("alice".into()));
        assert_eq!(Principal::Role("EDITOR".into()).to_string(), "R:EDITOR");
    }

    #[test]
    fn test_policy_json_shape() {
        let json = r#"{"read": [], "write": ["R:ADMIN", "ANY"], "owner": "alice"}"#;
        let policy: Policy = serde_json::from_str(json).unwrap();

        assert_eq!(policy.owner.as_deref(), Some("alice"));
        assert_eq!(
            policy.write,
            vec![Principal::Role("ADMIN".into()), Principal::AnyAuthenticated]
        );
        assert!(policy.manage.is_empty());

        let back = serde_json::to_value(&policy).unwrap();
        assert_eq!(back["write"][0], "R:ADMIN");
    }

    #[test]
    fn test_constraint_from_str() {
        assert_eq!("delete".parse::<Constraint>(), Ok(Constraint::Delete));
        assert!("destroy".parse::<Constraint>().is_err());
    }

    #[test]
    fn test_create_policy_settings() {
        let anon = CallerIdentity::anonymous();
        let user = CallerIdentity::user("u", Vec::<String>::new());
        let admin = CallerIdentity::user("a", ["ADMIN"]);

        assert!(check_create_policy(&anon, "").is_ok());
        assert!(matches!(
            check_create_policy(&anon, "ANY"),
            Err(PermissionError::UserRequired(_))
        ));
        assert!(check_create_policy(&user, "ANY").is_ok());
        assert!(matches!(
            check_create_policy(&user, "ADMIN"),
            Err(PermissionError::Forbidden(_))
        ));
        assert!(check_create_policy(&admin, "ADMIN").is_ok());
    }
}
