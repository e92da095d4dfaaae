//! Error types for TiddlyWeb.
//!
//! [`WikiError`] is the error type returned by the model, the policy engine,
//! the storage interface and the serializations. The web layer converts it
//! into a terminal HTTP outcome; nothing here knows about response bodies.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`WikiError`].
pub type WikiResult<T> = Result<T, WikiError>;

/// The kinds of stored entity, used to describe missing resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A bag (collection of tiddlers).
    Bag,
    /// A recipe (ordered composition of bags).
    Recipe,
    /// A tiddler.
    Tiddler,
    /// A specific tiddler revision.
    Revision,
    /// A user record.
    User,
}

impl EntityKind {
    /// Returns the lowercase name of the entity kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bag => "bag",
            Self::Recipe => "recipe",
            Self::Tiddler => "tiddler",
            Self::Revision => "revision",
            Self::User => "user",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A policy check failure.
///
/// `UserRequired` is raised when the caller is anonymous and could pass the
/// constraint by authenticating; `Forbidden` when an authenticated caller
/// does not satisfy it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    /// The caller must authenticate.
    #[error("{0}")]
    UserRequired(String),

    /// The authenticated caller is not allowed.
    #[error("{0}")]
    Forbidden(String),
}

impl PermissionError {
    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::UserRequired(message) | Self::Forbidden(message) => message,
        }
    }

    /// Returns true if authenticating could resolve the denial.
    #[must_use]
    pub const fn is_user_required(&self) -> bool {
        matches!(self, Self::UserRequired(_))
    }

    /// Prefixes the message with `context`, keeping the denial kind.
    #[must_use]
    pub fn with_context(self, context: impl std::fmt::Display) -> Self {
        match self {
            Self::UserRequired(message) => Self::UserRequired(format!("{context}: {message}")),
            Self::Forbidden(message) => Self::Forbidden(format!("{context}: {message}")),
        }
    }
}

/// Standard error type for TiddlyWeb.
#[derive(Error, Debug)]
pub enum WikiError {
    /// The referenced entity does not exist.
    #[error("{kind} {name} not found")]
    NotFound {
        /// What kind of entity was looked up.
        kind: EntityKind,
        /// The name (or `bag/title` path) that was looked up.
        name: String,
    },

    /// A policy denied the operation.
    #[error(transparent)]
    Permission(#[from] PermissionError),

    /// Input could not be turned into an entity.
    #[error("invalid input: {0}")]
    Invalid(String),

    /// A serialization has no representation for the requested operation.
    #[error("{format} serialization does not support {operation}")]
    Unsupported {
        /// The serialization format name.
        format: String,
        /// The operation that was attempted.
        operation: &'static str,
    },

    /// The storage backend failed.
    #[error("store error: {message}")]
    Store {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl WikiError {
    /// Creates a not found error.
    #[must_use]
    pub fn not_found(kind: EntityKind, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    /// Creates an unsupported-operation error for a serialization.
    #[must_use]
    pub fn unsupported(format: impl Into<String>, operation: &'static str) -> Self {
        Self::Unsupported {
            format: format.into(),
            operation,
        }
    }

    /// Creates a store error with an underlying cause.
    pub fn store(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Store {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns true for missing-entity errors.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns the HTTP status code this error maps to.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Permission(PermissionError::UserRequired(_)) => StatusCode::UNAUTHORIZED,
            Self::Permission(PermissionError::Forbidden(_)) => StatusCode::FORBIDDEN,
            Self::Invalid(_) => StatusCode::BAD_REQUEST,
            Self::Unsupported { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<serde_json::Error> for WikiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Invalid(err.to_string())
    }
}
