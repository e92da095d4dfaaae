//! Terminal request outcomes.

use http::{Method, StatusCode};
use thiserror::Error;
use tiddlyweb_core::{PermissionError, WikiError};

/// The validators carried by a `304 Not Modified` outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotModified {
    /// The matching entity tag (may be empty).
    pub etag: String,
    /// `Cache-Control` directive.
    pub cache_control: String,
    /// `Last-Modified` value, if known.
    pub last_modified: Option<String>,
    /// `Vary` value.
    pub vary: String,
}

/// An outcome that ends request processing.
///
/// Stages and handlers return these instead of writing a response; the
/// `permissions_exceptor` and `http_exceptor` response stages render them.
#[derive(Error, Debug)]
pub enum HttpError {
    /// Malformed or missing request metadata or body.
    #[error("{0}")]
    BadRequest(String),

    /// The requested representation is not available.
    #[error("{0}")]
    UnsupportedMediaType(String),

    /// The client's cached copy is current.
    #[error("not modified")]
    NotModified(NotModified),

    /// A policy denied the request.
    #[error(transparent)]
    AccessDenied(#[from] PermissionError),

    /// The referenced entity or route does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The route exists but not for this method.
    #[error("{method} not allowed")]
    MethodNotAllowed {
        /// The rejected method.
        method: Method,
        /// Value for the `Allow` header.
        allow: String,
    },

    /// The request conflicts with the current state.
    #[error("{0}")]
    Conflict(String),

    /// The server failed.
    #[error("{0}")]
    Internal(String),
}

impl HttpError {
    /// Creates a bad request outcome.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Creates an internal error outcome.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns the status code this outcome renders as.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::NotModified(_) => StatusCode::NOT_MODIFIED,
            Self::AccessDenied(PermissionError::UserRequired(_)) => StatusCode::UNAUTHORIZED,
            Self::AccessDenied(PermissionError::Forbidden(_)) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<WikiError> for HttpError {
    fn from(err: WikiError) -> Self {
        match err {
            WikiError::NotFound { .. } => Self::NotFound(err.to_string()),
            WikiError::Permission(denial) => Self::AccessDenied(denial),
            WikiError::Invalid(message) => Self::BadRequest(message),
            WikiError::Unsupported { .. } => Self::UnsupportedMediaType(err.to_string()),
            WikiError::Store { .. } => {
                tracing::error!(error = %err, "Store failure");
                Self::Internal(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiddlyweb_core::EntityKind;

    #[test]
    fn test_wiki_error_kinds_preserved() {
        let not_found: HttpError = WikiError::not_found(EntityKind::Bag, "alpha").into();
        assert!(matches!(not_found, HttpError::NotFound(ref m) if m == "bag alpha not found"));

        let denied: HttpError =
            WikiError::Permission(PermissionError::Forbidden("no".into())).into();
        assert_eq!(denied.status_code(), StatusCode::FORBIDDEN);

        let invalid: HttpError = WikiError::invalid("bad json").into();
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);

        let unsupported: HttpError = WikiError::unsupported("text", "bag_as").into();
        assert_eq!(unsupported.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn test_user_required_is_401() {
        let err = HttpError::from(PermissionError::UserRequired("login".into()));
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.to_string(), "login");
    }
}
