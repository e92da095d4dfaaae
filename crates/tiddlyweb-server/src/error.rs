//! Server errors.

use thiserror::Error;
use tiddlyweb_config::ConfigError;
use tiddlyweb_core::WikiError;
use tiddlyweb_middleware::extractor::UnknownExtractor;
use tiddlyweb_telemetry::TelemetryError;

/// Errors that stop the server from starting or running.
#[derive(Error, Debug)]
pub enum ServerError {
    /// The listener could not be bound.
    #[error("bind error: {0}")]
    Bind(String),

    /// An I/O error outside any one request.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The configuration names a credential extractor that does not exist.
    #[error(transparent)]
    Extractor(#[from] UnknownExtractor),

    /// The store could not be prepared.
    #[error("store error: {0}")]
    Store(#[from] WikiError),

    /// Logging could not be initialized.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

/// Result alias for server setup.
pub type ServerResult<T> = Result<T, ServerError>;
