//! Observability for TiddlyWeb.
//!
//! - **Logging**: `tracing` events rendered as JSON lines or pretty text
//!   by `tracing-subscriber`, filtered by an `EnvFilter` directive.
//! - **Metrics**: request counters and latency histograms emitted through
//!   the `metrics` facade. Whichever recorder the embedding binary installs
//!   receives them; without one they are dropped.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `tiddlyweb_requests_total` | Counter | `route`, `status` |
//! | `tiddlyweb_request_duration_seconds` | Histogram | `route` |
//! | `tiddlyweb_in_flight_requests` | Gauge | - |
//! | `tiddlyweb_not_modified_total` | Counter | `route` |

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig, LogFormat};
pub use metrics::{describe_metrics, record_not_modified, record_request, InFlightGuard};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
