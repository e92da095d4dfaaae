//! Request metrics.
//!
//! Route labels are route templates (`/bags/{bag_name}`), never concrete
//! paths, so label cardinality stays bounded.

use std::sync::Once;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};

static DESCRIBE: Once = Once::new();

/// Registers metric descriptions with the installed recorder. Only the
/// first call has an effect.
pub fn describe_metrics() {
    DESCRIBE.call_once(|| {
        describe_counter!(
            "tiddlyweb_requests_total",
            "Total number of HTTP requests processed"
        );
        describe_histogram!(
            "tiddlyweb_request_duration_seconds",
            "HTTP request duration in seconds"
        );
        describe_gauge!(
            "tiddlyweb_in_flight_requests",
            "Number of HTTP requests currently being processed"
        );
        describe_counter!(
            "tiddlyweb_not_modified_total",
            "Requests answered with 304 Not Modified"
        );
    });
}

/// Records a completed request.
pub fn record_request(route: &str, status_code: u16, duration: Duration) {
    counter!(
        "tiddlyweb_requests_total",
        "route" => route.to_string(),
        "status" => status_code.to_string()
    )
    .increment(1);

    histogram!(
        "tiddlyweb_request_duration_seconds",
        "route" => route.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Records a conditional request answered from the client's cache.
pub fn record_not_modified(route: &str) {
    counter!("tiddlyweb_not_modified_total", "route" => route.to_string()).increment(1);
}

/// Tracks one in-flight request; the gauge is decremented on drop.
pub struct InFlightGuard {
    _private: (),
}

impl InFlightGuard {
    /// Increments the in-flight gauge.
    #[must_use]
    pub fn new() -> Self {
        gauge!("tiddlyweb_in_flight_requests").increment(1.0);
        Self { _private: () }
    }
}

impl Default for InFlightGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        gauge!("tiddlyweb_in_flight_requests").decrement(1.0);
    }
}
