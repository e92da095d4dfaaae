//! Access logging and request metrics.
//!
//! Runs last, so it sees the final status of every request exactly once.

use http::StatusCode;
use tiddlyweb_telemetry::{record_not_modified, record_request};
use tracing::{info, warn};

use crate::pipeline::ResponseStage;
use crate::types::Outcome;
use crate::RequestContext;

/// Route label for requests that matched no route.
pub const UNMATCHED_ROUTE: &str = "unmatched";

/// The `simple_log` stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleLog;

impl ResponseStage for SimpleLog {
    fn name(&self) -> &'static str {
        "simple_log"
    }

    fn process(&self, ctx: &mut RequestContext, outcome: Outcome) -> Outcome {
        let status = match &outcome {
            Ok(reply) => reply.status,
            Err(err) => err.status_code(),
        };
        let elapsed = ctx.elapsed();
        let route = ctx.route.as_deref().unwrap_or(UNMATCHED_ROUTE);

        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        if status.is_server_error() {
            warn!(
                request_id = %ctx.request_id(),
                method = %ctx.method(),
                path = ctx.path(),
                status = status.as_u16(),
                elapsed_ms,
                user = ctx.identity().log_id(),
                "Request failed"
            );
        } else {
            info!(
                request_id = %ctx.request_id(),
                method = %ctx.method(),
                path = ctx.path(),
                status = status.as_u16(),
                elapsed_ms,
                user = ctx.identity().log_id(),
                "Request completed"
            );
        }

        record_request(route, status.as_u16(), elapsed);
        if status == StatusCode::NOT_MODIFIED {
            record_not_modified(route);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HttpError, Reply};

    #[test]
    fn test_outcome_passed_through() {
        let mut ctx = RequestContext::detached("/bags");
        ctx.route = Some("/bags".into());

        let reply = SimpleLog.process(&mut ctx, Ok(Reply::text("ok"))).unwrap();
        assert_eq!(reply.body.as_text(), Some("ok"));

        let outcome = SimpleLog.process(&mut ctx, Err(HttpError::NotFound("gone".into())));
        assert!(matches!(outcome, Err(HttpError::NotFound(_))));
    }
}
