//! Renders every remaining terminal outcome as a reply.
//!
//! `304 Not Modified` carries the validators and no body. Server failures
//! are logged here and answered with a generic message; every other
//! outcome is sent back as plain text.

use http::header::{ALLOW, CACHE_CONTROL, ETAG, LAST_MODIFIED, VARY};
use http::StatusCode;
use tracing::error;

use crate::pipeline::ResponseStage;
use crate::types::Outcome;
use crate::{HttpError, NotModified, Reply, RequestContext};

/// The `http_exceptor` stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpExceptor;

impl ResponseStage for HttpExceptor {
    fn name(&self) -> &'static str {
        "http_exceptor"
    }

    fn process(&self, ctx: &mut RequestContext, outcome: Outcome) -> Outcome {
        let err = match outcome {
            Ok(reply) => return Ok(reply),
            Err(err) => err,
        };
        let status = err.status_code();

        let reply = match err {
            HttpError::NotModified(validators) => not_modified(validators),
            HttpError::MethodNotAllowed { method, allow } => {
                let mut reply =
                    Reply::text(format!("{method} not allowed")).with_header(ALLOW, allow);
                reply.status = status;
                reply
            }
            HttpError::Internal(message) => {
                error!(
                    request_id = %ctx.request_id(),
                    path = ctx.path(),
                    error = %message,
                    "Internal server error"
                );
                let mut reply = Reply::text("Internal Server Error");
                reply.status = status;
                reply
            }
            other => {
                let mut reply = Reply::text(other.to_string());
                reply.status = status;
                reply
            }
        };
        Ok(reply)
    }
}

fn not_modified(validators: NotModified) -> Reply {
    let mut reply = Reply::new(StatusCode::NOT_MODIFIED);
    if !validators.etag.is_empty() {
        reply = reply.with_header(ETAG, validators.etag);
    }
    reply = reply.with_header(CACHE_CONTROL, validators.cache_control);
    if let Some(last_modified) = validators.last_modified {
        reply = reply.with_header(LAST_MODIFIED, last_modified);
    }
    reply.with_header(VARY, validators.vary)
}
