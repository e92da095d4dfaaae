//! Renders policy denials.
//!
//! An anonymous caller that was denied gets `401` and a Basic challenge so
//! a client can retry with credentials; an identified caller gets `403`.

use http::header::WWW_AUTHENTICATE;
use tiddlyweb_core::PermissionError;
use tracing::debug;

use crate::pipeline::ResponseStage;
use crate::types::Outcome;
use crate::{HttpError, Reply, RequestContext};

/// Challenge sent with `401 Unauthorized`.
pub const BASIC_CHALLENGE: &str = "Basic realm=\"tiddlyweb\"";

/// The `permissions_exceptor` stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionsExceptor;

impl ResponseStage for PermissionsExceptor {
    fn name(&self) -> &'static str {
        "permissions_exceptor"
    }

    fn process(&self, ctx: &mut RequestContext, outcome: Outcome) -> Outcome {
        let denial = match outcome {
            Err(HttpError::AccessDenied(denial)) => denial,
            other => return other,
        };
        debug!(user = ctx.identity().log_id(), reason = %denial, "Access denied");

        let mut reply = Reply::text(denial.to_string());
        match denial {
            PermissionError::UserRequired(_) => {
                reply.status = http::StatusCode::UNAUTHORIZED;
                reply = reply.with_header(WWW_AUTHENTICATE, BASIC_CHALLENGE);
            }
            PermissionError::Forbidden(_) => reply.status = http::StatusCode::FORBIDDEN,
        }
        Ok(reply)
    }
}
