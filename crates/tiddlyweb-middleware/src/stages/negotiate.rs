//! Builds the acceptable-type list and makes a first negotiation.
//!
//! The result stored in the context assumes a single-entity response.
//! Handlers that render collections, or that strip an extension off a
//! route value, negotiate again with [`get_serialize_type`].

use http::header::ACCEPT;

use crate::negotiate::{get_serialize_type, parse_accept, path_extension};
use crate::pipeline::RequestStage;
use crate::{HttpError, Request, RequestContext};

/// The `negotiate` stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct Negotiate;

impl RequestStage for Negotiate {
    fn name(&self) -> &'static str {
        "negotiate"
    }

    fn process(&self, ctx: &mut RequestContext, request: &Request) -> Result<(), HttpError> {
        ctx.extension = path_extension(ctx.path()).map(str::to_string);

        let mut accept = Vec::new();
        if let Some(mime) = ctx
            .extension
            .as_deref()
            .and_then(|ext| ctx.config().mime_for_extension(ext))
        {
            accept.push(mime.to_string());
        }
        if let Some(header) = request.headers().get(ACCEPT).and_then(|v| v.to_str().ok()) {
            accept.extend(parse_accept(header));
        }
        ctx.accept = accept;

        // An unrecognized extension may still be part of a resource name, so
        // failure here is left for the handler to decide.
        ctx.negotiated = get_serialize_type(ctx, false).ok().flatten();
        Ok(())
    }
}
