//! Request header extraction.
//!
//! Copies the headers later stages and handlers care about into typed
//! context fields, so nothing downstream reads raw header maps.

use http::header::{
    HeaderMap, HeaderName, CONTENT_LENGTH, CONTENT_TYPE, IF_MODIFIED_SINCE, IF_NONE_MATCH,
};

use crate::pipeline::RequestStage;
use crate::{HttpError, Request, RequestContext};

/// The `header` stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct Header;

impl RequestStage for Header {
    fn name(&self) -> &'static str {
        "header"
    }

    fn process(&self, ctx: &mut RequestContext, request: &Request) -> Result<(), HttpError> {
        let headers = request.headers();

        ctx.if_none_match = header_str(headers, &IF_NONE_MATCH).map(str::to_string);
        ctx.if_modified_since = header_str(headers, &IF_MODIFIED_SINCE).map(str::to_string);

        ctx.content_length = header_str(headers, &CONTENT_LENGTH)
            .map(|value| {
                value
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| HttpError::bad_request(format!("invalid Content-Length: {value}")))
            })
            .transpose()?;

        ctx.content_type = header_str(headers, &CONTENT_TYPE)
            .and_then(|value| value.split(';').next())
            .map(|mime| mime.trim().to_ascii_lowercase())
            .filter(|mime| !mime.is_empty());

        Ok(())
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
