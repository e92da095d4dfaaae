//! Helpers handlers use to read route values and request bodies.

use crate::{HttpError, Request, RequestContext};

/// Returns a route parameter, percent-decoded as UTF-8.
///
/// A missing parameter is an internal error (the route table and handler
/// disagree); undecodable input is a bad request.
pub fn get_route_value(ctx: &RequestContext, name: &str) -> Result<String, HttpError> {
    let raw = ctx
        .route_params
        .get(name)
        .ok_or_else(|| HttpError::internal(format!("route has no {name} parameter")))?;
    urlencoding::decode(raw)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| {
            HttpError::bad_request(format!("incorrect encoding for {name}, UTF-8 required: {e}"))
        })
}

/// Returns the declared length and type of a write request's body.
pub fn content_length_and_type(ctx: &RequestContext) -> Result<(usize, String), HttpError> {
    match (ctx.content_length, ctx.content_type.as_deref()) {
        (Some(length), Some(content_type)) => Ok((length, content_type.to_string())),
        _ => Err(HttpError::bad_request(
            "Content-Length and content-type required to PUT or POST",
        )),
    }
}

/// Reads `length` bytes of the request body as UTF-8 text.
pub fn read_request_body(request: &Request, length: usize) -> Result<String, HttpError> {
    let body = request.body();
    if body.len() < length {
        return Err(HttpError::bad_request(format!(
            "Error reading request body: expected {length} bytes, got {}",
            body.len()
        )));
    }
    String::from_utf8(body[..length].to_vec())
        .map_err(|e| HttpError::bad_request(format!("Error reading request body: {e}")))
}

/// Removes a recognized extension from a resource name taken from the
/// route, so `foo.json` names `foo`.
///
/// An extension that is not recognized is part of the name; it is cleared
/// from the context so negotiation does not reject the request over it.
pub fn handle_extension(ctx: &mut RequestContext, resource_name: &str) -> String {
    let recognized = ctx
        .extension
        .as_deref()
        .filter(|ext| ctx.config().mime_for_extension(ext).is_some())
        .map(str::to_string);

    match recognized {
        Some(ext) => resource_name
            .strip_suffix(&format!(".{ext}"))
            .unwrap_or(resource_name)
            .to_string(),
        None => {
            ctx.extension = None;
            resource_name.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_route_value_decoding() {
        let mut ctx = RequestContext::detached("/");
        ctx.route_params.insert("tiddler_name".into(), "caf%C3%A9%2Fx".into());
        ctx.route_params.insert("bad".into(), "%FF".into());

        assert_eq!(get_route_value(&ctx, "tiddler_name").unwrap(), "café/x");
        assert!(matches!(
            get_route_value(&ctx, "bad"),
            Err(HttpError::BadRequest(ref m)) if m.starts_with("incorrect encoding for bad")
        ));
        assert!(matches!(
            get_route_value(&ctx, "missing"),
            Err(HttpError::Internal(_))
        ));
    }

    #[test]
    fn test_content_length_and_type_required() {
        let mut ctx = RequestContext::detached("/");
        assert!(content_length_and_type(&ctx).is_err());

        ctx.content_length = Some(10);
        ctx.content_type = Some("application/json".into());
        assert_eq!(
            content_length_and_type(&ctx).unwrap(),
            (10, "application/json".to_string())
        );
    }

    #[test]
    fn test_read_request_body() {
        let request = http::Request::put("/")
            .body(Bytes::from_static(b"hello world"))
            .unwrap();
        assert_eq!(read_request_body(&request, 5).unwrap(), "hello");
        assert!(read_request_body(&request, 50).is_err());
    }

    #[test]
    fn test_handle_extension() {
        let mut ctx = RequestContext::detached("/bags/alpha/tiddlers/foo.json");
        ctx.extension = Some("json".into());
        assert_eq!(handle_extension(&mut ctx, "foo.json"), "foo");
        assert_eq!(ctx.extension.as_deref(), Some("json"));

        ctx.extension = Some("bag".into());
        assert_eq!(handle_extension(&mut ctx, "my.bag"), "my.bag");
        assert_eq!(ctx.extension, None);
    }
}
