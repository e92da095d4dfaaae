//! Query string decoding.
//!
//! Parameters from the URL query string, and from the body of a
//! `application/x-www-form-urlencoded` POST, are decoded into
//! [`RequestContext::query`]. Repeated names keep every value in order.

use std::collections::BTreeMap;

use http::header::CONTENT_TYPE;
use http::Method;

use crate::pipeline::RequestStage;
use crate::{HttpError, Request, RequestContext};

const FORM_TYPE: &str = "application/x-www-form-urlencoded";

/// The `query` stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct Query;

impl RequestStage for Query {
    fn name(&self) -> &'static str {
        "query"
    }

    fn process(&self, ctx: &mut RequestContext, request: &Request) -> Result<(), HttpError> {
        if let Some(query) = request.uri().query() {
            parse_into(&mut ctx.query, query)?;
        }

        if *request.method() == Method::POST && is_form(request) {
            let body = std::str::from_utf8(request.body())
                .map_err(|e| HttpError::bad_request(format!("form body is not UTF-8: {e}")))?;
            parse_into(&mut ctx.query, body)?;
        }
        Ok(())
    }
}

fn is_form(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_TYPE))
}

/// Decodes `a=1&b=2` pairs into `target`.
pub fn parse_into(
    target: &mut BTreeMap<String, Vec<String>>,
    input: &str,
) -> Result<(), HttpError> {
    for pair in input.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        target.entry(decode(key)?).or_default().push(decode(value)?);
    }
    Ok(())
}

fn decode(component: &str) -> Result<String, HttpError> {
    urlencoding::decode(&component.replace('+', " "))
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| HttpError::bad_request(format!("bad query string: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn run(request: Request) -> Result<RequestContext, HttpError> {
        let mut ctx = RequestContext::detached(request.uri().path());
        Query.process(&mut ctx, &request)?;
        Ok(ctx)
    }

    #[test]
    fn test_query_string() {
        let uri = "/bags/alpha/tiddlers?select=tag:a%20b&select=tag:c&sort=-title&flag";
        let request = http::Request::get(uri).body(Bytes::new()).unwrap();
        let ctx = run(request).unwrap();

        assert_eq!(ctx.query["select"], vec!["tag:a b", "tag:c"]);
        assert_eq!(ctx.query_value("sort"), Some("-title"));
        assert_eq!(ctx.query_value("flag"), Some(""));
    }

    #[test]
    fn test_plus_is_space() {
        let request = http::Request::get("/?q=hello+world").body(Bytes::new()).unwrap();
        assert_eq!(run(request).unwrap().query_value("q"), Some("hello world"));
    }

    #[test]
    fn test_form_body_merged() {
        let request = http::Request::post("/challenge/cookie_form?tiddlyweb_redirect=%2Fbags")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded; charset=UTF-8")
            .body(Bytes::from_static(b"user=alice&password=alice%21pass"))
            .unwrap();
        let ctx = run(request).unwrap();

        assert_eq!(ctx.query_value("user"), Some("alice"));
        assert_eq!(ctx.query_value("password"), Some("alice!pass"));
        assert_eq!(ctx.query_value("tiddlyweb_redirect"), Some("/bags"));
    }

    #[test]
    fn test_bad_encoding_is_bad_request() {
        let request = http::Request::get("/?q=%FF").body(Bytes::new()).unwrap();
        assert!(matches!(run(request), Err(HttpError::BadRequest(_))));
    }
}
