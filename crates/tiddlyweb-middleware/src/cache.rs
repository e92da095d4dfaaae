//! Conditional-request handling.
//!
//! Handlers compute the current validators for an entity and hand them to
//! [`check_incoming_etag`] and [`check_last_modified`]. Either check may end
//! the request with a `304 Not Modified` outcome; by convention the entity
//! tag is checked first.

use std::time::SystemTime;

use chrono::Utc;
use tiddlyweb_core::tiddler::timestring_to_datetime;

use crate::{HttpError, NotModified, RequestContext};

/// `Cache-Control` used when the caller does not give one.
pub const DEFAULT_CACHE_CONTROL: &str = "no-cache";

/// `Vary` used when the caller does not give one.
pub const DEFAULT_VARY: &str = "Accept";

/// Compares the request's `If-None-Match` with `etag`.
///
/// On an exact match (quotes included) the request ends with
/// [`HttpError::NotModified`]. Otherwise the client's value is returned
/// unchanged, or `None` if it sent none, so callers can tell a stale tag
/// from a missing one.
pub fn check_incoming_etag(
    ctx: &RequestContext,
    etag: &str,
    cache_control: Option<&str>,
    last_modified: Option<&str>,
    vary: Option<&str>,
) -> Result<Option<String>, HttpError> {
    match ctx.if_none_match.as_deref() {
        Some(incoming) if !incoming.is_empty() && incoming == etag => {
            Err(not_modified(incoming, cache_control, last_modified, vary))
        }
        Some(incoming) if !incoming.is_empty() => Ok(Some(incoming.to_string())),
        _ => Ok(None),
    }
}

/// Compares the request's `If-Modified-Since` with `last_modified`.
///
/// Ends the request with [`HttpError::NotModified`] when the client's date
/// is at or after `last_modified`. An unparsable client date counts as
/// absent; so does an unparsable `last_modified`.
pub fn check_last_modified(
    ctx: &RequestContext,
    last_modified: &str,
    etag: Option<&str>,
    cache_control: Option<&str>,
    vary: Option<&str>,
) -> Result<(), HttpError> {
    let Some(incoming) = ctx
        .if_modified_since
        .as_deref()
        .and_then(datetime_from_http_date)
    else {
        return Ok(());
    };

    match datetime_from_http_date(last_modified) {
        Some(current) if incoming >= current => Err(not_modified(
            etag.unwrap_or_default(),
            cache_control,
            Some(last_modified),
            vary,
        )),
        _ => Ok(()),
    }
}

fn not_modified(
    etag: &str,
    cache_control: Option<&str>,
    last_modified: Option<&str>,
    vary: Option<&str>,
) -> HttpError {
    HttpError::NotModified(NotModified {
        etag: etag.to_string(),
        cache_control: cache_control.unwrap_or(DEFAULT_CACHE_CONTROL).to_string(),
        last_modified: last_modified.map(str::to_string),
        vary: vary.unwrap_or(DEFAULT_VARY).to_string(),
    })
}

/// Converts a tiddler timestamp (`YYYYMMDDHHMMSS`) to an HTTP date.
///
/// An unparsable timestamp yields the current time. Dates before 1970
/// are formatted as given.
#[must_use]
pub fn http_date_from_timestamp(timestamp: &str) -> String {
    timestring_to_datetime(timestamp)
        .unwrap_or_else(|_| Utc::now())
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// Parses an HTTP date. Anything after a `;` is ignored. Returns `None`
/// for unparsable input.
#[must_use]
pub fn datetime_from_http_date(value: &str) -> Option<SystemTime> {
    let date = value.split(';').next().unwrap_or_default().trim();
    httpdate::parse_http_date(date).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx_with_etag(etag: &str) -> RequestContext {
        let mut ctx = RequestContext::detached("/bags/alpha");
        ctx.if_none_match = Some(etag.to_string());
        ctx
    }

    #[test]
    fn test_matching_etag_is_not_modified() {
        let ctx = ctx_with_etag("\"abc\"");
        let result = check_incoming_etag(&ctx, "\"abc\"", None, None, None);

        match result {
            Err(HttpError::NotModified(not_modified)) => {
                assert_eq!(not_modified.etag, "\"abc\"");
                assert_eq!(not_modified.cache_control, "no-cache");
                assert_eq!(not_modified.vary, "Accept");
                assert_eq!(not_modified.last_modified, None);
            }
            other => panic!("expected not modified, got {other:?}"),
        }
    }

    #[test]
    fn test_stale_etag_is_returned() {
        let ctx = ctx_with_etag("\"old\"");
        let result = check_incoming_etag(&ctx, "\"new\"", None, None, None).unwrap();
        assert_eq!(result.as_deref(), Some("\"old\""));
    }

    #[test]
    fn test_comparison_includes_quotes() {
        let ctx = ctx_with_etag("abc");
        let result = check_incoming_etag(&ctx, "\"abc\"", None, None, None).unwrap();
        assert_eq!(result.as_deref(), Some("abc"));
    }

    #[test]
    fn test_no_etag_offered() {
        let ctx = RequestContext::detached("/");
        assert_eq!(
            check_incoming_etag(&ctx, "\"abc\"", None, None, None).unwrap(),
            None
        );
    }

    #[test]
    fn test_custom_cache_headers_carried() {
        let ctx = ctx_with_etag("\"abc\"");
        let result = check_incoming_etag(
            &ctx,
            "\"abc\"",
            Some("max-age=60"),
            Some("Mon, 01 Jan 2024 12:00:00 GMT"),
            Some("Accept, Cookie"),
        );
        let Err(HttpError::NotModified(not_modified)) = result else {
            panic!("expected not modified");
        };
        assert_eq!(not_modified.cache_control, "max-age=60");
        assert_eq!(not_modified.vary, "Accept, Cookie");
        assert_eq!(
            not_modified.last_modified.as_deref(),
            Some("Mon, 01 Jan 2024 12:00:00 GMT")
        );
    }

    #[test]
    fn test_if_modified_since_equal_or_later() {
        let last_modified = "Mon, 01 Jan 2024 12:00:00 GMT";
        let mut ctx = RequestContext::detached("/");

        ctx.if_modified_since = Some(last_modified.to_string());
        assert!(matches!(
            check_last_modified(&ctx, last_modified, Some("\"e\""), None, None),
            Err(HttpError::NotModified(_))
        ));

        ctx.if_modified_since = Some("Tue, 02 Jan 2024 12:00:00 GMT".to_string());
        assert!(check_last_modified(&ctx, last_modified, None, None, None).is_err());

        ctx.if_modified_since = Some("Sun, 31 Dec 2023 12:00:00 GMT".to_string());
        assert!(check_last_modified(&ctx, last_modified, None, None, None).is_ok());
    }

    #[test]
    fn test_if_modified_since_parameters_and_garbage() {
        let last_modified = "Mon, 01 Jan 2024 12:00:00 GMT";
        let mut ctx = RequestContext::detached("/");

        ctx.if_modified_since = Some(format!("{last_modified}; length=1234"));
        assert!(check_last_modified(&ctx, last_modified, None, None, None).is_err());

        ctx.if_modified_since = Some("yesterday".to_string());
        assert!(check_last_modified(&ctx, last_modified, None, None, None).is_ok());
    }

    #[test]
    fn test_http_date_from_timestamp() {
        assert_eq!(
            http_date_from_timestamp("20240101120000"),
            "Mon, 01 Jan 2024 12:00:00 GMT"
        );
        assert_eq!(
            http_date_from_timestamp("20240101120000123"),
            "Mon, 01 Jan 2024 12:00:00 GMT"
        );
    }

    #[test]
    fn test_timestamp_before_epoch() {
        assert_eq!(
            http_date_from_timestamp("19690720201700"),
            "Sun, 20 Jul 1969 20:17:00 GMT"
        );
    }

    #[test]
    fn test_bad_timestamp_uses_now() {
        let rendered = http_date_from_timestamp("not a time");
        assert!(datetime_from_http_date(&rendered).is_some());
    }
}
