//! Route handlers.
//!
//! Every handler has the [`HandlerFn`](crate::HandlerFn) signature: it
//! reads what the request stages left in the [`RequestContext`], does its
//! storage and policy work, and returns a [`Reply`] or a terminal
//! [`HttpError`]. Handlers never render errors themselves.

pub mod bag;
pub mod challenge;
pub mod recipe;
pub mod root;
pub mod tiddler;

use std::sync::Arc;

use http::header::{CACHE_CONTROL, ETAG, VARY};
use tiddlyweb_core::filter::{parse_filters, Filter};
use tiddlyweb_core::serializer::SerializerEntry;
use tiddlyweb_core::util::sha256_hex;
use tiddlyweb_core::Serialization;
use tiddlyweb_middleware::cache::{check_incoming_etag, DEFAULT_CACHE_CONTROL, DEFAULT_VARY};
use tiddlyweb_middleware::negotiate::get_parse_type;
use tiddlyweb_middleware::util::{content_length_and_type, read_request_body};
use tiddlyweb_middleware::{HttpError, Reply, Request, RequestContext};

/// Query parameters that are read as filter steps on tiddler listings.
const FILTER_KEYS: [&str; 3] = ["select", "sort", "limit"];

/// Returns the serialization plugin for a negotiated entry.
pub(crate) fn serializer_for(
    ctx: &RequestContext,
    entry: &SerializerEntry,
) -> Result<Arc<dyn Serialization>, HttpError> {
    Ok(ctx.registry().serializer(&entry.format)?)
}

/// Entity tag for a rendered collection: the digest of the body and its
/// MIME type, so each representation gets its own tag.
pub(crate) fn listing_etag(body: &str, mime: &str) -> String {
    format!("\"{}\"", sha256_hex(format!("{body}{mime}")))
}

/// Builds the reply for a rendered collection, answering `304` when the
/// client already holds this representation.
pub(crate) fn send_listing(
    ctx: &RequestContext,
    entry: &SerializerEntry,
    body: String,
    title: &str,
) -> Result<Reply, HttpError> {
    let etag = listing_etag(&body, &entry.mime);
    check_incoming_etag(ctx, &etag, None, None, None)?;

    Ok(Reply::ok(&entry.mime, body)
        .with_header(ETAG, etag)
        .with_header(CACHE_CONTROL, DEFAULT_CACHE_CONTROL)
        .with_header(VARY, DEFAULT_VARY)
        .with_title(title))
}

/// Builds the reply for a single rendered entity with its validators.
pub(crate) fn send_entity(
    entry: &SerializerEntry,
    body: String,
    etag: String,
    title: &str,
) -> Reply {
    Reply::ok(&entry.mime, body)
        .with_header(ETAG, etag)
        .with_header(CACHE_CONTROL, DEFAULT_CACHE_CONTROL)
        .with_header(VARY, DEFAULT_VARY)
        .with_title(title)
}

/// Collects `select`, `sort` and `limit` query parameters into filter
/// steps. Malformed steps are a bad request.
pub(crate) fn query_filters(ctx: &RequestContext) -> Result<Vec<Filter>, HttpError> {
    let mut filters = Vec::new();
    for key in FILTER_KEYS {
        for value in ctx.query.get(key).into_iter().flatten() {
            filters.extend(parse_filters(&format!("{key}={value}"))?);
        }
    }
    Ok(filters)
}

/// Reads a write request's body together with the serialization that
/// parses it.
pub(crate) fn read_entity_body(
    ctx: &RequestContext,
    request: &Request,
) -> Result<(Arc<dyn Serialization>, String), HttpError> {
    let (length, _) = content_length_and_type(ctx)?;
    let entry = get_parse_type(ctx)?;
    let serializer = serializer_for(ctx, &entry)?;
    let body = read_request_body(request, length)?;
    Ok((serializer, body))
}
