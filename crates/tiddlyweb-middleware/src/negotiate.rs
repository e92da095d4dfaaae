//! Content negotiation.
//!
//! The acceptable-type list is built by the `negotiate` stage: the MIME type
//! of a recognized URL extension comes first, followed by the `Accept`
//! header entries in q-value order. [`negotiate`] walks that list against
//! the configured serializers. Matching is exact; wildcards never match.
//!
//! Reads that match nothing fall back to the `default_serializer` entry.
//! Writes never fall back: a PUT or POST whose type cannot be determined
//! gets no selection and the handler must reject it.

use http::Method;
use tiddlyweb_config::WikiConfig;
use tiddlyweb_core::serializer::SerializerEntry;

use crate::{HttpError, RequestContext};

/// Picks a serialization for a response.
///
/// `accept` is the ordered acceptable-type list; `None` entries are the
/// "no preference" sentinel and never match. When `is_collection` is set
/// and `extension` is not a recognized extension, the list is replaced by
/// the sentinel so a stale `Accept` header cannot win.
///
/// Returns `Ok(None)` only for writes that matched nothing.
pub fn negotiate<S: AsRef<str>>(
    accept: &[Option<S>],
    extension: Option<&str>,
    is_collection: bool,
    method: &Method,
    config: &WikiConfig,
) -> Result<Option<SerializerEntry>, HttpError> {
    let unknown_extension =
        is_collection && extension.is_some_and(|ext| config.mime_for_extension(ext).is_none());

    let matched = if unknown_extension {
        None
    } else {
        accept
            .iter()
            .flatten()
            .find_map(|candidate| config.serializers.get(candidate.as_ref()))
    };

    if let Some(entry) = matched {
        return Ok(Some(entry.clone()));
    }

    if let Some(ext) = extension {
        return Err(HttpError::UnsupportedMediaType(format!(
            "{ext} type unsupported"
        )));
    }

    if is_read(method) {
        return config
            .serializers
            .get(&config.default_serializer)
            .cloned()
            .map(Some)
            .ok_or_else(|| {
                HttpError::internal(format!(
                    "default serializer {} is not configured",
                    config.default_serializer
                ))
            });
    }

    Ok(None)
}

/// Negotiates from a single MIME type string.
pub fn negotiate_one(
    accept: &str,
    extension: Option<&str>,
    is_collection: bool,
    method: &Method,
    config: &WikiConfig,
) -> Result<Option<SerializerEntry>, HttpError> {
    negotiate(&[Some(accept)], extension, is_collection, method, config)
}

/// Picks the serialization for the current request.
///
/// Handlers call this with `is_collection` set when they render a listing.
pub fn get_serialize_type(
    ctx: &RequestContext,
    is_collection: bool,
) -> Result<Option<SerializerEntry>, HttpError> {
    let accept: Vec<Option<&str>> = ctx.accept.iter().map(|mime| Some(mime.as_str())).collect();
    negotiate(
        &accept,
        ctx.extension.as_deref(),
        is_collection,
        ctx.method(),
        ctx.config(),
    )
}

/// Like [`get_serialize_type`], but a missing selection is a bad request.
/// For handlers that always need a serialization.
pub fn require_serialize_type(
    ctx: &RequestContext,
    is_collection: bool,
) -> Result<SerializerEntry, HttpError> {
    get_serialize_type(ctx, is_collection)?
        .ok_or_else(|| HttpError::bad_request("unable to determine serialization type"))
}

/// Picks the serialization used to parse a request body from its
/// `Content-Type`.
pub fn get_parse_type(ctx: &RequestContext) -> Result<SerializerEntry, HttpError> {
    let content_type = ctx
        .content_type
        .as_deref()
        .ok_or_else(|| HttpError::bad_request("Content-Type required"))?;
    ctx.config()
        .serializers
        .get(content_type)
        .cloned()
        .ok_or_else(|| HttpError::UnsupportedMediaType(format!("{content_type} type unsupported")))
}

/// Parses an `Accept` header into MIME types, most preferred first.
///
/// Parameters other than `q` are dropped. Entries with equal weight keep
/// their header order; entries with `q=0` are left out.
#[must_use]
pub fn parse_accept(header: &str) -> Vec<String> {
    let mut weighted: Vec<(u16, String)> = header
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split(';');
            let mime = parts.next()?.trim().to_ascii_lowercase();
            if mime.is_empty() {
                return None;
            }
            let quality = parts
                .filter_map(|param| param.trim().strip_prefix("q="))
                .find_map(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            Some((quality_millis(quality), mime))
        })
        .filter(|(quality, _)| *quality > 0)
        .collect();

    weighted.sort_by(|a, b| b.0.cmp(&a.0));
    weighted.into_iter().map(|(_, mime)| mime).collect()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn quality_millis(quality: f32) -> u16 {
    (quality.clamp(0.0, 1.0) * 1000.0).round() as u16
}

/// Returns the extension of the last path segment, if it has one.
#[must_use]
pub fn path_extension(path: &str) -> Option<&str> {
    let segment = path.rsplit('/').next()?;
    let (stem, extension) = segment.rsplit_once('.')?;
    if stem.is_empty() || extension.is_empty() {
        None
    } else {
        Some(extension)
    }
}

fn is_read(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD
}
