//! Request, response and handler-result types used by the pipeline.

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE, LOCATION};
use http::StatusCode;
use http_body_util::Full;
use tracing::warn;

use crate::HttpError;

/// The request type seen by stages and handlers.
///
/// The server collects the body before the pipeline runs, so it is a plain
/// byte buffer.
pub type Request = http::Request<Bytes>;

/// The response type produced by the pipeline.
pub type Response = http::Response<Full<Bytes>>;

/// What a handler (or a request stage) produced: a reply or a terminal
/// outcome that the response stages turn into one.
pub type Outcome = Result<Reply, HttpError>;

/// Body of a [`Reply`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReplyBody {
    /// No body.
    #[default]
    Empty,
    /// Text that has not yet been encoded.
    Text(String),
    /// Encoded bytes.
    Bytes(Bytes),
}

impl ReplyBody {
    /// Returns the body as text, if it has not been encoded yet.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns true for an empty body.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(text) => text.is_empty(),
            Self::Bytes(bytes) => bytes.is_empty(),
        }
    }

    fn into_bytes(self) -> Bytes {
        match self {
            Self::Empty => Bytes::new(),
            Self::Text(text) => Bytes::from(text),
            Self::Bytes(bytes) => bytes,
        }
    }
}

/// A successful handler result, before the response stages have run.
///
/// Headers are kept as strings until [`Reply::into_response`] so that
/// handlers never deal with header-value validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Status code.
    pub status: StatusCode,
    /// Response headers, in insertion order.
    pub headers: Vec<(HeaderName, String)>,
    /// Response body.
    pub body: ReplyBody,
    /// Page title; set on HTML replies that should be framed as a page.
    pub title: Option<String>,
}

impl Reply {
    /// Creates an empty reply with the given status.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: ReplyBody::Empty,
            title: None,
        }
    }

    /// A `200 OK` reply with a `text/plain` body.
    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        Self::ok("text/plain; charset=UTF-8", body)
    }

    /// A `200 OK` reply with the given content type and body.
    #[must_use]
    pub fn ok(content_type: &str, body: impl Into<String>) -> Self {
        Self::new(StatusCode::OK)
            .with_header(CONTENT_TYPE, content_type)
            .with_body(body)
    }

    /// A `204 No Content` reply with a `Location` header.
    #[must_use]
    pub fn no_content(location: &str) -> Self {
        Self::new(StatusCode::NO_CONTENT).with_header(LOCATION, location)
    }

    /// A `303 See Other` redirect.
    #[must_use]
    pub fn see_other(location: &str) -> Self {
        Self::new(StatusCode::SEE_OTHER).with_header(LOCATION, location)
    }

    /// Appends a header.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Replaces the body with text.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = ReplyBody::Text(body.into());
        self
    }

    /// Sets the page title used by the HTML presenter.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Returns the first value of a header.
    #[must_use]
    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns the content type, if one was set.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header(&CONTENT_TYPE)
    }

    /// Converts the reply into a response.
    ///
    /// Header values that are not valid HTTP header text are dropped with a
    /// warning.
    #[must_use]
    pub fn into_response(self) -> Response {
        let mut response = Response::new(Full::new(self.body.into_bytes()));
        *response.status_mut() = self.status;
        let headers = response.headers_mut();
        for (name, value) in self.headers {
            match HeaderValue::from_str(&value) {
                Ok(value) => {
                    headers.append(name, value);
                }
                Err(_) => warn!(header = %name, "Dropping invalid header value"),
            }
        }
        response
    }
}
