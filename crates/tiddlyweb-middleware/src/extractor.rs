//! Credential extractors.
//!
//! An [`Extractor`] looks at a request and, if it finds credentials it can
//! verify, returns the caller's identity. The `user_extract` stage tries
//! the configured extractors in order and keeps the first identity found.
//!
//! | Name | Credentials |
//! |------|-------------|
//! | `http_basic` | `Authorization: Basic` checked against stored users |
//! | `simple_cookie` | `tiddlyweb_user` cookie signed with the server secret |

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use http::header::{AUTHORIZATION, COOKIE};
use thiserror::Error;
use tiddlyweb_core::{CallerIdentity, WikiError};
use tracing::debug;

use crate::cookie::{find_cookie, verify_signed, USER_COOKIE};
use crate::{HttpError, Request, RequestContext};

/// Resolves a caller identity from request credentials.
pub trait Extractor: Send + Sync + fmt::Debug {
    /// The name used in the `extractors` configuration list.
    fn name(&self) -> &'static str;

    /// Returns the identity proven by the request, or `None` when the
    /// request carries no credentials this extractor accepts.
    fn extract(
        &self,
        ctx: &RequestContext,
        request: &Request,
    ) -> Result<Option<CallerIdentity>, HttpError>;
}

/// A configured extractor name that is not registered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown extractor: {0}")]
pub struct UnknownExtractor(pub String);

/// The extractors available to the server, by name.
#[derive(Debug, Clone, Default)]
pub struct ExtractorTable {
    extractors: HashMap<&'static str, Arc<dyn Extractor>>,
}

impl ExtractorTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table with `http_basic` and `simple_cookie` registered.
    #[must_use]
    pub fn with_standard() -> Self {
        let mut table = Self::new();
        table.register(Arc::new(HttpBasic));
        table.register(Arc::new(SimpleCookie));
        table
    }

    /// Registers an extractor, replacing any with the same name.
    pub fn register(&mut self, extractor: Arc<dyn Extractor>) {
        self.extractors.insert(extractor.name(), extractor);
    }

    /// Returns the extractors named in `names`, in that order.
    pub fn select(&self, names: &[String]) -> Result<Vec<Arc<dyn Extractor>>, UnknownExtractor> {
        names
            .iter()
            .map(|name| {
                self.extractors
                    .get(name.as_str())
                    .cloned()
                    .ok_or_else(|| UnknownExtractor(name.clone()))
            })
            .collect()
    }
}

/// Loads a stored user's identity. Unknown users yield `None`.
fn stored_identity(ctx: &RequestContext, name: &str) -> Result<Option<CallerIdentity>, HttpError> {
    match ctx.store()?.get_user(name) {
        Ok(user) => Ok(Some(user.identity())),
        Err(WikiError::NotFound { .. }) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// HTTP Basic authentication against the users in the store.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpBasic;

impl Extractor for HttpBasic {
    fn name(&self) -> &'static str {
        "http_basic"
    }

    fn extract(
        &self,
        ctx: &RequestContext,
        request: &Request,
    ) -> Result<Option<CallerIdentity>, HttpError> {
        let Some(encoded) = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Basic "))
        else {
            return Ok(None);
        };

        let Some((usersign, password)) = STANDARD
            .decode(encoded.trim())
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .and_then(|text| {
                text.split_once(':')
                    .map(|(user, pass)| (user.to_string(), pass.to_string()))
            })
        else {
            debug!("Malformed basic credentials");
            return Ok(None);
        };

        match ctx.store()?.get_user(&usersign) {
            Ok(user) if user.check_password(&password) => Ok(Some(user.identity())),
            Ok(_) | Err(WikiError::NotFound { .. }) => {
                debug!(user = %usersign, "Basic credentials rejected");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// The signed `tiddlyweb_user` cookie issued by the `cookie_form`
/// challenger.
///
/// The cookie proves the name; roles come from the stored user record when
/// there is one.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleCookie;

impl Extractor for SimpleCookie {
    fn name(&self) -> &'static str {
        "simple_cookie"
    }

    fn extract(
        &self,
        ctx: &RequestContext,
        request: &Request,
    ) -> Result<Option<CallerIdentity>, HttpError> {
        let signed = request
            .headers()
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(|header| find_cookie(header, USER_COOKIE));
        let Some(signed) = signed else {
            return Ok(None);
        };

        let Some(usersign) = verify_signed(signed, &ctx.config().secret) else {
            debug!("Cookie signature mismatch");
            return Ok(None);
        };

        let identity = stored_identity(ctx, &usersign)?
            .unwrap_or_else(|| CallerIdentity::user(usersign, Vec::<String>::new()));
        Ok(Some(identity))
    }
}
