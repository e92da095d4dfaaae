//! Per-request state.
//!
//! A [`RequestContext`] is created when a request enters the pipeline and
//! dropped when its response has been produced. Request stages fill it in,
//! handlers read it, response stages use it for presentation and logging.

use std::cell::OnceCell;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use http::Method;
use tiddlyweb_config::WikiConfig;
use tiddlyweb_core::serializer::SerializerEntry;
use tiddlyweb_core::{CallerIdentity, Serialization, SerializerRegistry, Store};
use uuid::Uuid;

use crate::tagging::FINGERPRINT_FORMAT;
use crate::HttpError;

/// State for one request.
///
/// The parsed header fields are public so stages can fill them in
/// directly; the shared handles are reached through accessors.
pub struct RequestContext {
    request_id: Uuid,
    method: Method,
    path: String,
    identity: CallerIdentity,
    config: Arc<WikiConfig>,
    registry: Arc<SerializerRegistry>,
    store: Option<Arc<dyn Store>>,
    fingerprint_serializer: OnceCell<Arc<dyn Serialization>>,
    started_at: Instant,

    /// Acceptable MIME types, most preferred first.
    pub accept: Vec<String>,
    /// Extension found on the last path segment, if any.
    pub extension: Option<String>,
    /// Raw `If-None-Match` header.
    pub if_none_match: Option<String>,
    /// Raw `If-Modified-Since` header.
    pub if_modified_since: Option<String>,
    /// Parsed `Content-Length` header.
    pub content_length: Option<usize>,
    /// `Content-Type` header without parameters.
    pub content_type: Option<String>,
    /// Serialization chosen for a single-entity response.
    pub negotiated: Option<SerializerEntry>,
    /// Name of the matched route, for logs and metrics.
    pub route: Option<String>,
    /// Raw (still percent-encoded) route parameters.
    pub route_params: HashMap<String, String>,
    /// Decoded query string and form parameters.
    pub query: BTreeMap<String, Vec<String>>,
    /// Open-ended data for collaborators.
    pub extensions: HashMap<String, String>,
}

impl RequestContext {
    /// Creates a context for a request with a fresh request id.
    #[must_use]
    pub fn new(
        method: Method,
        path: impl Into<String>,
        config: Arc<WikiConfig>,
        registry: Arc<SerializerRegistry>,
    ) -> Self {
        Self {
            request_id: Uuid::now_v7(),
            method,
            path: path.into(),
            identity: CallerIdentity::Anonymous,
            config,
            registry,
            store: None,
            fingerprint_serializer: OnceCell::new(),
            started_at: Instant::now(),
            accept: Vec::new(),
            extension: None,
            if_none_match: None,
            if_modified_since: None,
            content_length: None,
            content_type: None,
            negotiated: None,
            route: None,
            route_params: HashMap::new(),
            query: BTreeMap::new(),
            extensions: HashMap::new(),
        }
    }

    /// Creates a context for a GET of `path` with default configuration.
    /// Used by tests and tools that need a context outside the pipeline.
    #[must_use]
    pub fn detached(path: impl Into<String>) -> Self {
        let config = Arc::new(WikiConfig::default());
        let registry = Arc::new(config.serializer_registry());
        Self::new(Method::GET, path, config, registry)
    }

    /// Returns the request id.
    #[must_use]
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Returns the request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path, including any server prefix.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the caller identity.
    #[must_use]
    pub fn identity(&self) -> &CallerIdentity {
        &self.identity
    }

    /// Sets the caller identity.
    ///
    /// This should only be called by the `user_extract` stage.
    pub fn set_identity(&mut self, identity: CallerIdentity) {
        self.identity = identity;
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &WikiConfig {
        &self.config
    }

    /// Returns the serializer registry.
    #[must_use]
    pub fn registry(&self) -> &SerializerRegistry {
        &self.registry
    }

    /// Returns the store, failing if the `store_set` stage has not run.
    pub fn store(&self) -> Result<&dyn Store, HttpError> {
        self.store
            .as_deref()
            .ok_or_else(|| HttpError::internal("no store attached to request"))
    }

    /// Attaches the store.
    pub fn set_store(&mut self, store: Arc<dyn Store>) {
        self.store = Some(store);
    }

    /// Returns the serializer used for entity tags, creating it on first
    /// use. Later calls within the request reuse the same instance.
    pub fn fingerprint_serializer(&self) -> Result<Arc<dyn Serialization>, HttpError> {
        if let Some(serializer) = self.fingerprint_serializer.get() {
            return Ok(Arc::clone(serializer));
        }
        let serializer = self.registry.serializer(FINGERPRINT_FORMAT)?;
        let _ = self.fingerprint_serializer.set(Arc::clone(&serializer));
        Ok(serializer)
    }

    /// Returns the first value of a query parameter.
    #[must_use]
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns when the request entered the pipeline.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the time since the request entered the pipeline.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.request_id)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("identity", &self.identity)
            .field("accept", &self.accept)
            .field("extension", &self.extension)
            .field("negotiated", &self.negotiated)
            .field("route", &self.route)
            .finish_non_exhaustive()
    }
}
