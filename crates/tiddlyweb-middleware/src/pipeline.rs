//! The request pipeline.
//!
//! A [`Pipeline`] runs its request stages in order, then the dispatch
//! function (routing plus the handler), then its response stages in order.
//! The first request stage that fails ends the request phase; its
//! [`HttpError`] becomes the outcome the response stages see. Response
//! stages always run, each exactly once, so presentation and logging happen
//! once per request whatever happened before.

use std::sync::Arc;

use tiddlyweb_config::WikiConfig;
use tiddlyweb_core::{SerializerRegistry, Store};
use tracing::{debug, warn};

use crate::extractor::{ExtractorTable, UnknownExtractor};
use crate::stages::{
    EncodeUtf8, Header, HtmlPresenter, HttpExceptor, Negotiate, PermissionsExceptor, Query,
    SimpleLog, StoreSet, UserExtract,
};
use crate::types::{Outcome, Request, Response};
use crate::{HttpError, RequestContext};

/// A stage that runs before routing.
pub trait RequestStage: Send + Sync {
    /// Stage name, for logs.
    fn name(&self) -> &'static str;

    /// Updates the context from the request, or ends the request.
    fn process(&self, ctx: &mut RequestContext, request: &Request) -> Result<(), HttpError>;
}

/// A stage that runs after the handler.
pub trait ResponseStage: Send + Sync {
    /// Stage name, for logs.
    fn name(&self) -> &'static str;

    /// Transforms the outcome.
    fn process(&self, ctx: &mut RequestContext, outcome: Outcome) -> Outcome;
}

/// The configured pipeline. Built once and shared by every request.
pub struct Pipeline {
    config: Arc<WikiConfig>,
    registry: Arc<SerializerRegistry>,
    request_stages: Vec<Box<dyn RequestStage>>,
    response_stages: Vec<Box<dyn ResponseStage>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Creates a builder with no stages.
    #[must_use]
    pub fn builder(config: Arc<WikiConfig>) -> PipelineBuilder {
        PipelineBuilder::new(config)
    }

    /// Creates the standard pipeline: every [`Stage`] in order, with the
    /// extractors named in the configuration.
    pub fn standard(
        config: Arc<WikiConfig>,
        store: Arc<dyn Store>,
        extractors: &ExtractorTable,
    ) -> Result<Self, UnknownExtractor> {
        let selected = extractors.select(&config.extractors)?;
        Ok(Self::builder(Arc::clone(&config))
            .request_stage(Query)
            .request_stage(StoreSet::new(store))
            .request_stage(UserExtract::new(selected))
            .request_stage(Header)
            .request_stage(Negotiate)
            .response_stage(HtmlPresenter)
            .response_stage(PermissionsExceptor)
            .response_stage(HttpExceptor)
            .response_stage(EncodeUtf8)
            .response_stage(SimpleLog)
            .build())
    }

    /// Returns the configuration shared with every request.
    #[must_use]
    pub fn config(&self) -> &Arc<WikiConfig> {
        &self.config
    }

    /// Runs one request through the pipeline.
    ///
    /// `dispatch` routes the request and runs the handler; it is skipped
    /// when a request stage ends the request.
    pub fn execute<F>(&self, request: Request, dispatch: F) -> Response
    where
        F: FnOnce(&mut RequestContext, &Request) -> Outcome,
    {
        let mut ctx = RequestContext::new(
            request.method().clone(),
            request.uri().path(),
            Arc::clone(&self.config),
            Arc::clone(&self.registry),
        );

        let outcome = match self.run_request_stages(&mut ctx, &request) {
            Ok(()) => dispatch(&mut ctx, &request),
            Err(err) => Err(err),
        };

        let outcome = self
            .response_stages
            .iter()
            .fold(outcome, |outcome, stage| stage.process(&mut ctx, outcome));

        match outcome {
            Ok(reply) => reply.into_response(),
            Err(err) => {
                warn!(error = %err, "Outcome left unrendered by response stages");
                crate::Reply::new(err.status_code()).into_response()
            }
        }
    }

    fn run_request_stages(
        &self,
        ctx: &mut RequestContext,
        request: &Request,
    ) -> Result<(), HttpError> {
        for stage in &self.request_stages {
            if let Err(err) = stage.process(ctx, request) {
                debug!(stage = stage.name(), error = %err, "Request stage ended request");
                return Err(err);
            }
        }
        Ok(())
    }

    /// Returns the stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.request_stages
            .iter()
            .map(|stage| stage.name())
            .chain(self.response_stages.iter().map(|stage| stage.name()))
            .collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.request_stages.len() + self.response_stages.len()
    }
}

/// Builder for [`Pipeline`].
pub struct PipelineBuilder {
    config: Arc<WikiConfig>,
    request_stages: Vec<Box<dyn RequestStage>>,
    response_stages: Vec<Box<dyn ResponseStage>>,
}

impl PipelineBuilder {
    /// Creates a builder with no stages.
    #[must_use]
    pub fn new(config: Arc<WikiConfig>) -> Self {
        Self {
            config,
            request_stages: Vec::new(),
            response_stages: Vec::new(),
        }
    }

    /// Appends a request stage.
    #[must_use]
    pub fn request_stage<S: RequestStage + 'static>(mut self, stage: S) -> Self {
        self.request_stages.push(Box::new(stage));
        self
    }

    /// Appends a response stage.
    #[must_use]
    pub fn response_stage<S: ResponseStage + 'static>(mut self, stage: S) -> Self {
        self.response_stages.push(Box::new(stage));
        self
    }

    /// Builds the pipeline. The serializer registry is built from the
    /// configuration here, once.
    #[must_use]
    pub fn build(self) -> Pipeline {
        let registry = Arc::new(self.config.serializer_registry());
        Pipeline {
            config: self.config,
            registry,
            request_stages: self.request_stages,
            response_stages: self.response_stages,
        }
    }
}

/// The stages of the standard pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Stage {
    /// Parse query string and form bodies.
    Query = 1,
    /// Attach the store.
    StoreSet = 2,
    /// Resolve the caller identity.
    UserExtract = 3,
    /// Parse conditional and entity headers.
    Header = 4,
    /// Build the accept list.
    Negotiate = 5,
    /// Frame HTML fragments.
    HtmlPresenter = 6,
    /// Render access denials.
    PermissionsExceptor = 7,
    /// Render other terminal outcomes.
    HttpExceptor = 8,
    /// Encode text bodies.
    EncodeUtf8 = 9,
    /// Access log and metrics.
    SimpleLog = 10,
}

impl Stage {
    /// Returns true for stages that run before routing.
    #[must_use]
    pub const fn is_request_stage(self) -> bool {
        (self as u8) <= (Self::Negotiate as u8)
    }

    /// Returns the stage name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::StoreSet => "store_set",
            Self::UserExtract => "user_extract",
            Self::Header => "header",
            Self::Negotiate => "negotiate",
            Self::HtmlPresenter => "html_presenter",
            Self::PermissionsExceptor => "permissions_exceptor",
            Self::HttpExceptor => "http_exceptor",
            Self::EncodeUtf8 => "encode_utf8",
            Self::SimpleLog => "simple_log",
        }
    }

    /// Returns every stage in order.
    #[must_use]
    pub const fn all() -> [Self; 10] {
        [
            Self::Query,
            Self::StoreSet,
            Self::UserExtract,
            Self::Header,
            Self::Negotiate,
            Self::HtmlPresenter,
            Self::PermissionsExceptor,
            Self::HttpExceptor,
            Self::EncodeUtf8,
            Self::SimpleLog,
        ]
    }
}
