//! # TiddlyWeb Middleware
//!
//! The request-processing pipeline of the TiddlyWeb server: content
//! negotiation, conditional-request caching, entity tagging and policy
//! checks, plus the stages that wrap every route handler.
//!
//! ## Pipeline Stages
//!
//! Request stages run in order before routing. Any of them may end the
//! request with an [`HttpError`]; the remaining request stages and the
//! handler are then skipped.
//!
//! | Order | Stage | Purpose |
//! |-------|-------|---------|
//! | 1 | `query` | Parse the query string (and form bodies) |
//! | 2 | `store_set` | Attach the storage handle |
//! | 3 | `user_extract` | Resolve the caller identity |
//! | 4 | `header` | Parse conditional and entity headers |
//! | 5 | `negotiate` | Build the accept list and pick a serialization |
//!
//! Response stages always run, exactly once, whatever the outcome:
//!
//! | Order | Stage | Purpose |
//! |-------|-------|---------|
//! | 1 | `html_presenter` | Frame HTML fragments as full pages |
//! | 2 | `permissions_exceptor` | Render access denials (401 / 403) |
//! | 3 | `http_exceptor` | Render every other terminal outcome |
//! | 4 | `encode_utf8` | Turn text bodies into bytes |
//! | 5 | `simple_log` | Access log line and request metrics |
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use tiddlyweb_config::WikiConfig;
//! use tiddlyweb_core::fixtures::sample_store;
//! use tiddlyweb_middleware::{ExtractorTable, Pipeline, Reply};
//!
//! let config = Arc::new(WikiConfig::default());
//! let store = Arc::new(sample_store().unwrap());
//! let pipeline = Pipeline::standard(config, store, &ExtractorTable::with_standard()).unwrap();
//!
//! let request = http::Request::get("/").body(bytes::Bytes::new()).unwrap();
//! let response = pipeline.execute(request, |_ctx, _req| Ok(Reply::text("hello")));
//! assert_eq!(response.status(), 200);
//! ```

#![doc(html_root_url = "https://docs.rs/tiddlyweb-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod authz;
pub mod cache;
pub mod context;
pub mod cookie;
pub mod extractor;
mod http_error;
pub mod negotiate;
pub mod pipeline;
pub mod stages;
pub mod tagging;
pub mod types;
pub mod util;

pub use context::RequestContext;
pub use extractor::{Extractor, ExtractorTable};
pub use http_error::{HttpError, NotModified};
pub use pipeline::{Pipeline, PipelineBuilder, Stage};
pub use types::{Outcome, Reply, ReplyBody, Request, Response};
