//! Typed configuration for the TiddlyWeb server.
//!
//! [`WikiConfig`] holds everything the request pipeline consults: the
//! negotiation tables (`extension_types`, `serializers`,
//! `default_serializer`), the public origin and path prefix used to build
//! URLs, the credential extractors and challengers, the create policies,
//! and the listener and logging settings.
//!
//! # Configuration File Format
//!
//! ```toml
//! server_prefix = ""
//! default_serializer = "text/html"
//! extractors = ["http_basic", "simple_cookie"]
//! auth_systems = ["cookie_form"]
//! secret = "change me"
//! bag_create_policy = ""      # "", "ANY" or "ADMIN"
//! recipe_create_policy = ""
//! css_uri = ""
//!
//! [server]
//! http_addr = "0.0.0.0:8080"
//! shutdown_timeout_secs = 30
//! request_timeout_ms = 30000
//!
//! [server_host]
//! scheme = "http"
//! host = "0.0.0.0"
//! port = 8080
//!
//! [extension_types]
//! txt = "text/plain"
//! html = "text/html"
//! json = "application/json"
//!
//! [serializers]
//! "text/html" = ["html", "text/html; charset=UTF-8"]
//! "text/plain" = ["text", "text/plain; charset=UTF-8"]
//! "application/json" = ["json", "application/json; charset=UTF-8"]
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```
//!
//! # Environment Variable Overrides
//!
//! With the prefix `TIDDLYWEB`:
//!
//! - `TIDDLYWEB__SERVER__HTTP_ADDR=127.0.0.1:9000`
//! - `TIDDLYWEB__SERVER_HOST__PORT=443`
//! - `TIDDLYWEB__SECRET=...`
//! - `TIDDLYWEB__EXTRACTORS=simple_cookie,http_basic`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::WikiConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{LoggingSection, ServerHost, ServerSection};
pub use tiddlyweb_core::serializer::SerializerEntry;
