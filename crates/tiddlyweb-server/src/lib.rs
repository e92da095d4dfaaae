//! # TiddlyWeb Server
//!
//! HTTP server for the TiddlyWeb wiki: the route table, the handlers for
//! bags, recipes, tiddlers and the cookie challenger, and the hyper/tokio
//! listener that runs every request through the middleware pipeline.
//!
//! ## Routes
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | GET | `/` | `root` |
//! | GET | `/bags` | `list_bags` |
//! | GET, PUT, DELETE | `/bags/{bag_name}` | `get_bag`, `put_bag`, `delete_bag` |
//! | GET | `/bags/{bag_name}/tiddlers` | `list_bag_tiddlers` |
//! | GET, PUT, DELETE | `/bags/{bag_name}/tiddlers/{tiddler_name}` | `get_tiddler`, `put_tiddler`, `delete_tiddler` |
//! | GET | `/bags/{bag_name}/tiddlers/{tiddler_name}/revisions` | `list_revisions` |
//! | GET | `/bags/{bag_name}/tiddlers/{tiddler_name}/revisions/{revision}` | `get_revision` |
//! | GET | `/recipes` | `list_recipes` |
//! | GET, PUT, DELETE | `/recipes/{recipe_name}` | `get_recipe`, `put_recipe`, `delete_recipe` |
//! | GET | `/recipes/{recipe_name}/tiddlers` | `list_recipe_tiddlers` |
//! | GET, PUT | `/recipes/{recipe_name}/tiddlers/{tiddler_name}` | `get_tiddler`, `put_tiddler` |
//! | GET | `/challenge` | `list_challengers` |
//! | GET, POST | `/challenge/cookie_form` | `cookie_form`, `cookie_form_submit` |
//!
//! Collection routes also answer with a format extension (`/bags.json`).
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tiddlyweb_config::WikiConfig;
//! use tiddlyweb_core::fixtures::sample_store;
//! use tiddlyweb_server::Server;
//!
//! let server = Server::new(WikiConfig::default(), Arc::new(sample_store().unwrap())).unwrap();
//! let request = http::Request::get("/bags.txt").body(bytes::Bytes::new()).unwrap();
//! let response = server.handle(request);
//! assert_eq!(response.status(), 200);
//! ```

#![doc(html_root_url = "https://docs.rs/tiddlyweb-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod handler;
pub mod handlers;
pub mod router;
pub mod server;
pub mod shutdown;

pub use error::{ServerError, ServerResult};
pub use handler::{HandlerFn, HandlerTable};
pub use router::{RouteMatch, Router};
pub use server::Server;
pub use shutdown::{ConnectionTracker, ShutdownSignal};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
