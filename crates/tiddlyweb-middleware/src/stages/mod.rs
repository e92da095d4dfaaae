//! The standard pipeline stages.
//!
//! ## Request Stages
//!
//! 1. [`query`] - Decode the query string and form bodies
//! 2. [`store_set`] - Attach the storage handle
//! 3. [`user_extract`] - Resolve the caller identity
//! 4. [`header`] - Parse conditional and entity headers
//! 5. [`negotiate`] - Build the acceptable-type list
//!
//! ## Response Stages
//!
//! 6. [`html_presenter`] - Frame HTML fragments as pages
//! 7. [`permissions_exceptor`] - Render access denials
//! 8. [`http_exceptor`] - Render every other terminal outcome
//! 9. [`encode_utf8`] - Turn text bodies into bytes
//! 10. [`simple_log`] - Access log line and metrics

pub mod encode_utf8;
pub mod header;
pub mod html_presenter;
pub mod http_exceptor;
pub mod negotiate;
pub mod permissions_exceptor;
pub mod query;
pub mod simple_log;
pub mod store_set;
pub mod user_extract;

pub use encode_utf8::EncodeUtf8;
pub use header::Header;
pub use html_presenter::HtmlPresenter;
pub use http_exceptor::HttpExceptor;
pub use negotiate::Negotiate;
pub use permissions_exceptor::PermissionsExceptor;
pub use query::Query;
pub use simple_log::SimpleLog;
pub use store_set::StoreSet;
pub use user_extract::UserExtract;
