//! # TiddlyWeb Core
//!
//! Entity model, access policies, storage interface and serializations for
//! the TiddlyWeb content server.
//!
//! - [`Bag`], [`Recipe`], [`Tiddler`] and [`User`] - the stored entities
//! - [`Policy`] - per-constraint access rules attached to bags and recipes
//! - [`CallerIdentity`] - the resolved principal making a request
//! - [`Store`] - the storage collaborator, with [`MemoryStore`] as reference
//! - [`SerializerRegistry`] - format plugins (`json`, `text`, `html`)
//! - [`WikiError`] - error type shared by every crate in the workspace

#![doc(html_root_url = "https://docs.rs/tiddlyweb-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bag;
pub mod control;
mod error;
pub mod filter;
pub mod fixtures;
mod identity;
pub mod policy;
mod recipe;
pub mod serializer;
pub mod store;
pub mod tiddler;
mod user;
pub mod util;

pub use bag::Bag;
pub use error::{EntityKind, PermissionError, WikiError, WikiResult};
pub use identity::CallerIdentity;
pub use policy::{check, check_create_policy, Constraint, Policy, Principal, Protected};
pub use recipe::Recipe;
pub use serializer::{Serialization, SerializerRegistry};
pub use store::{MemoryStore, Store};
pub use tiddler::Tiddler;
pub use user::User;
