//! Entity tags and canonical URLs.
//!
//! An entity tag is the SHA-256 of the entity's `json` serialization
//! followed by `application/json`, hex encoded and quoted. The fixed format
//! keeps tags stable whatever representation the client asked for.
//!
//! Tiddler tags ignore the text and carry a readable prefix:
//!
//! ```text
//! "alpha/foo/2:3f0a...e1"
//! ```

use tiddlyweb_config::WikiConfig;
use tiddlyweb_core::util::{encode_name, sha256_hex};
use tiddlyweb_core::{Bag, Recipe, Tiddler};

use crate::{HttpError, RequestContext};

/// Format used to serialize entities for tagging.
pub const FINGERPRINT_FORMAT: &str = "json";

/// MIME type appended to the serialization before hashing.
pub const FINGERPRINT_MIME: &str = "application/json";

/// An entity that can be tagged.
#[derive(Debug, Clone, Copy)]
pub enum Entity<'a> {
    /// A bag.
    Bag(&'a Bag),
    /// A recipe.
    Recipe(&'a Recipe),
    /// A tiddler, tagged exactly as given.
    Tiddler(&'a Tiddler),
}

/// Computes the quoted entity tag of an entity.
pub fn entity_etag(ctx: &RequestContext, entity: Entity<'_>) -> Result<String, HttpError> {
    let serializer = ctx.fingerprint_serializer()?;
    let mut content = match entity {
        Entity::Bag(bag) => serializer.bag_as(bag)?,
        Entity::Recipe(recipe) => serializer.recipe_as(recipe)?,
        Entity::Tiddler(tiddler) => serializer.tiddler_as(tiddler)?,
    };
    content.push_str(FINGERPRINT_MIME);
    Ok(format!("\"{}\"", sha256_hex(content)))
}

/// Computes the entity tag of a bag.
pub fn bag_etag(ctx: &RequestContext, bag: &Bag) -> Result<String, HttpError> {
    entity_etag(ctx, Entity::Bag(bag))
}

/// Computes the entity tag of a recipe.
pub fn recipe_etag(ctx: &RequestContext, recipe: &Recipe) -> Result<String, HttpError> {
    entity_etag(ctx, Entity::Recipe(recipe))
}

/// Computes the entity tag of a tiddler.
///
/// The tag is taken over a projection of the tiddler with empty text and a
/// revision of 0 when it has none; the tiddler itself is not touched.
pub fn tiddler_etag(ctx: &RequestContext, tiddler: &Tiddler) -> Result<String, HttpError> {
    let projection = tiddler.without_text();
    let tag = entity_etag(ctx, Entity::Tiddler(&projection))?;
    let prefix = format!(
        "\"{}/{}/{}:",
        encode_name(projection.bag.as_deref().unwrap_or_default()),
        encode_name(&projection.title),
        projection.revision_or_latest()
    );
    Ok(tag.replacen('"', &prefix, 1))
}

/// Which container a tiddler URL goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    /// `/bags/{bag}/tiddlers/{title}`
    Bags,
    /// `/recipes/{recipe}/tiddlers/{title}`
    Recipes,
}

/// Returns `scheme://host[:port]`. The port is left out for 80 and 443.
#[must_use]
pub fn server_host_url(config: &WikiConfig) -> String {
    let host = &config.server_host;
    match host.port {
        80 | 443 => format!("{}://{}", host.scheme, host.host),
        port => format!("{}://{}:{port}", host.scheme, host.host),
    }
}

/// Returns the host URL followed by the server prefix, without a trailing
/// slash.
#[must_use]
pub fn server_base_url(config: &WikiConfig) -> String {
    format!("{}{}", server_host_url(config), config.server_prefix)
}

fn locate(config: &WikiConfig, link: &str, full: bool) -> String {
    if full {
        format!("{}/{link}", server_base_url(config))
    } else {
        format!("{}/{link}", config.server_prefix)
    }
}

/// URL of a bag; absolute when `full`, prefix-relative otherwise.
#[must_use]
pub fn bag_url(config: &WikiConfig, bag: &Bag, full: bool) -> String {
    locate(config, &format!("bags/{}", encode_name(&bag.name)), full)
}

/// URL of a recipe; absolute when `full`, prefix-relative otherwise.
#[must_use]
pub fn recipe_url(config: &WikiConfig, recipe: &Recipe, full: bool) -> String {
    locate(config, &format!("recipes/{}", encode_name(&recipe.name)), full)
}

/// URL of a tiddler through its bag or its recipe.
#[must_use]
pub fn tiddler_url(
    config: &WikiConfig,
    tiddler: &Tiddler,
    container: Container,
    full: bool,
) -> String {
    let (segment, name) = match container {
        Container::Bags => ("bags", tiddler.bag.as_deref()),
        Container::Recipes => ("recipes", tiddler.recipe.as_deref()),
    };
    let link = format!(
        "{segment}/{}/tiddlers/{}",
        encode_name(name.unwrap_or_default()),
        encode_name(&tiddler.title)
    );
    locate(config, &link, full)
}
