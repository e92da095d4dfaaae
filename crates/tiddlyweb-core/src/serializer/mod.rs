//! Serialization plugins and the registry that maps MIME types to them.
//!
//! A [`Serialization`] turns entities into text and back for one format
//! (`json`, `text`, `html`). The [`SerializerRegistry`] holds the plugins
//! plus the table of MIME type → [`SerializerEntry`] that content
//! negotiation walks. Both are built once at startup with explicit
//! `register` calls and shared read-only afterwards.

mod html;
mod json;
mod text;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{WikiError, WikiResult};
use crate::{Bag, Recipe, Tiddler};

pub use html::{page_footer, page_header, HtmlSerialization};
pub use json::JsonSerialization;
pub use text::TextSerialization;

/// A format plugin.
///
/// Every method has a default that reports the operation as unsupported,
/// so a plugin only implements what its format can represent.
pub trait Serialization: Send + Sync + fmt::Debug {
    /// The short format name, such as `json`.
    fn format(&self) -> &'static str;

    /// Renders a list of bags.
    fn list_bags(&self, _bags: &[Bag]) -> WikiResult<String> {
        Err(WikiError::unsupported(self.format(), "list_bags"))
    }

    /// Renders a list of recipes.
    fn list_recipes(&self, _recipes: &[Recipe]) -> WikiResult<String> {
        Err(WikiError::unsupported(self.format(), "list_recipes"))
    }

    /// Renders a list of tiddlers. Tiddler text is not included.
    fn list_tiddlers(&self, _tiddlers: &[Tiddler]) -> WikiResult<String> {
        Err(WikiError::unsupported(self.format(), "list_tiddlers"))
    }

    /// Renders a bag.
    fn bag_as(&self, _bag: &Bag) -> WikiResult<String> {
        Err(WikiError::unsupported(self.format(), "bag_as"))
    }

    /// Renders a recipe.
    fn recipe_as(&self, _recipe: &Recipe) -> WikiResult<String> {
        Err(WikiError::unsupported(self.format(), "recipe_as"))
    }

    /// Renders a tiddler.
    fn tiddler_as(&self, _tiddler: &Tiddler) -> WikiResult<String> {
        Err(WikiError::unsupported(self.format(), "tiddler_as"))
    }

    /// Parses a bag named `name`.
    fn as_bag(&self, _name: &str, _input: &str) -> WikiResult<Bag> {
        Err(WikiError::unsupported(self.format(), "as_bag"))
    }

    /// Parses a recipe named `name`.
    fn as_recipe(&self, _name: &str, _input: &str) -> WikiResult<Recipe> {
        Err(WikiError::unsupported(self.format(), "as_recipe"))
    }

    /// Parses a tiddler titled `title` in `bag`.
    fn as_tiddler(&self, _title: &str, _bag: &str, _input: &str) -> WikiResult<Tiddler> {
        Err(WikiError::unsupported(self.format(), "as_tiddler"))
    }
}

/// The format and canonical outgoing MIME type registered for a MIME type.
///
/// In configuration files an entry is written as a two element array:
/// `"application/json" = ["json", "application/json; charset=UTF-8"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct SerializerEntry {
    /// Format short name.
    pub format: String,
    /// Canonical outgoing MIME type, with charset.
    pub mime: String,
}

impl SerializerEntry {
    /// Creates an entry.
    #[must_use]
    pub fn new(format: impl Into<String>, mime: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            mime: mime.into(),
        }
    }

    /// Returns the outgoing MIME type without parameters.
    #[must_use]
    pub fn bare_mime(&self) -> &str {
        self.mime.split(';').next().unwrap_or_default().trim()
    }
}

impl From<(String, String)> for SerializerEntry {
    fn from((format, mime): (String, String)) -> Self {
        Self { format, mime }
    }
}

impl From<SerializerEntry> for (String, String) {
    fn from(entry: SerializerEntry) -> Self {
        (entry.format, entry.mime)
    }
}

/// Plugins plus the MIME type table used for negotiation.
#[derive(Debug, Clone)]
pub struct SerializerRegistry {
    plugins: HashMap<&'static str, Arc<dyn Serialization>>,
    types: BTreeMap<String, SerializerEntry>,
    default_type: String,
}

impl SerializerRegistry {
    /// Creates an empty registry whose fallback entry is `default_type`.
    #[must_use]
    pub fn new(default_type: impl Into<String>) -> Self {
        Self {
            plugins: HashMap::new(),
            types: BTreeMap::new(),
            default_type: default_type.into(),
        }
    }

    /// Creates a registry with the `json`, `text` and `html` plugins
    /// registered. `server_prefix` is used for links in HTML output.
    #[must_use]
    pub fn with_standard_plugins(default_type: impl Into<String>, server_prefix: &str) -> Self {
        let mut registry = Self::new(default_type);
        registry.register(Arc::new(JsonSerialization));
        registry.register(Arc::new(TextSerialization));
        registry.register(Arc::new(HtmlSerialization::new(server_prefix)));
        registry
    }

    /// Registers a format plugin, replacing any plugin with the same name.
    pub fn register(&mut self, plugin: Arc<dyn Serialization>) {
        self.plugins.insert(plugin.format(), plugin);
    }

    /// Maps a MIME type to an entry.
    pub fn map_type(&mut self, mime: impl Into<String>, entry: SerializerEntry) {
        self.types.insert(mime.into(), entry);
    }

    /// Looks up the entry for a MIME type. Matching is exact.
    #[must_use]
    pub fn lookup(&self, mime: &str) -> Option<&SerializerEntry> {
        self.types.get(mime)
    }

    /// Returns the fallback entry used for reads when negotiation fails.
    #[must_use]
    pub fn default_entry(&self) -> Option<&SerializerEntry> {
        self.types.get(&self.default_type)
    }

    /// Returns the fallback MIME type key.
    #[must_use]
    pub fn default_type(&self) -> &str {
        &self.default_type
    }

    /// Iterates over the registered MIME types.
    pub fn types(&self) -> impl Iterator<Item = (&str, &SerializerEntry)> {
        self.types.iter().map(|(mime, entry)| (mime.as_str(), entry))
    }

    /// Returns the plugin for a format.
    pub fn serializer(&self, format: &str) -> WikiResult<Arc<dyn Serialization>> {
        self.plugins
            .get(format)
            .cloned()
            .ok_or_else(|| WikiError::unsupported(format, "serialization"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SerializerRegistry {
        let mut registry = SerializerRegistry::with_standard_plugins("text/html", "");
        registry.map_type(
            "application/json",
            SerializerEntry::new("json", "application/json; charset=UTF-8"),
        );
        registry.map_type(
            "text/html",
            SerializerEntry::new("html", "text/html; charset=UTF-8"),
        );
        registry
    }

    #[test]
    fn test_lookup_is_exact() {
        let registry = registry();
        assert_eq!(registry.lookup("application/json").unwrap().format, "json");
        assert!(registry.lookup("application/*").is_none());
        assert!(registry.lookup("application/json; q=1").is_none());
    }

    #[test]
    fn test_default_entry() {
        let registry = registry();
        assert_eq!(registry.default_entry().unwrap().format, "html");
    }

    #[test]
    fn test_missing_plugin() {
        let registry = SerializerRegistry::new("text/html");
        let err = registry.serializer("json").unwrap_err();
        assert_eq!(err.status_code(), http::StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn test_entry_from_config_array() {
        let entry: SerializerEntry =
            serde_json::from_str(r#"["text", "text/plain; charset=UTF-8"]"#).unwrap();
        assert_eq!(entry.format, "text");
        assert_eq!(entry.bare_mime(), "text/plain");
    }

    #[test]
    fn test_unsupported_default_methods() {
        let registry = registry();
        let text = registry.serializer("text").unwrap();
        assert!(matches!(
            text.bag_as(&Bag::new("alpha")),
            Err(WikiError::Unsupported { .. })
        ));
    }
}
