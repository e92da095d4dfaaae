//! The top-level [`WikiConfig`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tiddlyweb_core::policy::{ADMIN_ROLE, ANY};
use tiddlyweb_core::serializer::{SerializerEntry, SerializerRegistry};
use tiddlyweb_telemetry::logging::create_env_filter;
use tiddlyweb_telemetry::LogFormat;

use crate::{ConfigError, LoggingSection, ServerHost, ServerSection};

/// Complete server configuration.
///
/// Built once at startup by [`ConfigLoader`](crate::ConfigLoader) and shared
/// read-only (behind an `Arc`) by every request.
///
/// ```
/// use tiddlyweb_config::WikiConfig;
///
/// let config = WikiConfig::default();
/// assert_eq!(config.default_serializer, "text/html");
/// assert_eq!(config.mime_for_extension("json"), Some("application/json"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct WikiConfig {
    /// Listener settings.
    #[serde(default)]
    pub server: ServerSection,

    /// Public origin used for absolute URLs.
    #[serde(default)]
    pub server_host: ServerHost,

    /// Path prefix of every URL the server handles and produces.
    #[serde(default)]
    pub server_prefix: String,

    /// URL extension → MIME type.
    #[serde(default = "default_extension_types")]
    pub extension_types: BTreeMap<String, String>,

    /// MIME type → (format, canonical outgoing MIME type).
    #[serde(default = "default_serializers")]
    pub serializers: BTreeMap<String, SerializerEntry>,

    /// The `serializers` key used when a read negotiates nothing.
    #[serde(default = "default_default_serializer")]
    pub default_serializer: String,

    /// Credential extractors, tried in order.
    #[serde(default = "default_extractors")]
    pub extractors: Vec<String>,

    /// Challengers offered when a user is required.
    #[serde(default = "default_auth_systems")]
    pub auth_systems: Vec<String>,

    /// Key for signing identity cookies. Change it in every installation.
    #[serde(default = "default_secret")]
    pub secret: String,

    /// Who may create bags: `""` (anyone), `ANY` or `ADMIN`.
    #[serde(default)]
    pub bag_create_policy: String,

    /// Who may create recipes: `""` (anyone), `ANY` or `ADMIN`.
    #[serde(default)]
    pub recipe_create_policy: String,

    /// Stylesheet linked from HTML pages.
    #[serde(default)]
    pub css_uri: String,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSection,
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            server: ServerSection::default(),
            server_host: ServerHost::default(),
            server_prefix: String::new(),
            extension_types: default_extension_types(),
            serializers: default_serializers(),
            default_serializer: default_default_serializer(),
            extractors: default_extractors(),
            auth_systems: default_auth_systems(),
            secret: default_secret(),
            bag_create_policy: String::new(),
            recipe_create_policy: String::new(),
            css_uri: String::new(),
            logging: LoggingSection::default(),
        }
    }
}

fn default_extension_types() -> BTreeMap<String, String> {
    [
        ("txt", "text/plain"),
        ("html", "text/html"),
        ("json", "application/json"),
    ]
    .into_iter()
    .map(|(ext, mime)| (ext.to_string(), mime.to_string()))
    .collect()
}

fn default_serializers() -> BTreeMap<String, SerializerEntry> {
    [
        ("text/html", "html", "text/html; charset=UTF-8"),
        ("text/plain", "text", "text/plain; charset=UTF-8"),
        ("application/json", "json", "application/json; charset=UTF-8"),
    ]
    .into_iter()
    .map(|(mime, format, outgoing)| (mime.to_string(), SerializerEntry::new(format, outgoing)))
    .collect()
}

fn default_default_serializer() -> String {
    "text/html".to_string()
}

fn default_extractors() -> Vec<String> {
    vec!["http_basic".to_string(), "simple_cookie".to_string()]
}

fn default_auth_systems() -> Vec<String> {
    vec!["cookie_form".to_string()]
}

fn default_secret() -> String {
    "this should come from a file".to_string()
}

impl WikiConfig {
    /// Local development preset: pretty debug logs.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.ansi_enabled = true;
        config
    }

    /// Returns the MIME type registered for a URL extension.
    #[must_use]
    pub fn mime_for_extension(&self, extension: &str) -> Option<&str> {
        self.extension_types.get(extension).map(String::as_str)
    }

    /// Builds the serializer registry described by this configuration.
    #[must_use]
    pub fn serializer_registry(&self) -> SerializerRegistry {
        let mut registry = SerializerRegistry::with_standard_plugins(
            self.default_serializer.clone(),
            &self.server_prefix,
        );
        for (mime, entry) in &self.serializers {
            registry.map_type(mime.clone(), entry.clone());
        }
        registry
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self
            .server
            .http_addr
            .parse::<std::net::SocketAddr>()
            .is_err()
        {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        if !matches!(self.server_host.scheme.as_str(), "http" | "https") {
            return Err(ConfigError::invalid_value(
                "server_host.scheme",
                format!("expected http or https, got {}", self.server_host.scheme),
            ));
        }

        if !self.server_prefix.is_empty()
            && (!self.server_prefix.starts_with('/') || self.server_prefix.ends_with('/'))
        {
            return Err(ConfigError::invalid_value(
                "server_prefix",
                "must be empty or start with '/' and not end with '/'",
            ));
        }

        if !self.serializers.contains_key(&self.default_serializer) {
            return Err(ConfigError::invalid_value(
                "default_serializer",
                format!("{} is not a serializers key", self.default_serializer),
            ));
        }

        for (extension, mime) in &self.extension_types {
            if !self.serializers.contains_key(mime) {
                return Err(ConfigError::invalid_value(
                    format!("extension_types.{extension}"),
                    format!("{mime} is not a serializers key"),
                ));
            }
        }

        let registry = self.serializer_registry();
        for (mime, entry) in &self.serializers {
            if registry.serializer(&entry.format).is_err() {
                return Err(ConfigError::invalid_value(
                    format!("serializers.{mime}"),
                    format!("unknown format {}", entry.format),
                ));
            }
        }

        for (field, setting) in [
            ("bag_create_policy", &self.bag_create_policy),
            ("recipe_create_policy", &self.recipe_create_policy),
        ] {
            if !matches!(setting.as_str(), "" | ANY | ADMIN_ROLE) {
                return Err(ConfigError::invalid_value(
                    field,
                    format!("expected \"\", {ANY} or {ADMIN_ROLE}, got {setting}"),
                ));
            }
        }

        if self.secret.is_empty() {
            return Err(ConfigError::validation_error("secret must not be empty"));
        }

        create_env_filter(&self.logging.level)
            .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;

        Ok(())
    }
}
