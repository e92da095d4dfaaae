//! Configuration section types.

use serde::{Deserialize, Serialize};
use tiddlyweb_telemetry::{LogConfig, LogFormat};

/// Listener settings for the HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Largest accepted request body, in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            request_timeout_ms: default_request_timeout(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_http_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    30000
}

fn default_max_body_bytes() -> usize {
    4 * 1024 * 1024
}

/// The public origin of the server, used to build absolute URLs.
///
/// This can differ from the bind address when the server sits behind a
/// proxy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerHost {
    /// URL scheme.
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Host name.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port; omitted from URLs when 80 or 443.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerHost {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_scheme() -> String {
    "http".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// `EnvFilter` directive (trace, debug, info, warn, error, or per target).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include ANSI color codes in pretty output.
    #[serde(default)]
    pub ansi_enabled: bool,

    /// Include source file and line.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            ansi_enabled: false,
            include_location: false,
        }
    }
}

impl LoggingSection {
    /// Converts the section into the telemetry crate's settings.
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            level: self.level.clone(),
            format: self.format,
            ansi: self.ansi_enabled,
            file_line_info: self.include_location,
            include_target: true,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_host_defaults() {
        let host = ServerHost::default();
        assert_eq!(host.scheme, "http");
        assert_eq!(host.host, "0.0.0.0");
        assert_eq!(host.port, 8080);
    }

    #[test]
    fn test_partial_section_uses_defaults() {
        let host: ServerHost = serde_json::from_str(r#"{"host": "wiki.example.com"}"#).unwrap();
        assert_eq!(host.host, "wiki.example.com");
        assert_eq!(host.port, 8080);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<ServerSection, _> = serde_json::from_str(r#"{"listen": "x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_logging_conversion() {
        let section = LoggingSection {
            level: "debug".into(),
            format: LogFormat::Pretty,
            ansi_enabled: true,
            include_location: true,
        };
        let config = section.to_log_config();
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.ansi);
        assert!(config.file_line_info);
    }
}
