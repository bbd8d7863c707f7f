//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading a client
//! configuration from defaults, files and environment variables.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

use relay_core::Scheme;

use crate::{ClientConfig, ConfigError, ConfigResult};

/// Configuration loader with layered approach.
///
/// Later layers override earlier ones:
/// 1. Default values
/// 2. Configuration file (TOML or JSON)
/// 3. Environment variables
///
/// # Example
///
/// ```no_run
/// use relay_config::ConfigLoader;
///
/// # fn main() -> Result<(), relay_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_file("relay.toml")?
///     .with_env_prefix("RELAY")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: ClientConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            env_prefix: None,
        }
    }

    /// Start with the development preset.
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = ClientConfig::development();
        self
    }

    /// Start with the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = ClientConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// The format is chosen by extension: `.toml` or `.json`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file does not exist, cannot be read,
    /// has an unsupported extension, or does not parse (unknown fields
    /// included).
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> ConfigResult<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        self.config = Self::parse_file(&content, path)?;
        Ok(self)
    }

    /// Load configuration from a file if it exists.
    ///
    /// # Errors
    ///
    /// Same as [`with_file`](Self::with_file) when the file exists.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> ConfigResult<Self> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in `format` (`"toml"` or `"json"`).
    ///
    /// # Example
    ///
    /// ```
    /// use relay_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [endpoint]
    ///     host = "example.amazonaws.com"
    ///
    ///     [signing]
    ///     service = "ExampleSvc"
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.endpoint.host, "example.amazonaws.com");
    /// assert_eq!(config.signing.region, "us-east-1");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the format is unsupported or parsing fails.
    pub fn with_string(mut self, content: &str, format: &str) -> ConfigResult<Self> {
        self.config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::validation_error(format!(
                    "unsupported configuration format: {format}"
                )))
            }
        };
        Ok(self)
    }

    /// Set the environment variable prefix for overrides.
    ///
    /// Variables use the format `PREFIX__SECTION__KEY`, for example
    /// `RELAY__ENDPOINT__PORT=8443` or `RELAY__SIGNING__REGION=eu-west-1`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load variables from a `.env` file in the working directory, if any.
    ///
    /// # Errors
    ///
    /// Never fails; a missing file is ignored.
    pub fn with_dotenv(self) -> ConfigResult<Self> {
        let _ = dotenvy::dotenv();
        Ok(self)
    }

    /// Apply environment overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override does not parse or validation
    /// fails.
    pub fn load(mut self) -> ConfigResult<ClientConfig> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Return the configuration without environment overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> ClientConfig {
        self.config
    }

    fn parse_file(content: &str, path: &Path) -> ConfigResult<ClientConfig> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::validation_error(format!(
                "unsupported configuration file format: {}",
                path.display()
            ))),
        }
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> ConfigResult<()> {
        let marker = format!("{prefix}__");
        let env_vars: HashMap<String, String> = env::vars()
            .filter(|(k, _)| k.starts_with(&marker))
            .collect();

        for (key, value) in env_vars {
            self.apply_env_var(&key, &value, prefix)?;
        }

        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> ConfigResult<()> {
        let key_without_prefix = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;

        let parts: Vec<&str> = key_without_prefix.split("__").collect();
        let config = &mut self.config;

        match parts.as_slice() {
            // Endpoint section
            ["ENDPOINT", "HOST"] => {
                config.endpoint.host = value.to_string();
            }
            ["ENDPOINT", "PORT"] => {
                config.endpoint.port = if value.is_empty() || value.eq_ignore_ascii_case("none") {
                    None
                } else {
                    Some(value.parse().map_err(|_| {
                        ConfigError::env_parse_error(key, "expected port number or 'none'")
                    })?)
                };
            }
            ["ENDPOINT", "SCHEME"] => {
                config.endpoint.scheme = value
                    .parse::<Scheme>()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected 'http' or 'https'"))?;
            }

            // Signing section
            ["SIGNING", "REGION"] => {
                config.signing.region = value.to_string();
            }
            ["SIGNING", "SERVICE"] => {
                config.signing.service = value.to_string();
            }
            ["SIGNING", "OPERATION"] => {
                config.signing.operation = optional(value);
            }
            ["SIGNING", "TARGET"] => {
                config.signing.target = optional(value);
            }
            ["SIGNING", "V4_SIGN_REQUEST"] => {
                config.signing.v4_sign_request = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["SIGNING", "SIGN_ALL_HEADERS"] => {
                config.signing.sign_all_headers = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }

            // HTTP section
            ["HTTP", "CONTENT_TYPE"] => {
                config.http.content_type = value.to_string();
            }
            ["HTTP", "CONTENT_HEADERS_FOR_ZERO_LENGTH_BODY"] => {
                config.http.content_headers_for_zero_length_body = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["HTTP", "USER_AGENT"] => {
                config.http.user_agent = value.to_string();
            }

            // XML section
            ["XML", "ROOT_KEY"] => {
                config.xml.root_key = optional(value);
            }

            // Transport section
            ["TRANSPORT", "REQUEST_TIMEOUT_MS"] => {
                config.transport.request_timeout_ms = parse_millis(key, value)?;
            }
            ["TRANSPORT", "CONNECT_TIMEOUT_MS"] => {
                config.transport.connect_timeout_ms = parse_millis(key, value)?;
            }
            ["TRANSPORT", "POOL_MAX_IDLE_PER_HOST"] => {
                config.transport.pool_max_idle_per_host = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }

            // Logging section
            ["LOGGING", "ENABLED"] => {
                config.logging.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["LOGGING", "LEVEL"] => {
                config.logging.level = value.to_string();
            }
            ["LOGGING", "JSON_FORMAT"] => {
                config.logging.json_format = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }

            // Unknown keys are ignored
            _ => {}
        }

        Ok(())
    }
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn optional(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn parse_millis(key: &str, value: &str) -> ConfigResult<Option<u64>> {
    if value.is_empty() || value.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::env_parse_error(key, "expected milliseconds or 'none'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_transform::ListDecodingStrategy;

    const MINIMAL_TOML: &str = r#"
        [endpoint]
        host = "example.amazonaws.com"

        [signing]
        service = "ExampleSvc"
    "#;

    #[test]
    fn test_loader_new_is_unvalidated_default() {
        let config = ConfigLoader::new().load_unvalidated();
        assert!(config.endpoint.host.is_empty());
        assert_eq!(config.signing.region, "us-east-1");
    }

    #[test]
    fn test_load_fails_without_host() {
        let err = ConfigLoader::new().load().unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { .. }));
    }

    #[test]
    fn test_loader_with_string_toml() {
        let config = ConfigLoader::new()
            .with_string(MINIMAL_TOML, "toml")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.endpoint.host, "example.amazonaws.com");
        assert_eq!(config.endpoint.scheme, Scheme::Https);
        assert_eq!(config.signing.service, "ExampleSvc");
    }

    #[test]
    fn test_loader_with_string_json() {
        let json = r#"{
            "endpoint": {"host": "localhost", "port": 8000, "scheme": "http"},
            "signing": {"service": "ExampleSvc", "v4_sign_request": false},
            "xml": {"list_decoding": {"collapse_list_using_item_tag": "member"}}
        }"#;

        let config = ConfigLoader::new()
            .with_string(json, "json")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.endpoint.port, Some(8000));
        assert!(!config.signing.v4_sign_request);
        assert_eq!(
            config.xml.list_decoding,
            ListDecodingStrategy::CollapseListUsingItemTag("member".to_string())
        );
    }

    #[test]
    fn test_loader_rejects_unknown_field() {
        let toml = r#"
            [endpoint]
            host = "example.amazonaws.com"
            hostname = "typo"
        "#;
        let result = ConfigLoader::new().with_string(toml, "toml");
        assert!(matches!(result, Err(ConfigError::TomlError(_))));
    }

    #[test]
    fn test_loader_rejects_unknown_format() {
        let result = ConfigLoader::new().with_string("host: x", "yaml");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_loader_with_file_not_found() {
        let result = ConfigLoader::new().with_file("/nonexistent/relay.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_loader_with_optional_file_not_found() {
        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/relay.toml")
            .unwrap()
            .load_unvalidated();
        assert_eq!(config.signing.region, "us-east-1");
    }

    #[test]
    fn test_presets() {
        let config = ConfigLoader::new().with_development().load_unvalidated();
        assert_eq!(config.logging.level, "debug");

        let config = ConfigLoader::new().with_production().load_unvalidated();
        assert!(config.logging.json_format);
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("yes"), Some(true));
        assert_eq!(parse_bool("on"), Some(true));

        assert_eq!(parse_bool("false"), Some(false));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("no"), Some(false));
        assert_eq!(parse_bool("off"), Some(false));

        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn test_apply_env_var_endpoint() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__ENDPOINT__HOST", "localhost", "TEST").unwrap();
        loader.apply_env_var("TEST__ENDPOINT__PORT", "8443", "TEST").unwrap();
        loader.apply_env_var("TEST__ENDPOINT__SCHEME", "HTTP", "TEST").unwrap();

        assert_eq!(loader.config.endpoint.host, "localhost");
        assert_eq!(loader.config.endpoint.port, Some(8443));
        assert_eq!(loader.config.endpoint.scheme, Scheme::Http);

        loader.apply_env_var("TEST__ENDPOINT__PORT", "none", "TEST").unwrap();
        assert_eq!(loader.config.endpoint.port, None);
    }

    #[test]
    fn test_apply_env_var_signing() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__SIGNING__REGION", "eu-west-1", "TEST").unwrap();
        loader.apply_env_var("TEST__SIGNING__TARGET", "Svc.PutItem", "TEST").unwrap();
        loader.apply_env_var("TEST__SIGNING__V4_SIGN_REQUEST", "off", "TEST").unwrap();

        assert_eq!(loader.config.signing.region, "eu-west-1");
        assert_eq!(loader.config.signing.target.as_deref(), Some("Svc.PutItem"));
        assert!(!loader.config.signing.v4_sign_request);

        loader.apply_env_var("TEST__SIGNING__TARGET", "", "TEST").unwrap();
        assert!(loader.config.signing.target.is_none());
    }

    #[test]
    fn test_apply_env_var_transport_and_logging() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__TRANSPORT__REQUEST_TIMEOUT_MS", "2500", "TEST").unwrap();
        loader.apply_env_var("TEST__LOGGING__LEVEL", "relay=debug", "TEST").unwrap();

        assert_eq!(loader.config.transport.request_timeout_ms, Some(2500));
        assert_eq!(loader.config.logging.level, "relay=debug");
    }

    #[test]
    fn test_apply_env_var_invalid_values() {
        let mut loader = ConfigLoader::new();
        assert!(matches!(
            loader.apply_env_var("TEST__ENDPOINT__PORT", "70000", "TEST"),
            Err(ConfigError::EnvParseError { .. })
        ));
        assert!(matches!(
            loader.apply_env_var("TEST__ENDPOINT__SCHEME", "ftp", "TEST"),
            Err(ConfigError::EnvParseError { .. })
        ));
        assert!(matches!(
            loader.apply_env_var("TEST__HTTP__CONTENT_HEADERS_FOR_ZERO_LENGTH_BODY", "maybe", "TEST"),
            Err(ConfigError::EnvParseError { .. })
        ));
    }

    #[test]
    fn test_apply_env_var_unknown_key_ignored() {
        let mut loader = ConfigLoader::new();
        assert!(loader.apply_env_var("TEST__ENDPOINT__COLOR", "blue", "TEST").is_ok());
    }
}
