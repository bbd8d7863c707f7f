//! Top-level client configuration.

use crate::{ConfigError, ConfigResult, EndpointConfig, HttpConfig, SigningConfig};
use http::HeaderValue;
use relay_core::{CredentialsProvider, Region};
use relay_middleware::StackConfig;
use relay_telemetry::{create_env_filter, LogConfig};
use relay_transform::{JsonOptions, XmlOptions};
use relay_transport::TransportOptions;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Complete configuration of one Relay client.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables, then [`ClientConfig::stack_config`] to hand it to
/// the transform stack.
///
/// # Example
///
/// ```
/// use relay_config::ClientConfig;
///
/// let config = ClientConfig::new("example.amazonaws.com", "us-east-1", "ExampleSvc");
/// assert!(config.validate().is_ok());
/// assert_eq!(config.http.content_type, "application/json");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Where requests are sent.
    #[serde(default)]
    pub endpoint: EndpointConfig,

    /// How requests are signed.
    #[serde(default)]
    pub signing: SigningConfig,

    /// Content and standard headers.
    #[serde(default)]
    pub http: HttpConfig,

    /// Options for JSON services.
    #[serde(default)]
    pub json: JsonOptions,

    /// Options for XML services.
    #[serde(default)]
    pub xml: XmlOptions,

    /// Settings of the default transport.
    #[serde(default)]
    pub transport: TransportOptions,

    /// Structured logging.
    #[serde(default)]
    pub logging: LogConfig,
}

impl ClientConfig {
    /// Creates a configuration with the three values that have no default.
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        region: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        let mut config = Self::default();
        config.endpoint.host = host.into();
        config.signing.region = region.into();
        config.signing.service = service.into();
        config
    }

    /// Development preset: human-readable debug logs.
    #[must_use]
    pub fn development() -> Self {
        Self {
            logging: LogConfig::development(),
            ..Self::default()
        }
    }

    /// Production preset: JSON logs at `info`.
    #[must_use]
    pub fn production() -> Self {
        Self {
            logging: LogConfig::production(),
            ..Self::default()
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingField`] if the host, region or service is empty
    /// - [`ConfigError::InvalidValue`] for a zero port, a header value that
    ///   cannot be sent, or an unparsable log filter
    pub fn validate(&self) -> ConfigResult<()> {
        if self.endpoint.host.trim().is_empty() {
            return Err(ConfigError::missing_field("endpoint.host"));
        }
        if self.endpoint.port == Some(0) {
            return Err(ConfigError::invalid_value(
                "endpoint.port",
                "must be greater than 0",
            ));
        }
        if self.signing.region.trim().is_empty() {
            return Err(ConfigError::missing_field("signing.region"));
        }
        if self.signing.service.trim().is_empty() {
            return Err(ConfigError::missing_field("signing.service"));
        }

        check_header_value("http.content_type", &self.http.content_type)?;
        check_header_value("http.user_agent", &self.http.user_agent)?;
        if let Some(target) = &self.signing.target {
            check_header_value("signing.target", target)?;
        }

        if self.logging.enabled {
            create_env_filter(&self.logging.level)
                .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;
        }

        Ok(())
    }

    /// Builds the transform stack configuration, signing with `credentials`.
    #[must_use]
    pub fn stack_config(&self, credentials: Arc<dyn CredentialsProvider>) -> StackConfig {
        let mut config = StackConfig::new(
            credentials,
            Region::new(self.signing.region.clone()),
            self.signing.service.clone(),
            self.endpoint.host.clone(),
        )
        .with_scheme(self.endpoint.scheme)
        .with_v4_signing(self.signing.v4_sign_request)
        .with_sign_all_headers(self.signing.sign_all_headers)
        .with_content_type(self.http.content_type.clone())
        .with_content_headers_for_zero_length_body(self.http.content_headers_for_zero_length_body)
        .with_user_agent(self.http.user_agent.clone());

        config.port = self.endpoint.port;
        config.operation.clone_from(&self.signing.operation);
        config.target.clone_from(&self.signing.target);
        config
    }
}

fn check_header_value(field: &str, value: &str) -> ConfigResult<()> {
    if value.is_empty() {
        return Err(ConfigError::invalid_value(field, "must not be empty"));
    }
    HeaderValue::from_str(value)
        .map(|_| ())
        .map_err(|e| ConfigError::invalid_value(field, e.to_string()))
}
