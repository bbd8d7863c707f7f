//! Configuration schema types.
//!
//! This module defines the sections of a client configuration that have no
//! counterpart in another Relay crate. The `json`, `xml`, `transport` and
//! `logging` sections reuse the option types of the crates they configure.

use relay_core::Scheme;
use relay_middleware::stages::standard_headers::DEFAULT_USER_AGENT;
use serde::{Deserialize, Serialize};

/// Endpoint configuration section.
///
/// # Example
///
/// ```
/// use relay_config::EndpointConfig;
/// use relay_core::Scheme;
///
/// let config = EndpointConfig {
///     host: "example.amazonaws.com".to_string(),
///     port: Some(443),
///     scheme: Scheme::Https,
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct EndpointConfig {
    /// Host name of the service.
    #[serde(default)]
    pub host: String,

    /// Port. `None` uses the scheme's default port.
    #[serde(default)]
    pub port: Option<u16>,

    /// URL scheme.
    #[serde(default)]
    pub scheme: Scheme,
}

/// Signing configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SigningConfig {
    /// Region requests are signed for.
    #[serde(default = "default_region")]
    pub region: String,

    /// Service name used in the credential scope.
    #[serde(default)]
    pub service: String,

    /// Operation name reported in logs.
    #[serde(default)]
    pub operation: Option<String>,

    /// Value of the `x-amz-target` header.
    #[serde(default)]
    pub target: Option<String>,

    /// Sign requests with SigV4.
    #[serde(default = "default_true")]
    pub v4_sign_request: bool,

    /// Sign every header rather than the minimal set.
    #[serde(default)]
    pub sign_all_headers: bool,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            service: String::new(),
            operation: None,
            target: None,
            v4_sign_request: true,
            sign_all_headers: false,
        }
    }
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_true() -> bool {
    true
}

/// HTTP header configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    /// `content-type` sent with request bodies.
    #[serde(default = "default_content_type")]
    pub content_type: String,

    /// Send content headers for empty bodies too.
    #[serde(default)]
    pub content_headers_for_zero_length_body: bool,

    /// `user-agent` header value.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            content_type: default_content_type(),
            content_headers_for_zero_length_body: false,
            user_agent: default_user_agent(),
        }
    }
}

fn default_content_type() -> String {
    "application/json".to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}
