//! Typed configuration for Relay clients.
//!
//! This crate provides:
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Overview
//!
//! [`ClientConfig`] holds everything one client needs:
//!
//! - [`EndpointConfig`] - host, port and scheme
//! - [`SigningConfig`] - region, service, target and SigV4 switches
//! - [`HttpConfig`] - content type, zero-length body policy, user agent
//! - `json` / `xml` - wire-format options from `relay-transform`
//! - `transport` - timeouts and pool size for `ReqwestTransport`
//! - `logging` - the `relay-telemetry` log configuration
//!
//! # Configuration File Format
//!
//! ```toml
//! [endpoint]
//! host = "example.amazonaws.com"
//! port = 443
//! scheme = "https"
//!
//! [signing]
//! region = "us-east-1"
//! service = "ExampleSvc"
//! target = "ExampleSvc_20240101.PutItem"
//!
//! [http]
//! content_type = "application/x-amz-json-1.0"
//!
//! [xml.list_decoding]
//! collapse_list_using_item_tag = "member"
//!
//! [transport]
//! request_timeout_ms = 30000
//!
//! [logging]
//! level = "relay_middleware=debug,info"
//! ```
//!
//! # Environment Variable Overrides
//!
//! With [`ConfigLoader::with_env_prefix`], values can be overridden with
//! variables named `PREFIX__SECTION__KEY`:
//!
//! - `RELAY__ENDPOINT__HOST=localhost`
//! - `RELAY__ENDPOINT__PORT=8000`
//! - `RELAY__SIGNING__V4_SIGN_REQUEST=false`

#![doc(html_root_url = "https://docs.rs/relay-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::ClientConfig;
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use schema::{EndpointConfig, HttpConfig, SigningConfig};
