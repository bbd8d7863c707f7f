//! Structured logging for Relay clients.
//!
//! Relay emits `tracing` spans and events from every layer of a call; this
//! crate installs a subscriber that renders them.
//!
//! # Emitted Telemetry
//!
//! | Source            | Level  | Fields                                                   |
//! |-------------------|--------|----------------------------------------------------------|
//! | Invocation span   | `info` | `request_id`, `service`, `operation`, `http.method`, `http.path`, `http.host` |
//! | Fixed stages      | `debug`/`trace` | `request_id`, stage-specific fields            |
//! | Error translation | `warn` | `request_id`, `status`, `typed`                           |
//! | Transport         | `debug`| `http.status_code`, `latency_ms`                         |
//!
//! Credentials are never logged.
//!
//! # Example
//!
//! ```rust,ignore
//! use relay_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!("client ready");
//! ```

#![doc(html_root_url = "https://docs.rs/relay-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
