//! # Relay
//!
//! **Typed request/response pipeline for calling HTTP APIs**
//!
//! Relay turns a typed input value into a signed HTTP request, sends it
//! through a pluggable transport and turns the response back into a typed
//! output, or into a typed service error.
//!
//! - **Fixed stage order** – host, port, method, signer, content headers,
//!   standard headers and error translation always run in that order
//! - **Two caller hooks** – outer middleware sees typed values, inner
//!   middleware sees raw HTTP; both default to a no-op
//! - **JSON and XML** – [`JsonHttpStack`] and [`XmlHttpStack`] fix the wire
//!   format, including query-string and XML decoding strategies
//! - **SigV4 signing** – with static or environment credentials
//! - **Cancellation** – through the invocation context
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use relay::prelude::*;
//!
//! let config = ConfigLoader::new()
//!     .with_file("relay.toml")?
//!     .with_env_prefix("RELAY")
//!     .load()?;
//! init_logging(&config.logging)?;
//!
//! let stack = JsonHttpStack::<ExampleSvcError>::with_reqwest(
//!     &config,
//!     Arc::new(EnvironmentCredentialsProvider),
//! )?;
//!
//! let ctx = InvocationContext::new().with_operation("PutItem");
//! let output: PutItemOutput = stack
//!     .operation(PutItem { id: "abc".into() }, Method::POST, "/items")
//!     .execute(&ctx)
//!     .await?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! outer → request transform → inner → host → port → method → signer
//!       → content headers → standard headers → error translation → transport
//!
//! outer ← response transform ←──────────────────────────────────── response
//! ```

#![doc(html_root_url = "https://docs.rs/relay/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod format;
mod operation;
mod stack;

pub use format::{ServiceErrorPayload, WireFormat};
pub use operation::Operation;
pub use stack::{HttpStack, JsonHttpStack, XmlHttpStack};

// Re-export core types
pub use relay_core as core;

// Re-export middleware and stack types
pub use relay_middleware as middleware;

// Re-export transforms
pub use relay_transform as transform;

// Re-export the default transport
pub use relay_transport as transport;

// Re-export configuration
pub use relay_config as config;

// Re-export telemetry
pub use relay_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use relay::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{HttpStack, JsonHttpStack, Operation, XmlHttpStack};

    pub use relay_core::{
        ClientError, ClientResult, Credentials, CredentialsProvider, EndpointOverride,
        EnvironmentCredentialsProvider, ErrorKind, HttpRequestBuilder, HttpRequestInput,
        HttpResponse, InvocationContext, Region, Scheme, ServiceError, StaticCredentialsProvider,
    };

    pub use relay_middleware::{
        BoxFuture, FnMiddleware, HttpMiddleware, HttpTransport, Middleware, Next, NoOpMiddleware,
    };

    pub use relay_transform::{
        JsonOptions, KeyEncodeTransformStrategy, KeyEncodingStrategy, ListDecodingStrategy,
        ListEncodingStrategy, MapDecodingStrategy, MapEncodingStrategy, XmlOptions,
    };

    pub use relay_transport::{ReqwestTransport, TransportOptions};

    pub use relay_config::{ClientConfig, ConfigError, ConfigLoader};

    pub use relay_telemetry::{init_logging, LogConfig};
}
