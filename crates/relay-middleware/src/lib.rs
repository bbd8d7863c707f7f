//! # Relay Middleware
//!
//! Middleware chain and transform stack for the Relay HTTP client.
//!
//! Every call made through Relay runs one chain, assembled per call from three
//! sources: the caller's optional outer and inner middleware, a request and a
//! response transform for the wire format, and the fixed infrastructure
//! stages below.
//!
//! ## Chain Order
//!
//! ```text
//! outer → request transform → inner → host → port → method → signer
//!       → content headers → standard headers → error translation → transport
//! ```
//!
//! | Stage | Middleware        | Purpose                                   |
//! |-------|-------------------|-------------------------------------------|
//! | 1     | Host              | Set scheme and host name                  |
//! | 2     | Port              | Set the port                              |
//! | 3     | Method            | Set the HTTP method                       |
//! | 4     | Signer            | Target header and SigV4 signature         |
//! | 5     | Content headers   | `content-type` and `content-length`       |
//! | 6     | Standard headers  | `user-agent` and `accept`                 |
//! | 7     | Error translation | Non-2xx response to `ClientError::Service`|
//!
//! ## Example
//!
//! ```
//! use relay_middleware::Stage;
//!
//! let stages = Stage::all();
//! assert_eq!(stages.len(), 7);
//! assert_eq!(stages[0].name(), "host");
//! assert_eq!(stages[6].name(), "error_translation");
//! ```

#![doc(html_root_url = "https://docs.rs/relay-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod middleware;
pub mod sigv4;
pub mod stack;
pub mod stages;
pub mod transform;
pub mod transport;

pub use middleware::{BoxFuture, FnMiddleware, Middleware, Next, NoOpMiddleware};
pub use sigv4::{SigV4Signer, SignedHeaders};
pub use stack::{HttpMiddleware, Invocation, ResolvedEndpoint, StackConfig, Stage, TransformStack};
pub use stages::ErrorDecoder;
pub use transform::{FnTransform, Transform};
pub use transport::HttpTransport;
