//! Fixed infrastructure stages.
//!
//! Every invocation runs these stages, in this order, between the caller's
//! inner middleware and the transport:
//!
//! 1. [`host`] - Set scheme and host name
//! 2. [`port`] - Set the port (scheme default when unset)
//! 3. [`method`] - Set the HTTP method
//! 4. [`signing`] - Attach target, date and signature headers
//! 5. [`content_headers`] - Attach `content-type` and `content-length`
//! 6. [`standard_headers`] - Attach `user-agent` and `accept`
//! 7. [`error_translation`] - Turn non-2xx responses into service errors

pub mod content_headers;
pub mod error_translation;
pub mod host;
pub mod method;
pub mod port;
pub mod signing;
pub mod standard_headers;

pub use content_headers::ContentHeadersMiddleware;
pub use error_translation::{ErrorDecoder, ErrorTranslationMiddleware};
pub use host::HostMiddleware;
pub use method::MethodMiddleware;
pub use port::PortMiddleware;
pub use signing::SigningMiddleware;
pub use standard_headers::StandardHeadersMiddleware;
