//! Error types for Relay.
//!
//! Every step of the pipeline fails with a [`ClientError`]. The variants map
//! one-to-one onto the kinds a caller can observe:
//!
//! | Variant          | Raised by                                        |
//! |------------------|--------------------------------------------------|
//! | `Encoding`       | inward transforms (input could not be serialized)|
//! | `Decoding`       | outward transforms (body could not be decoded)   |
//! | `Signing`        | the signer (credentials or signature failure)    |
//! | `Connection`     | the transport                                    |
//! | `Service`        | the error-translation stage (non-2xx response)   |
//! | `InvalidRequest` | request builders (bad header, bad path template) |
//! | `Cancelled`      | any suspension point observing cancellation      |
//!
//! Only the error-translation stage converts one kind into another; all other
//! steps propagate errors unchanged.

use bytes::Bytes;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Boxed error used as an opaque `source`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias using [`ClientError`].
pub type ClientResult<T> = Result<T, ClientError>;

/// Classification of a [`ClientError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The typed input could not be serialized to the wire format.
    Encoding,
    /// The response body could not be deserialized.
    Decoding,
    /// Credentials were unavailable or the signature could not be computed.
    Signing,
    /// Transport-level failure.
    Connection,
    /// The remote service reported an application-level error.
    Service,
    /// The request could not be assembled.
    InvalidRequest,
    /// The invocation was cancelled.
    Cancelled,
}

impl ErrorKind {
    /// Returns the kind as a static string, suitable for log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Encoding => "encoding",
            Self::Decoding => "decoding",
            Self::Signing => "signing",
            Self::Connection => "connection",
            Self::Service => "service",
            Self::InvalidRequest => "invalid_request",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Standard error type for Relay invocations.
///
/// # Example
///
/// ```
/// use relay_core::{ClientError, ErrorKind};
///
/// let err = ClientError::encoding("field `id` is not serializable");
/// assert_eq!(err.kind(), ErrorKind::Encoding);
/// assert!(!err.is_retryable());
/// ```
#[derive(Error, Debug)]
pub enum ClientError {
    /// The typed input could not be serialized.
    #[error("Encoding error: {message}")]
    Encoding {
        /// Human-readable error message.
        message: String,
        /// The underlying codec error.
        #[source]
        source: Option<BoxError>,
    },

    /// The response body could not be deserialized.
    #[error("Decoding error: {message}")]
    Decoding {
        /// Human-readable error message.
        message: String,
        /// The underlying codec error.
        #[source]
        source: Option<BoxError>,
    },

    /// Request signing failed.
    #[error("Signing error: {message}")]
    Signing {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        #[source]
        source: Option<BoxError>,
    },

    /// The transport failed to deliver the request or read the response.
    #[error("Connection error: {message}")]
    Connection {
        /// Human-readable error message.
        message: String,
        /// The underlying transport error.
        #[source]
        source: Option<BoxError>,
    },

    /// The service answered with a non-success status.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// The request could not be assembled.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Human-readable error message.
        message: String,
    },

    /// The invocation was cancelled before it completed.
    #[error("Invocation cancelled")]
    Cancelled,
}

impl ClientError {
    /// Creates an encoding error.
    #[must_use]
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an encoding error wrapping a codec error.
    pub fn encoding_with_source(
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Encoding {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates a decoding error.
    #[must_use]
    pub fn decoding(message: impl Into<String>) -> Self {
        Self::Decoding {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a decoding error wrapping a codec error.
    pub fn decoding_with_source(
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Decoding {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates a signing error.
    #[must_use]
    pub fn signing(message: impl Into<String>) -> Self {
        Self::Signing {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a signing error wrapping an underlying error.
    pub fn signing_with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Signing {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a connection error wrapping a transport error.
    pub fn connection_with_source(
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Connection {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Encoding { .. } => ErrorKind::Encoding,
            Self::Decoding { .. } => ErrorKind::Decoding,
            Self::Signing { .. } => ErrorKind::Signing,
            Self::Connection { .. } => ErrorKind::Connection,
            Self::Service(_) => ErrorKind::Service,
            Self::InvalidRequest { .. } => ErrorKind::InvalidRequest,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Returns the service error, if this is one.
    #[must_use]
    pub const fn service_error(&self) -> Option<&ServiceError> {
        match self {
            Self::Service(err) => Some(err),
            _ => None,
        }
    }

    /// Returns `true` if this error was caused by cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns `true` if repeating the same request could succeed.
    ///
    /// Relay never retries on its own; this is a hint for callers that layer
    /// a retry policy on top of the transport.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection { .. } => true,
            Self::Service(err) => {
                err.status().is_server_error() || err.status() == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}

/// An application-level error reported by the remote service.
///
/// Carries the HTTP status, the raw response body and, when the body decoded
/// into the client's error type, the typed payload.
///
/// # Example
///
/// ```
/// use relay_core::ServiceError;
/// use http::StatusCode;
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("{code}")]
/// struct ApiError { code: String }
///
/// let err = ServiceError::new(StatusCode::NOT_FOUND, "{}")
///     .with_payload(ApiError { code: "ItemNotFound".to_string() });
///
/// assert_eq!(err.payload::<ApiError>().unwrap().code, "ItemNotFound");
/// ```
#[derive(Error, Debug)]
#[error("Service error ({status}): {message}")]
pub struct ServiceError {
    status: StatusCode,
    message: String,
    body: Bytes,
    #[source]
    payload: Option<BoxError>,
}

impl ServiceError {
    /// Creates a service error without a typed payload.
    #[must_use]
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            message: status
                .canonical_reason()
                .unwrap_or("unrecognized status")
                .to_string(),
            body: body.into(),
            payload: None,
        }
    }

    /// Attaches the decoded, typed error payload.
    #[must_use]
    pub fn with_payload<E>(self, payload: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.with_boxed_payload(Box::new(payload))
    }

    /// Attaches an already boxed payload.
    #[must_use]
    pub fn with_boxed_payload(mut self, payload: BoxError) -> Self {
        self.message = payload.to_string();
        self.payload = Some(payload);
        self
    }

    /// Returns the HTTP status of the response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the human-readable error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the raw response body.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns `true` if the body decoded into the client's error type.
    #[must_use]
    pub const fn has_payload(&self) -> bool {
        self.payload.is_some()
    }

    /// Returns the typed payload if it is of type `E`.
    #[must_use]
    pub fn payload<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        self.payload.as_deref().and_then(|p| p.downcast_ref::<E>())
    }
}
