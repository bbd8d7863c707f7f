//! # Relay Core
//!
//! Core types for the Relay client pipeline.
//!
//! This crate provides the foundational types shared by every other Relay crate:
//!
//! - [`InvocationContext`] - Per-call context carrying request id, trace ids and cancellation
//! - [`RequestId`] - UUID v7 invocation identifier
//! - [`ClientError`] - The single error type surfaced to callers
//! - [`HttpRequestBuilder`] / [`HttpResponse`] - The raw HTTP domain
//! - [`HttpRequestInput`] - How a typed input describes its HTTP layout
//! - [`CredentialsProvider`] - Source of signing credentials

#![doc(html_root_url = "https://docs.rs/relay-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
pub mod credentials;
mod error;
mod input;
mod region;
mod request;
mod response;

pub use context::{InvocationContext, RequestId};
pub use credentials::{
    Credentials, CredentialsProvider, EnvironmentCredentialsProvider, StaticCredentialsProvider,
};
pub use error::{BoxError, ClientError, ClientResult, ErrorKind, ServiceError};
pub use input::HttpRequestInput;
pub use region::Region;
pub use request::{EndpointOverride, HttpRequestBuilder, Scheme};
pub use response::HttpResponse;
