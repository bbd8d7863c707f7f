//! # Relay Test
//!
//! Test utilities for code built on Relay. Nothing here opens a socket.
//!
//! ## Key Features
//!
//! - **Scripted transport**: [`MockTransport`] replays queued responses or
//!   answers from a closure, and records every request it receives
//! - **Call recording**: [`RecordingMiddleware`] logs entry and exit into a
//!   shared [`CallLog`], at either the typed or the raw-HTTP level
//! - **Canned responses**: [`json_response`], [`xml_response`] and
//!   [`empty_response`]
//!
//! ## Example
//!
//! ```
//! use http::StatusCode;
//! use relay_test::{json_response, MockTransport};
//! use serde_json::json;
//!
//! let transport = MockTransport::new()
//!     .with_response(json_response(StatusCode::OK, &json!({"status": "ok"})));
//!
//! assert_eq!(transport.call_count(), 0);
//! ```

#![doc(html_root_url = "https://docs.rs/relay-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod recorder;
mod responses;
mod transport;

pub use recorder::{CallLog, RecordingMiddleware};
pub use responses::{empty_response, json_response, xml_response};
pub use transport::MockTransport;
