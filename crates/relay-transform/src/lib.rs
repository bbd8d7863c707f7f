//! # Relay Transform
//!
//! Wire-format transforms for the Relay HTTP client.
//!
//! A transform is the format-specific half of a call: the inward transform
//! turns a typed input into an `HttpRequestBuilder`, the outward transform
//! turns a successful `HttpResponse` into the typed output.
//!
//! | Format | Inward                  | Outward                  | Error bodies         |
//! |--------|-------------------------|--------------------------|----------------------|
//! | JSON   | [`JsonInwardTransform`] | [`JsonOutwardTransform`] | [`JsonErrorDecoder`] |
//! | XML    | [`XmlInwardTransform`]  | [`XmlOutwardTransform`]  | [`XmlErrorDecoder`]  |
//! | none   |                         | [`VoidOutwardTransform`] |                      |
//!
//! Both inward transforms share the same request layout: the endpoint path
//! is a [`PathTemplate`], the input's query value goes through a
//! [`QueryEncoder`] and the input's additional headers are attached as-is.

#![doc(html_root_url = "https://docs.rs/relay-transform/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod json;
mod layout;
pub mod path;
pub mod query;
mod void;
pub mod xml;

pub use json::{JsonErrorDecoder, JsonInwardTransform, JsonOptions, JsonOutwardTransform};
pub use path::PathTemplate;
pub use query::{
    KeyEncodeTransformStrategy, KeyEncodingStrategy, ListEncodingStrategy, MapEncodingStrategy,
    QueryEncoder,
};
pub use void::VoidOutwardTransform;
pub use xml::{
    ListDecodingStrategy, MapDecodingStrategy, XmlErrorDecoder, XmlInwardTransform, XmlOptions,
    XmlOutwardTransform,
};
