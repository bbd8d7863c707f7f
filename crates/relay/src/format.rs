//! Wire formats.
//!
//! A wire format fixes the request transform, the response transform and
//! the error decoder used by a stack. The format's options type doubles as
//! the format marker: [`JsonOptions`] selects JSON, [`XmlOptions`] selects
//! XML.

use relay_config::ClientConfig;
use relay_core::{HttpRequestBuilder, HttpRequestInput, HttpResponse};
use relay_middleware::{ErrorDecoder, Transform};
use relay_transform::{
    JsonErrorDecoder, JsonInwardTransform, JsonOptions, JsonOutwardTransform, XmlErrorDecoder,
    XmlInwardTransform, XmlOptions, XmlOutwardTransform,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// A typed service error that can be decoded from an error response body.
///
/// Implemented for every type with the required bounds.
pub trait ServiceErrorPayload: DeserializeOwned + std::error::Error + Send + Sync + 'static {}

impl<T> ServiceErrorPayload for T where T: DeserializeOwned + std::error::Error + Send + Sync + 'static {}

mod sealed {
    pub trait Sealed {}

    impl Sealed for relay_transform::JsonOptions {}
    impl Sealed for relay_transform::XmlOptions {}
}

/// The options of a body encoding, and the transforms they configure.
///
/// Sealed: implemented for [`JsonOptions`] and [`XmlOptions`] only.
pub trait WireFormat: sealed::Sealed + Clone + Send + Sync + 'static {
    /// Format name, used in logs.
    const NAME: &'static str;

    /// Takes this format's options from a client configuration.
    fn from_config(config: &ClientConfig) -> Self;

    /// Creates the inward transform for one call to `path`.
    fn request_transform<I: HttpRequestInput>(
        &self,
        path: &str,
    ) -> Box<dyn Transform<I, HttpRequestBuilder>>;

    /// Creates the outward transform for one call.
    fn response_transform<O>(&self) -> Box<dyn Transform<HttpResponse, O>>
    where
        O: DeserializeOwned + Send + 'static;

    /// Creates the decoder for error bodies carrying `E`.
    fn error_decoder<E: ServiceErrorPayload>(&self) -> Arc<dyn ErrorDecoder>;
}

impl WireFormat for JsonOptions {
    const NAME: &'static str = "json";

    fn from_config(config: &ClientConfig) -> Self {
        config.json.clone()
    }

    fn request_transform<I: HttpRequestInput>(
        &self,
        path: &str,
    ) -> Box<dyn Transform<I, HttpRequestBuilder>> {
        Box::new(JsonInwardTransform::new(path, self))
    }

    fn response_transform<O>(&self) -> Box<dyn Transform<HttpResponse, O>>
    where
        O: DeserializeOwned + Send + 'static,
    {
        Box::new(JsonOutwardTransform::new())
    }

    fn error_decoder<E: ServiceErrorPayload>(&self) -> Arc<dyn ErrorDecoder> {
        Arc::new(JsonErrorDecoder::<E>::new())
    }
}

impl WireFormat for XmlOptions {
    const NAME: &'static str = "xml";

    fn from_config(config: &ClientConfig) -> Self {
        config.xml.clone()
    }

    fn request_transform<I: HttpRequestInput>(
        &self,
        path: &str,
    ) -> Box<dyn Transform<I, HttpRequestBuilder>> {
        Box::new(XmlInwardTransform::new(path, self))
    }

    fn response_transform<O>(&self) -> Box<dyn Transform<HttpResponse, O>>
    where
        O: DeserializeOwned + Send + 'static,
    {
        Box::new(XmlOutwardTransform::new(self))
    }

    fn error_decoder<E: ServiceErrorPayload>(&self) -> Arc<dyn ErrorDecoder> {
        Arc::new(XmlErrorDecoder::<E>::new(self))
    }
}
