//! JSON transforms.
//!
//! The inward transform serializes the input's body with `serde_json` and
//! lays out its path, query and headers; the outward transform deserializes
//! the response body into the operation's output type. Error responses are
//! decoded by [`JsonErrorDecoder`].

use crate::layout::lay_out;
use crate::query::{MapEncodingStrategy, QueryEncoder};
use relay_core::{
    BoxError, ClientError, ClientResult, HttpRequestBuilder, HttpRequestInput, HttpResponse,
    InvocationContext,
};
use relay_middleware::{ErrorDecoder, Transform};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use tracing::trace;

/// Body used in place of an empty response, so outputs whose fields are all
/// optional still decode.
const EMPTY_OBJECT: &[u8] = b"{}";

/// Options for the JSON transforms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JsonOptions {
    /// How maps in the query value are laid out. `None` uses
    /// [`MapEncodingStrategy::SingleQueryEntry`].
    pub query_map_strategy: Option<MapEncodingStrategy>,
}

impl JsonOptions {
    /// Sets the query map strategy.
    #[must_use]
    pub fn with_query_map_strategy(mut self, strategy: MapEncodingStrategy) -> Self {
        self.query_map_strategy = Some(strategy);
        self
    }

    pub(crate) fn query_encoder(&self) -> QueryEncoder {
        QueryEncoder::new().with_map_strategy(self.query_map_strategy.clone().unwrap_or_default())
    }
}

/// Converts a typed input into a request with a JSON body.
pub struct JsonInwardTransform<I> {
    path: String,
    encoder: QueryEncoder,
    _input: PhantomData<fn(I)>,
}

impl<I> JsonInwardTransform<I> {
    /// Creates the transform for an endpoint path template.
    #[must_use]
    pub fn new(path: impl Into<String>, options: &JsonOptions) -> Self {
        Self {
            path: path.into(),
            encoder: options.query_encoder(),
            _input: PhantomData,
        }
    }
}

impl<I> std::fmt::Debug for JsonInwardTransform<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonInwardTransform")
            .field("path", &self.path)
            .field("encoder", &self.encoder)
            .finish()
    }
}

impl<I: HttpRequestInput> Transform<I, HttpRequestBuilder> for JsonInwardTransform<I> {
    fn name(&self) -> &'static str {
        "json_inward"
    }

    fn transform(&self, input: I, ctx: &InvocationContext) -> ClientResult<HttpRequestBuilder> {
        let body = input
            .body()
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|e| {
                ClientError::encoding_with_source("request body could not be encoded as JSON", e)
            })?;

        let request = lay_out(&input, &self.path, &self.encoder, body)?;
        trace!(
            request_id = %ctx.request_id(),
            path = %request.path(),
            body_bytes = request.body().len(),
            "JSON request encoded"
        );
        Ok(request)
    }
}

/// Decodes a JSON response body into `O`.
pub struct JsonOutwardTransform<O> {
    _output: PhantomData<fn() -> O>,
}

impl<O> JsonOutwardTransform<O> {
    /// Creates the transform.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _output: PhantomData,
        }
    }
}

impl<O> Default for JsonOutwardTransform<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O> std::fmt::Debug for JsonOutwardTransform<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JsonOutwardTransform")
    }
}

impl<O: DeserializeOwned> Transform<HttpResponse, O> for JsonOutwardTransform<O> {
    fn name(&self) -> &'static str {
        "json_outward"
    }

    fn transform(&self, response: HttpResponse, ctx: &InvocationContext) -> ClientResult<O> {
        trace!(
            request_id = %ctx.request_id(),
            body_bytes = response.body().len(),
            "Decoding JSON response"
        );
        let body = if response.body().is_empty() {
            EMPTY_OBJECT
        } else {
            response.body().as_ref()
        };
        serde_json::from_slice(body).map_err(|e| {
            ClientError::decoding_with_source("response body could not be decoded from JSON", e)
        })
    }
}

/// Decodes JSON error bodies into `E`.
pub struct JsonErrorDecoder<E> {
    _error: PhantomData<fn() -> E>,
}

impl<E> JsonErrorDecoder<E> {
    /// Creates the decoder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _error: PhantomData,
        }
    }
}

impl<E> Default for JsonErrorDecoder<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> ErrorDecoder for JsonErrorDecoder<E>
where
    E: DeserializeOwned + std::error::Error + Send + Sync + 'static,
{
    fn decode(&self, response: &HttpResponse) -> Result<BoxError, BoxError> {
        let error: E = serde_json::from_slice(response.body())?;
        Ok(Box::new(error))
    }
}
