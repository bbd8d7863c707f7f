//! XML transforms.
//!
//! Bodies are written and read with quick-xml's serde support. The request
//! body's root element is named after the body type unless
//! [`XmlOptions::root_key`] overrides it. Responses and error bodies pass
//! through the list/map normalisation in [`normalize`] before decoding.

mod normalize;

use crate::layout::lay_out;
use crate::query::{
    KeyEncodeTransformStrategy, KeyEncodingStrategy, ListEncodingStrategy, MapEncodingStrategy,
    QueryEncoder,
};
use relay_core::{
    BoxError, ClientError, ClientResult, HttpRequestBuilder, HttpRequestInput, HttpResponse,
    InvocationContext,
};
use relay_middleware::{ErrorDecoder, Transform};
use quick_xml::de::DeError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::marker::PhantomData;
use tracing::trace;

/// Stand-in document for an empty response body.
const EMPTY_DOCUMENT: &str = "<Response/>";

/// How wrapped lists in response XML are read.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListDecodingStrategy {
    /// Decode the XML as it is.
    #[default]
    PreserveStructure,
    /// Lists are wrapped, one child element with this tag per item.
    CollapseListUsingItemTag(String),
}

/// How key/value maps in response XML are read.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapDecodingStrategy {
    /// Decode the XML as it is.
    #[default]
    PreserveStructure,
    /// Each map entry is an element holding a key element and a value element.
    SeparateEntriesWith {
        /// Tag of the key element.
        key_tag: String,
        /// Tag of the value element.
        value_tag: String,
    },
}

/// Options for the XML transforms.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct XmlOptions {
    /// Root element name for request bodies. Defaults to the body type's
    /// name without its module path or generic arguments.
    pub root_key: Option<String>,
    /// How lists are read from responses.
    pub list_decoding: ListDecodingStrategy,
    /// How maps are read from responses.
    pub map_decoding: MapDecodingStrategy,
    /// How maps in the query value are laid out.
    pub query_map_strategy: MapEncodingStrategy,
    /// How lists in the query value are laid out.
    pub query_list_strategy: ListEncodingStrategy,
    /// How nested query keys are joined.
    pub query_key_strategy: KeyEncodingStrategy,
    /// How query field names are rewritten.
    pub query_key_transform: KeyEncodeTransformStrategy,
}

impl XmlOptions {
    /// Sets the request root element name.
    #[must_use]
    pub fn with_root_key(mut self, root_key: impl Into<String>) -> Self {
        self.root_key = Some(root_key.into());
        self
    }

    /// Sets the response list strategy.
    #[must_use]
    pub fn with_list_decoding(mut self, strategy: ListDecodingStrategy) -> Self {
        self.list_decoding = strategy;
        self
    }

    /// Sets the response map strategy.
    #[must_use]
    pub fn with_map_decoding(mut self, strategy: MapDecodingStrategy) -> Self {
        self.map_decoding = strategy;
        self
    }

    /// Sets the query map strategy.
    #[must_use]
    pub fn with_query_map_strategy(mut self, strategy: MapEncodingStrategy) -> Self {
        self.query_map_strategy = strategy;
        self
    }

    /// Sets the query list strategy.
    #[must_use]
    pub fn with_query_list_strategy(mut self, strategy: ListEncodingStrategy) -> Self {
        self.query_list_strategy = strategy;
        self
    }

    /// Sets the query key strategy.
    #[must_use]
    pub const fn with_query_key_strategy(mut self, strategy: KeyEncodingStrategy) -> Self {
        self.query_key_strategy = strategy;
        self
    }

    /// Sets the query key transform.
    #[must_use]
    pub const fn with_query_key_transform(mut self, strategy: KeyEncodeTransformStrategy) -> Self {
        self.query_key_transform = strategy;
        self
    }

    pub(crate) fn query_encoder(&self) -> QueryEncoder {
        QueryEncoder::new()
            .with_map_strategy(self.query_map_strategy.clone())
            .with_list_strategy(self.query_list_strategy.clone())
            .with_key_strategy(self.query_key_strategy)
            .with_key_transform(self.query_key_transform)
    }

    fn decode<T: DeserializeOwned>(&self, body: &[u8]) -> ClientResult<T> {
        let text = std::str::from_utf8(body)
            .map_err(|e| ClientError::decoding_with_source("response body is not UTF-8", e))?;
        let text = if text.trim().is_empty() {
            EMPTY_DOCUMENT
        } else {
            text
        };

        // An empty element dropped as an empty list may have been a scalar;
        // keep it and retry when serde reports that field missing.
        let mut keep_empty = BTreeSet::new();
        loop {
            let normalized =
                normalize::normalize(text, &self.list_decoding, &self.map_decoding, &keep_empty)?;
            match quick_xml::de::from_str(&normalized.xml) {
                Ok(value) => return Ok(value),
                Err(error) => {
                    if let Some(field) = missing_field(&error) {
                        if normalized.dropped.contains(field) {
                            keep_empty.insert(field.to_string());
                            continue;
                        }
                    }
                    return Err(ClientError::decoding_with_source(
                        "response body could not be decoded from XML",
                        error,
                    ));
                }
            }
        }
    }
}

fn missing_field(error: &DeError) -> Option<&str> {
    match error {
        DeError::Custom(message) => message
            .strip_prefix("missing field `")
            .and_then(|rest| rest.strip_suffix('`')),
        _ => None,
    }
}

/// Returns the unqualified name of `T`: `my_app::model::PutItem<u8>` becomes
/// `PutItem`.
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Converts a typed input into a request with an XML body.
pub struct XmlInwardTransform<I> {
    path: String,
    root_key: Option<String>,
    encoder: QueryEncoder,
    _input: PhantomData<fn(I)>,
}

impl<I> XmlInwardTransform<I> {
    /// Creates the transform for an endpoint path template.
    #[must_use]
    pub fn new(path: impl Into<String>, options: &XmlOptions) -> Self {
        Self {
            path: path.into(),
            root_key: options.root_key.clone(),
            encoder: options.query_encoder(),
            _input: PhantomData,
        }
    }
}

impl<I> std::fmt::Debug for XmlInwardTransform<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XmlInwardTransform")
            .field("path", &self.path)
            .field("root_key", &self.root_key)
            .finish_non_exhaustive()
    }
}

impl<I: HttpRequestInput> Transform<I, HttpRequestBuilder> for XmlInwardTransform<I> {
    fn name(&self) -> &'static str {
        "xml_inward"
    }

    fn transform(&self, input: I, ctx: &InvocationContext) -> ClientResult<HttpRequestBuilder> {
        let root = self
            .root_key
            .as_deref()
            .unwrap_or_else(|| short_type_name::<I::Body>());

        let body = input
            .body()
            .map(|body| quick_xml::se::to_string_with_root(root, body))
            .transpose()
            .map_err(|e| {
                ClientError::encoding_with_source("request body could not be encoded as XML", e)
            })?;

        let request = lay_out(&input, &self.path, &self.encoder, body.map(String::into_bytes))?;
        trace!(
            request_id = %ctx.request_id(),
            path = %request.path(),
            root,
            body_bytes = request.body().len(),
            "XML request encoded"
        );
        Ok(request)
    }
}

/// Decodes an XML response body into `O`.
pub struct XmlOutwardTransform<O> {
    options: XmlOptions,
    _output: PhantomData<fn() -> O>,
}

impl<O> XmlOutwardTransform<O> {
    /// Creates the transform.
    #[must_use]
    pub fn new(options: &XmlOptions) -> Self {
        Self {
            options: options.clone(),
            _output: PhantomData,
        }
    }
}

impl<O> std::fmt::Debug for XmlOutwardTransform<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XmlOutwardTransform")
            .field("list_decoding", &self.options.list_decoding)
            .field("map_decoding", &self.options.map_decoding)
            .finish()
    }
}

impl<O: DeserializeOwned> Transform<HttpResponse, O> for XmlOutwardTransform<O> {
    fn name(&self) -> &'static str {
        "xml_outward"
    }

    fn transform(&self, response: HttpResponse, ctx: &InvocationContext) -> ClientResult<O> {
        trace!(
            request_id = %ctx.request_id(),
            body_bytes = response.body().len(),
            "Decoding XML response"
        );
        self.options.decode(response.body())
    }
}

/// Decodes XML error bodies into `E`, applying the same normalisation as
/// successful responses.
pub struct XmlErrorDecoder<E> {
    options: XmlOptions,
    _error: PhantomData<fn() -> E>,
}

impl<E> XmlErrorDecoder<E> {
    /// Creates the decoder.
    #[must_use]
    pub fn new(options: &XmlOptions) -> Self {
        Self {
            options: options.clone(),
            _error: PhantomData,
        }
    }
}

impl<E> ErrorDecoder for XmlErrorDecoder<E>
where
    E: DeserializeOwned + std::error::Error + Send + Sync + 'static,
{
    fn decode(&self, response: &HttpResponse) -> Result<BoxError, BoxError> {
        let error: E = self.options.decode(response.body())?;
        Ok(Box::new(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use relay_core::ErrorKind;
    use std::collections::HashMap;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    #[serde(rename_all = "PascalCase")]
    struct CreateQueue {
        queue_name: String,
        delay_seconds: u32,
    }

    #[derive(Serialize)]
    #[serde(rename_all = "PascalCase")]
    struct CreateQueueQuery {
        attribute_names: Vec<String>,
    }

    struct CreateQueueInput {
        body: CreateQueue,
        query: CreateQueueQuery,
    }

    impl HttpRequestInput for CreateQueueInput {
        type Body = CreateQueue;
        type Query = CreateQueueQuery;

        fn body(&self) -> Option<&CreateQueue> {
            Some(&self.body)
        }

        fn query(&self) -> Option<&CreateQueueQuery> {
            Some(&self.query)
        }
    }

    fn input() -> CreateQueueInput {
        CreateQueueInput {
            body: CreateQueue {
                queue_name: "jobs".to_string(),
                delay_seconds: 5,
            },
            query: CreateQueueQuery {
                attribute_names: vec!["All".to_string(), "Policy".to_string()],
            },
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "PascalCase")]
    struct ListQueuesResult {
        #[serde(default)]
        queue_url: Vec<String>,
        #[serde(default)]
        tags: HashMap<String, String>,
    }

    #[derive(Debug, Deserialize, thiserror::Error)]
    #[error("{code}")]
    #[serde(rename_all = "PascalCase")]
    struct ServiceFault {
        code: String,
    }

    fn aws_query_options() -> XmlOptions {
        XmlOptions::default()
            .with_list_decoding(ListDecodingStrategy::CollapseListUsingItemTag(
                "member".to_string(),
            ))
            .with_map_decoding(MapDecodingStrategy::SeparateEntriesWith {
                key_tag: "key".to_string(),
                value_tag: "value".to_string(),
            })
            .with_query_list_strategy(ListEncodingStrategy::ExpandListWithIndexAndItemTag(
                "member".to_string(),
            ))
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name::<CreateQueue>(), "CreateQueue");
        assert_eq!(short_type_name::<Vec<String>>(), "Vec");
        assert_eq!(short_type_name::<u32>(), "u32");
    }

    #[test]
    fn test_inward_uses_type_name_as_root() {
        let ctx = InvocationContext::new();
        let transform = XmlInwardTransform::new("/queues", &XmlOptions::default());

        let request = transform.transform(input(), &ctx).unwrap();

        assert_eq!(
            std::str::from_utf8(request.body()).unwrap(),
            "<CreateQueue><QueueName>jobs</QueueName><DelaySeconds>5</DelaySeconds></CreateQueue>"
        );
        assert_eq!(
            request.query_string(),
            "AttributeNames.1=All&AttributeNames.2=Policy"
        );
    }

    #[test]
    fn test_inward_root_override_and_query_strategies() {
        let ctx = InvocationContext::new();
        let options = aws_query_options().with_root_key("CreateQueueRequest");
        let transform = XmlInwardTransform::new("/queues", &options);

        let request = transform.transform(input(), &ctx).unwrap();

        assert!(std::str::from_utf8(request.body())
            .unwrap()
            .starts_with("<CreateQueueRequest>"));
        assert_eq!(
            request.query_string(),
            "AttributeNames.member.1=All&AttributeNames.member.2=Policy"
        );
    }

    #[test]
    fn test_outward_with_wrapped_lists_and_maps() {
        let ctx = InvocationContext::new();
        let body = "<ListQueuesResult>\
            <QueueUrl><member>https://q/1</member><member>https://q/2</member></QueueUrl>\
            <Tags><entry><key>env</key><value>prod</value></entry></Tags>\
            </ListQueuesResult>";

        let output = XmlOutwardTransform::<ListQueuesResult>::new(&aws_query_options())
            .transform(HttpResponse::new(StatusCode::OK, body), &ctx)
            .unwrap();

        assert_eq!(output.queue_url, vec!["https://q/1", "https://q/2"]);
        assert_eq!(output.tags.get("env").map(String::as_str), Some("prod"));
    }

    #[test]
    fn test_outward_empty_list() {
        let ctx = InvocationContext::new();
        let body = "<ListQueuesResult><QueueUrl/></ListQueuesResult>";

        let output = XmlOutwardTransform::<ListQueuesResult>::new(&aws_query_options())
            .transform(HttpResponse::new(StatusCode::OK, body), &ctx)
            .unwrap();

        assert!(output.queue_url.is_empty());
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct QueueDetails {
        description: String,
        #[serde(default)]
        tags: Vec<String>,
        #[serde(default)]
        aliases: Vec<String>,
    }

    #[test]
    fn test_outward_empty_scalar_next_to_collapsed_list() {
        let ctx = InvocationContext::new();
        let body = "<R><Description></Description><Tags><member>a</member></Tags><Aliases/></R>";

        let output = XmlOutwardTransform::<QueueDetails>::new(&aws_query_options())
            .transform(HttpResponse::new(StatusCode::OK, body), &ctx)
            .unwrap();

        assert_eq!(output.description, "");
        assert_eq!(output.tags, vec!["a"]);
        assert!(output.aliases.is_empty());
    }

    #[test]
    fn test_outward_missing_field_still_fails() {
        let ctx = InvocationContext::new();
        let body = "<R><Tags><member>a</member></Tags></R>";

        let err = XmlOutwardTransform::<QueueDetails>::new(&aws_query_options())
            .transform(HttpResponse::new(StatusCode::OK, body), &ctx)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Decoding);
    }

    #[test]
    fn test_outward_empty_body() {
        let ctx = InvocationContext::new();
        let output = XmlOutwardTransform::<ListQueuesResult>::new(&XmlOptions::default())
            .transform(HttpResponse::new(StatusCode::OK, ""), &ctx)
            .unwrap();
        assert!(output.queue_url.is_empty());
    }

    #[test]
    fn test_outward_failure_is_decoding() {
        let ctx = InvocationContext::new();
        let err = XmlOutwardTransform::<CreateQueue>::new(&XmlOptions::default())
            .transform(HttpResponse::new(StatusCode::OK, "<CreateQueue><QueueName>x"), &ctx)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decoding);
    }

    #[test]
    fn test_error_decoder() {
        let decoder = XmlErrorDecoder::<ServiceFault>::new(&XmlOptions::default());
        let response = HttpResponse::new(
            StatusCode::BAD_REQUEST,
            "<ErrorResponse><Code>QueueAlreadyExists</Code></ErrorResponse>",
        );

        let payload = decoder.decode(&response).unwrap();
        assert_eq!(
            payload.downcast_ref::<ServiceFault>().map(|e| e.code.as_str()),
            Some("QueueAlreadyExists")
        );
    }
}
