//! One call through a stack.

use crate::format::WireFormat;
use http::Method;
use relay_core::{
    ClientResult, EndpointOverride, HttpRequestBuilder, HttpRequestInput, HttpResponse,
    InvocationContext,
};
use relay_middleware::{
    HttpMiddleware, HttpTransport, Invocation, Middleware, NoOpMiddleware, Transform,
    TransformStack,
};
use relay_transform::VoidOutwardTransform;
use serde::de::DeserializeOwned;

/// Builder for a single call.
///
/// Created by [`HttpStack::operation`](crate::HttpStack::operation). The
/// optional slots default to the no-op middleware and to the client's
/// configured endpoint.
#[must_use = "an operation does nothing until it is executed"]
pub struct Operation<'s, F, I, O> {
    stack: &'s TransformStack,
    format: &'s F,
    transport: &'s dyn HttpTransport,
    input: I,
    method: Method,
    path: String,
    outer: Option<&'s dyn Middleware<I, O>>,
    inner: Option<&'s HttpMiddleware>,
    endpoint_override: Option<EndpointOverride>,
}

impl<'s, F, I, O> Operation<'s, F, I, O> {
    pub(crate) fn new(
        stack: &'s TransformStack,
        format: &'s F,
        transport: &'s dyn HttpTransport,
        input: I,
        method: Method,
        path: String,
    ) -> Self {
        Self {
            stack,
            format,
            transport,
            input,
            method,
            path,
            outer: None,
            inner: None,
            endpoint_override: None,
        }
    }

    /// Wraps the whole call, seeing the typed input and output.
    pub fn with_outer(mut self, outer: &'s dyn Middleware<I, O>) -> Self {
        self.outer = Some(outer);
        self
    }

    /// Runs in front of the fixed stages, seeing the raw request and response.
    pub fn with_inner(mut self, inner: &'s HttpMiddleware) -> Self {
        self.inner = Some(inner);
        self
    }

    /// Sends this call to `endpoint` instead of the configured endpoint.
    pub fn with_endpoint_override(mut self, endpoint: EndpointOverride) -> Self {
        self.endpoint_override = Some(endpoint);
        self
    }
}

impl<F: WireFormat, I: HttpRequestInput, O: Send> Operation<'_, F, I, O> {
    async fn run(
        self,
        ctx: &InvocationContext,
        response_transform: &dyn Transform<HttpResponse, O>,
    ) -> ClientResult<O> {
        let request_transform: Box<dyn Transform<I, HttpRequestBuilder>> =
            self.format.request_transform(&self.path);

        let invocation = Invocation {
            method: self.method,
            endpoint_override: self.endpoint_override.as_ref(),
            request_transform: request_transform.as_ref(),
            response_transform,
            outer: self.outer.unwrap_or(&NoOpMiddleware),
            inner: self.inner.unwrap_or(&NoOpMiddleware),
            transport: self.transport,
        };

        self.stack.execute(self.input, ctx, invocation).await
    }
}

impl<F, I, O> Operation<'_, F, I, O>
where
    F: WireFormat,
    I: HttpRequestInput,
    O: DeserializeOwned + Send + 'static,
{
    /// Executes the call and decodes the response body into `O`.
    ///
    /// # Errors
    ///
    /// Returns the first failure of any step. A non-2xx response becomes
    /// [`ClientError::Service`](relay_core::ClientError::Service), carrying
    /// the decoded `E` when the body matches it.
    pub async fn execute(self, ctx: &InvocationContext) -> ClientResult<O> {
        let response_transform = self.format.response_transform::<O>();
        self.run(ctx, response_transform.as_ref()).await
    }
}

impl<F, I> Operation<'_, F, I, ()>
where
    F: WireFormat,
    I: HttpRequestInput,
{
    /// Executes the call without reading the response body.
    ///
    /// # Errors
    ///
    /// Same as [`execute`](Self::execute), apart from body decoding, which
    /// never happens.
    pub async fn execute_void(self, ctx: &InvocationContext) -> ClientResult<()> {
        self.run(ctx, &VoidOutwardTransform).await
    }
}

impl<F, I, O> std::fmt::Debug for Operation<'_, F, I, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("has_outer", &self.outer.is_some())
            .field("has_inner", &self.inner.is_some())
            .field("endpoint_override", &self.endpoint_override)
            .finish_non_exhaustive()
    }
}
