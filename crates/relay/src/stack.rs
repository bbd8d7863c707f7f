//! Format-specific client stacks.

use crate::format::{ServiceErrorPayload, WireFormat};
use crate::operation::Operation;
use http::Method;
use relay_config::ClientConfig;
use relay_core::{ClientResult, CredentialsProvider, HttpRequestInput};
use relay_middleware::{HttpTransport, StackConfig, TransformStack};
use relay_transform::{JsonOptions, XmlOptions};
use relay_transport::ReqwestTransport;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// A client stack for one wire format `F` and one service error type `E`.
///
/// Holds the immutable [`TransformStack`], the format options and the
/// transport. Cloning is cheap and clones share all three.
pub struct HttpStack<F, E> {
    stack: TransformStack,
    format: F,
    transport: Arc<dyn HttpTransport>,
    _error: PhantomData<fn() -> E>,
}

/// A stack with JSON bodies whose error responses decode into `E`.
///
/// # Example
///
/// ```no_run
/// use http::Method;
/// use relay::prelude::*;
/// use serde::{Deserialize, Serialize};
/// use std::sync::Arc;
///
/// #[derive(Serialize)]
/// struct PutItem {
///     id: String,
/// }
///
/// impl HttpRequestInput for PutItem {
///     type Body = Self;
///     type Query = ();
///
///     fn body(&self) -> Option<&Self> {
///         Some(self)
///     }
/// }
///
/// #[derive(Deserialize)]
/// struct PutItemOutput {
///     status: String,
/// }
///
/// #[derive(Debug, Deserialize, thiserror::Error)]
/// #[error("{message}")]
/// struct ExampleSvcError {
///     message: String,
/// }
///
/// # async fn run() -> Result<(), ClientError> {
/// let config = ClientConfig::new("example.amazonaws.com", "us-east-1", "ExampleSvc");
/// let credentials = Arc::new(EnvironmentCredentialsProvider);
/// let stack = JsonHttpStack::<ExampleSvcError>::with_reqwest(&config, credentials)?;
///
/// let ctx = InvocationContext::new();
/// let output: PutItemOutput = stack
///     .operation(PutItem { id: "abc".to_string() }, Method::POST, "/items")
///     .execute(&ctx)
///     .await?;
/// assert_eq!(output.status, "ok");
/// # Ok(())
/// # }
/// ```
pub type JsonHttpStack<E> = HttpStack<JsonOptions, E>;

/// A stack with XML bodies whose error responses decode into `E`.
pub type XmlHttpStack<E> = HttpStack<XmlOptions, E>;

impl<F: WireFormat, E: ServiceErrorPayload> HttpStack<F, E> {
    /// Creates a stack from its parts.
    #[must_use]
    pub fn new(config: StackConfig, format: F, transport: Arc<dyn HttpTransport>) -> Self {
        let decoder = format.error_decoder::<E>();
        Self {
            stack: TransformStack::new(config, decoder),
            format,
            transport,
            _error: PhantomData,
        }
    }

    /// Creates a stack from a loaded client configuration.
    #[must_use]
    pub fn from_config(
        config: &ClientConfig,
        credentials: Arc<dyn CredentialsProvider>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        debug!(
            format = F::NAME,
            service = %config.signing.service,
            host = %config.endpoint.host,
            "Creating client stack"
        );
        Self::new(
            config.stack_config(credentials),
            F::from_config(config),
            transport,
        )
    }

    /// Creates a stack that sends requests with a [`ReqwestTransport`] built
    /// from the configuration's `transport` section.
    pub fn with_reqwest(
        config: &ClientConfig,
        credentials: Arc<dyn CredentialsProvider>,
    ) -> ClientResult<Self> {
        let transport = ReqwestTransport::with_options(&config.transport)?;
        Ok(Self::from_config(config, credentials, Arc::new(transport)))
    }

    /// Starts one call of `method` to the path template `path`.
    ///
    /// The output type `O` is fixed by [`Operation::execute`], or is `()`
    /// for [`Operation::execute_void`].
    pub fn operation<I, O>(
        &self,
        input: I,
        method: Method,
        path: impl Into<String>,
    ) -> Operation<'_, F, I, O>
    where
        I: HttpRequestInput,
    {
        Operation::new(
            &self.stack,
            &self.format,
            self.transport.as_ref(),
            input,
            method,
            path.into(),
        )
    }

    /// Returns the underlying transform stack.
    #[must_use]
    pub fn transform_stack(&self) -> &TransformStack {
        &self.stack
    }

    /// Returns the format options.
    #[must_use]
    pub fn options(&self) -> &F {
        &self.format
    }
}

impl<F: Clone, E> Clone for HttpStack<F, E> {
    fn clone(&self) -> Self {
        Self {
            stack: self.stack.clone(),
            format: self.format.clone(),
            transport: Arc::clone(&self.transport),
            _error: PhantomData,
        }
    }
}

impl<F: std::fmt::Debug, E> std::fmt::Debug for HttpStack<F, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpStack")
            .field("stack", &self.stack)
            .field("format", &self.format)
            .field("error", &std::any::type_name::<E>())
            .finish_non_exhaustive()
    }
}
