//! The transform stack.
//!
//! A [`TransformStack`] wraps a request transform and a response transform
//! around the fixed infrastructure stages and the caller's outer and inner
//! middleware, then runs the composed chain against a transport:
//!
//! ```text
//! outer → request transform → inner → host → port → method → signer
//!       → content headers → standard headers → error translation → transport
//!
//! outer ← response transform ←──────────────────────────────────── response
//! ```
//!
//! The order of the fixed stages is the same for every combination of
//! caller middleware. Caller middleware can only be placed at the two
//! boundaries.

use crate::middleware::{Middleware, Next};
use crate::sigv4::SignedHeaders;
use crate::stages::standard_headers::DEFAULT_USER_AGENT;
use crate::stages::{
    ContentHeadersMiddleware, ErrorDecoder, ErrorTranslationMiddleware, HostMiddleware,
    MethodMiddleware, PortMiddleware, SigningMiddleware, StandardHeadersMiddleware,
};
use crate::transform::Transform;
use crate::transport::HttpTransport;
use http::Method;
use relay_core::{
    ClientError, ClientResult, CredentialsProvider, EndpointOverride, HttpRequestBuilder,
    HttpResponse, InvocationContext, Region, Scheme,
};
use std::sync::Arc;
use tracing::{debug, field, Instrument};

/// A raw-HTTP middleware step.
pub type HttpMiddleware = dyn Middleware<HttpRequestBuilder, HttpResponse>;

/// Immutable per-client configuration of the stack.
#[derive(Clone)]
pub struct StackConfig {
    /// Source of signing credentials.
    pub credentials_provider: Arc<dyn CredentialsProvider>,
    /// Signing region.
    pub region: Region,
    /// Signing service name.
    pub service: String,
    /// Logical operation name, used in logs when the context has none.
    pub operation: Option<String>,
    /// Value of the `x-amz-target` header.
    pub target: Option<String>,
    /// Whether requests are signed with SigV4.
    pub v4_sign_request: bool,
    /// Whether every header is signed, rather than the minimal set.
    pub sign_all_headers: bool,
    /// Endpoint host.
    pub host: String,
    /// Endpoint port; `None` selects the scheme default.
    pub port: Option<u16>,
    /// Endpoint scheme.
    pub scheme: Scheme,
    /// `content-type` of request bodies.
    pub content_type: String,
    /// Whether empty bodies still get content headers.
    pub content_headers_for_zero_length_body: bool,
    /// `user-agent` header value.
    pub user_agent: String,
}

impl StackConfig {
    /// Creates a configuration with V4 signing over HTTPS and JSON bodies.
    #[must_use]
    pub fn new(
        credentials_provider: Arc<dyn CredentialsProvider>,
        region: Region,
        service: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            credentials_provider,
            region,
            service: service.into(),
            operation: None,
            target: None,
            v4_sign_request: true,
            sign_all_headers: false,
            host: host.into(),
            port: None,
            scheme: Scheme::Https,
            content_type: "application/json".to_string(),
            content_headers_for_zero_length_body: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Sets the port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the scheme.
    #[must_use]
    pub const fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Sets the operation name.
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Sets the `x-amz-target` value.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Enables or disables V4 signing.
    #[must_use]
    pub const fn with_v4_signing(mut self, enabled: bool) -> Self {
        self.v4_sign_request = enabled;
        self
    }

    /// Signs every header instead of the minimal set.
    #[must_use]
    pub const fn with_sign_all_headers(mut self, enabled: bool) -> Self {
        self.sign_all_headers = enabled;
        self
    }

    /// Sets the request `content-type`.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Attaches content headers to empty bodies as well.
    #[must_use]
    pub const fn with_content_headers_for_zero_length_body(mut self, enabled: bool) -> Self {
        self.content_headers_for_zero_length_body = enabled;
        self
    }

    /// Sets the `user-agent`.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

impl std::fmt::Debug for StackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StackConfig")
            .field("region", &self.region)
            .field("service", &self.service)
            .field("operation", &self.operation)
            .field("target", &self.target)
            .field("v4_sign_request", &self.v4_sign_request)
            .field("sign_all_headers", &self.sign_all_headers)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("scheme", &self.scheme)
            .field("content_type", &self.content_type)
            .field(
                "content_headers_for_zero_length_body",
                &self.content_headers_for_zero_length_body,
            )
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

/// The endpoint one invocation is sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    /// URL scheme.
    pub scheme: Scheme,
    /// Host name.
    pub host: String,
    /// Port; `None` selects the scheme default.
    pub port: Option<u16>,
}

/// Fixed infrastructure stage marker.
///
/// The discriminants give the order in which the stages run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Stage {
    /// Stage 1: scheme and host
    Host = 1,
    /// Stage 2: port
    Port = 2,
    /// Stage 3: HTTP method
    Method = 3,
    /// Stage 4: target header and SigV4 signature
    Signing = 4,
    /// Stage 5: `content-type` / `content-length`
    ContentHeaders = 5,
    /// Stage 6: `user-agent` / `accept`
    StandardHeaders = 6,
    /// Stage 7: non-2xx response to service error
    ErrorTranslation = 7,
}

impl Stage {
    /// Returns the stage name, which is also the middleware's `name()`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Port => "port",
            Self::Method => "method",
            Self::Signing => "signer",
            Self::ContentHeaders => "content_headers",
            Self::StandardHeaders => "standard_headers",
            Self::ErrorTranslation => "error_translation",
        }
    }

    /// Returns all stages in order.
    #[must_use]
    pub const fn all() -> [Stage; 7] {
        [
            Self::Host,
            Self::Port,
            Self::Method,
            Self::Signing,
            Self::ContentHeaders,
            Self::StandardHeaders,
            Self::ErrorTranslation,
        ]
    }
}

/// The per-call pieces of one invocation.
///
/// Every slot is required; callers without outer or inner middleware pass
/// [`NoOpMiddleware`](crate::NoOpMiddleware).
pub struct Invocation<'s, I, O> {
    /// HTTP method of the operation.
    pub method: Method,
    /// Per-call endpoint override.
    pub endpoint_override: Option<&'s EndpointOverride>,
    /// Typed input to `HttpRequestBuilder`.
    pub request_transform: &'s dyn Transform<I, HttpRequestBuilder>,
    /// `HttpResponse` to typed output.
    pub response_transform: &'s dyn Transform<HttpResponse, O>,
    /// Caller middleware around the whole invocation.
    pub outer: &'s dyn Middleware<I, O>,
    /// Caller middleware in front of the fixed stages.
    pub inner: &'s HttpMiddleware,
    /// Transport that sends the final request.
    pub transport: &'s dyn HttpTransport,
}

/// Composes and runs the middleware chain for one client.
///
/// # Example
///
/// ```
/// use relay_core::{Credentials, Region, StaticCredentialsProvider};
/// use relay_middleware::{Stage, StackConfig, TransformStack};
/// use std::sync::Arc;
///
/// # struct NoDecoder;
/// # impl relay_middleware::ErrorDecoder for NoDecoder {
/// #     fn decode(&self, _: &relay_core::HttpResponse)
/// #         -> Result<relay_core::BoxError, relay_core::BoxError> { Err("none".into()) }
/// # }
/// let provider = Arc::new(StaticCredentialsProvider::new(Credentials::new("AKID", "secret")));
/// let config = StackConfig::new(provider, Region::US_EAST_1, "ExampleSvc", "example.amazonaws.com");
/// let stack = TransformStack::new(config, Arc::new(NoDecoder));
///
/// let names: Vec<_> = Stage::all().iter().map(|s| s.name()).collect();
/// assert_eq!(stack.stage_names(None, &http::Method::GET), names);
/// ```
#[derive(Clone)]
pub struct TransformStack {
    config: Arc<StackConfig>,
    error_decoder: Arc<dyn ErrorDecoder>,
}

impl TransformStack {
    /// Creates a stack for `config`, decoding error bodies with `error_decoder`.
    #[must_use]
    pub fn new(config: StackConfig, error_decoder: Arc<dyn ErrorDecoder>) -> Self {
        Self {
            config: Arc::new(config),
            error_decoder,
        }
    }

    /// Returns the client configuration.
    #[must_use]
    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    /// Resolves the endpoint for one call.
    ///
    /// Host, port and scheme are resolved independently: each part of the
    /// override wins over the configured value when present.
    #[must_use]
    pub fn resolve_endpoint(&self, endpoint_override: Option<&EndpointOverride>) -> ResolvedEndpoint {
        let config = &self.config;
        let Some(over) = endpoint_override else {
            return ResolvedEndpoint {
                scheme: config.scheme,
                host: config.host.clone(),
                port: config.port,
            };
        };

        ResolvedEndpoint {
            scheme: over.scheme().unwrap_or(config.scheme),
            host: over.host_name().unwrap_or(&config.host).to_string(),
            port: over.port().or(config.port),
        }
    }

    /// Builds the fixed stages for one call, in execution order.
    pub fn build_stages(&self, endpoint: &ResolvedEndpoint, method: &Method) -> Vec<Box<HttpMiddleware>> {
        let config = &self.config;
        let signed_headers = if config.sign_all_headers {
            SignedHeaders::All
        } else {
            SignedHeaders::Minimal
        };

        let mut stages: Vec<Box<HttpMiddleware>> = Vec::with_capacity(Stage::all().len());
        stages.push(Box::new(HostMiddleware::new(endpoint.host.as_str(), endpoint.scheme)));
        stages.push(Box::new(PortMiddleware::new(endpoint.port)));
        stages.push(Box::new(MethodMiddleware::new(method.clone())));
        stages.push(Box::new(
            SigningMiddleware::new(
                config.credentials_provider.clone(),
                config.region.clone(),
                config.service.as_str(),
            )
            .with_target(config.target.clone())
            .with_v4_signing(config.v4_sign_request)
            .with_signed_headers(signed_headers),
        ));
        stages.push(Box::new(ContentHeadersMiddleware::new(
            config.content_type.as_str(),
            config.content_headers_for_zero_length_body,
        )));
        stages.push(Box::new(StandardHeadersMiddleware::new(
            config.user_agent.as_str(),
        )));
        stages.push(Box::new(ErrorTranslationMiddleware::new(
            self.error_decoder.clone(),
        )));
        stages
    }

    /// Returns the names of the fixed stages a call would run.
    #[must_use]
    pub fn stage_names(
        &self,
        endpoint_override: Option<&EndpointOverride>,
        method: &Method,
    ) -> Vec<&'static str> {
        let endpoint = self.resolve_endpoint(endpoint_override);
        self.build_stages(&endpoint, method)
            .iter()
            .map(|stage| stage.name())
            .collect()
    }

    /// Runs one invocation.
    ///
    /// Any failure short-circuits every step downstream of it and is returned
    /// unchanged, apart from non-2xx responses which the error-translation
    /// stage turns into [`ClientError::Service`].
    pub async fn execute<I, O>(
        &self,
        input: I,
        ctx: &InvocationContext,
        invocation: Invocation<'_, I, O>,
    ) -> ClientResult<O>
    where
        I: Send,
        O: Send,
    {
        let Invocation {
            method,
            endpoint_override,
            request_transform,
            response_transform,
            outer,
            inner,
            transport,
        } = invocation;

        let endpoint = self.resolve_endpoint(endpoint_override);
        let stages = self.build_stages(&endpoint, &method);
        let operation = ctx
            .operation()
            .or(self.config.operation.as_deref())
            .unwrap_or("");

        let span = tracing::info_span!(
            "relay.invocation",
            request_id = %ctx.request_id(),
            service = %self.config.service,
            operation = %operation,
            http.method = %method,
            http.path = field::Empty,
            http.host = %endpoint.host,
        );

        let stages = stages.as_slice();
        let terminal = Next::<'_, I, O>::terminal(move |input, ctx| {
            Box::pin(async move {
                let request = request_transform.transform(input, ctx)?;
                tracing::Span::current().record("http.path", request.path());
                debug!(transform = request_transform.name(), "Request encoded");

                let response = inner_chain(stages, inner, transport)
                    .run(request, ctx)
                    .await?;

                let output = response_transform.transform(response, ctx)?;
                debug!(transform = response_transform.name(), "Response decoded");
                Ok(output)
            })
        });

        let result = Next::new(outer, terminal)
            .run(input, ctx)
            .instrument(span.clone())
            .await;

        span.in_scope(|| match &result {
            Ok(_) => debug!(elapsed_ms = elapsed_ms(ctx), "Invocation completed"),
            Err(err) => debug!(
                elapsed_ms = elapsed_ms(ctx),
                error.kind = %err.kind(),
                error = %err,
                "Invocation failed"
            ),
        });
        result
    }
}

impl std::fmt::Debug for TransformStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformStack")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Links the caller's inner middleware, the fixed stages and the transport.
fn inner_chain<'a>(
    stages: &'a [Box<HttpMiddleware>],
    inner: &'a HttpMiddleware,
    transport: &'a dyn HttpTransport,
) -> Next<'a, HttpRequestBuilder, HttpResponse> {
    let mut next = Next::<'a, HttpRequestBuilder, HttpResponse>::terminal(move |request, ctx| {
        Box::pin(async move {
            tokio::select! {
                biased;
                () = ctx.cancelled() => Err(ClientError::Cancelled),
                result = transport.execute(request, ctx) => result,
            }
        })
    });

    for stage in stages.iter().rev() {
        next = Next::new(stage.as_ref(), next);
    }
    Next::new(inner, next)
}

#[allow(clippy::cast_possible_truncation)]
fn elapsed_ms(ctx: &InvocationContext) -> u64 {
    ctx.elapsed().as_millis() as u64
}
