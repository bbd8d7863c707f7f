//! Signing stage.
//!
//! Attaches the `x-amz-target` header when the operation has a target, then,
//! if V4 signing is enabled, fetches credentials and signs the request with
//! [`SigV4Signer`].
//!
//! Credential retrieval is a suspension point and is raced against the
//! invocation's cancellation token.

use crate::middleware::{BoxFuture, Middleware, Next};
use crate::sigv4::{SigV4Signer, SignedHeaders, X_AMZ_TARGET};
use chrono::{DateTime, Utc};
use relay_core::{
    ClientError, ClientResult, CredentialsProvider, HttpRequestBuilder, HttpResponse,
    InvocationContext, Region,
};
use std::sync::Arc;
use tracing::debug;

/// Source of the signing timestamp.
pub type Clock = fn() -> DateTime<Utc>;

/// Signs outgoing requests.
#[derive(Clone)]
pub struct SigningMiddleware {
    credentials_provider: Arc<dyn CredentialsProvider>,
    signer: SigV4Signer,
    target: Option<String>,
    v4_sign_request: bool,
    clock: Clock,
}

impl SigningMiddleware {
    /// Creates a signing stage for `region` and `service`.
    ///
    /// V4 signing is enabled and only the minimal header set is signed.
    #[must_use]
    pub fn new(
        credentials_provider: Arc<dyn CredentialsProvider>,
        region: Region,
        service: impl Into<String>,
    ) -> Self {
        Self {
            credentials_provider,
            signer: SigV4Signer::new(region, service, SignedHeaders::Minimal),
            target: None,
            v4_sign_request: true,
            clock: Utc::now,
        }
    }

    /// Sets the `x-amz-target` value.
    #[must_use]
    pub fn with_target(mut self, target: Option<String>) -> Self {
        self.target = target;
        self
    }

    /// Enables or disables V4 signing.
    ///
    /// When disabled the target header is still attached.
    #[must_use]
    pub const fn with_v4_signing(mut self, enabled: bool) -> Self {
        self.v4_sign_request = enabled;
        self
    }

    /// Chooses which headers are signed.
    #[must_use]
    pub fn with_signed_headers(mut self, signed_headers: SignedHeaders) -> Self {
        self.signer = self.signer.with_signed_headers(signed_headers);
        self
    }

    /// Overrides the clock used for the signing timestamp.
    #[must_use]
    pub const fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    async fn sign(
        &self,
        request: &mut HttpRequestBuilder,
        ctx: &InvocationContext,
    ) -> ClientResult<()> {
        if let Some(target) = &self.target {
            request.insert_header(X_AMZ_TARGET, target)?;
        }

        if !self.v4_sign_request {
            debug!(request_id = %ctx.request_id(), "V4 signing disabled, request left unsigned");
            return Ok(());
        }

        let credentials = tokio::select! {
            biased;
            () = ctx.cancelled() => return Err(ClientError::Cancelled),
            result = self.credentials_provider.credentials() => result?,
        };

        let signature = self.signer.sign(request, &credentials, (self.clock)())?;
        debug!(
            request_id = %ctx.request_id(),
            operation = ctx.operation().unwrap_or(""),
            signed_headers = %signature.signed_headers,
            "Request signed"
        );
        Ok(())
    }
}

impl std::fmt::Debug for SigningMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningMiddleware")
            .field("signer", &self.signer)
            .field("target", &self.target)
            .field("v4_sign_request", &self.v4_sign_request)
            .finish_non_exhaustive()
    }
}

impl Middleware<HttpRequestBuilder, HttpResponse> for SigningMiddleware {
    fn name(&self) -> &'static str {
        "signer"
    }

    fn handle<'a>(
        &'a self,
        mut request: HttpRequestBuilder,
        ctx: &'a InvocationContext,
        next: Next<'a, HttpRequestBuilder, HttpResponse>,
    ) -> BoxFuture<'a, ClientResult<HttpResponse>> {
        Box::pin(async move {
            self.sign(&mut request, ctx).await?;
            next.run(request, ctx).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::test_support::{capture, captured, Captured};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use http::Method;
    use relay_core::{Credentials, ErrorKind, StaticCredentialsProvider};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CredentialsProvider for CountingProvider {
        async fn credentials(&self) -> ClientResult<Credentials> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Credentials::new("AKID", "secret"))
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl CredentialsProvider for FailingProvider {
        async fn credentials(&self) -> ClientResult<Credentials> {
            Err(ClientError::signing("no credentials configured"))
        }
    }

    struct PendingProvider;

    #[async_trait]
    impl CredentialsProvider for PendingProvider {
        async fn credentials(&self) -> ClientResult<Credentials> {
            std::future::pending().await
        }
    }

    fn fixed_clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()
    }

    fn request() -> HttpRequestBuilder {
        let mut request = HttpRequestBuilder::new("/items");
        request.set_method(Method::POST);
        request.set_host("example.amazonaws.com");
        request.set_port(443);
        request
    }

    fn static_provider() -> Arc<dyn CredentialsProvider> {
        Arc::new(StaticCredentialsProvider::new(Credentials::new("AKID", "secret")))
    }

    #[tokio::test]
    async fn test_signs_request() {
        let stage = SigningMiddleware::new(static_provider(), Region::US_EAST_1, "ExampleSvc")
            .with_clock(fixed_clock);
        let ctx = InvocationContext::new();
        let slot = Captured::default();

        stage
            .handle(request(), &ctx, capture(slot.clone(), HttpResponse::ok()))
            .await
            .unwrap();

        let signed = captured(&slot);
        let authorization = signed.header("authorization").unwrap();
        assert!(authorization
            .starts_with("AWS4-HMAC-SHA256 Credential=AKID/20240115/us-east-1/ExampleSvc/aws4_request"));
        assert_eq!(signed.header("x-amz-date"), Some("20240115T100000Z"));
    }

    #[tokio::test]
    async fn test_target_header() {
        let stage = SigningMiddleware::new(static_provider(), Region::US_EAST_1, "ExampleSvc")
            .with_target(Some("ExampleSvc_20240101.PutItem".to_string()))
            .with_clock(fixed_clock);
        let ctx = InvocationContext::new();
        let slot = Captured::default();

        stage
            .handle(request(), &ctx, capture(slot.clone(), HttpResponse::ok()))
            .await
            .unwrap();

        let signed = captured(&slot);
        assert_eq!(signed.header("x-amz-target"), Some("ExampleSvc_20240101.PutItem"));
        assert!(signed
            .header("authorization")
            .unwrap()
            .contains("SignedHeaders=host;x-amz-date;x-amz-target"));
    }

    #[tokio::test]
    async fn test_unsigned_mode_keeps_target_and_skips_credentials() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
        });
        let stage = SigningMiddleware::new(provider.clone(), Region::US_EAST_1, "ExampleSvc")
            .with_target(Some("Svc.Op".to_string()))
            .with_v4_signing(false);
        let ctx = InvocationContext::new();
        let slot = Captured::default();

        stage
            .handle(request(), &ctx, capture(slot.clone(), HttpResponse::ok()))
            .await
            .unwrap();

        let unsigned = captured(&slot);
        assert_eq!(unsigned.header("x-amz-target"), Some("Svc.Op"));
        assert!(unsigned.header("authorization").is_none());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_sign_all_headers() {
        let stage = SigningMiddleware::new(static_provider(), Region::US_EAST_1, "ExampleSvc")
            .with_signed_headers(SignedHeaders::All)
            .with_clock(fixed_clock);
        let ctx = InvocationContext::new();
        let slot = Captured::default();
        let mut input = request();
        input.insert_header("x-tenant", "acme").unwrap();

        stage
            .handle(input, &ctx, capture(slot.clone(), HttpResponse::ok()))
            .await
            .unwrap();

        assert!(captured(&slot)
            .header("authorization")
            .unwrap()
            .contains("SignedHeaders=host;x-amz-date;x-tenant"));
    }

    #[tokio::test]
    async fn test_credentials_failure_stops_chain() {
        let stage = SigningMiddleware::new(Arc::new(FailingProvider), Region::US_EAST_1, "Svc");
        let ctx = InvocationContext::new();
        let slot = Captured::default();

        let err = stage
            .handle(request(), &ctx, capture(slot.clone(), HttpResponse::ok()))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Signing);
        assert!(slot.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cancellation_while_fetching_credentials() {
        let stage = SigningMiddleware::new(Arc::new(PendingProvider), Region::US_EAST_1, "Svc");
        let ctx = InvocationContext::new();
        let slot = Captured::default();
        let token = ctx.cancellation_token().clone();

        tokio::spawn(async move {
            tokio::task::yield_now().await;
            token.cancel();
        });

        let err = stage
            .handle(request(), &ctx, capture(slot.clone(), HttpResponse::ok()))
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(slot.lock().unwrap().is_none());
    }
}
