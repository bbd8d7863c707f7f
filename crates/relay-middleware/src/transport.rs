//! The transport seam.

use async_trait::async_trait;
use relay_core::{ClientResult, HttpRequestBuilder, HttpResponse, InvocationContext};
use std::sync::Arc;

/// Sends a fully-built request and returns the raw response.
///
/// Implementations own connection pooling, TLS and timeouts. Failures to
/// deliver the request or read the response surface as
/// `ClientError::Connection`; non-2xx responses are returned as `Ok`.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Executes `request`.
    async fn execute(
        &self,
        request: HttpRequestBuilder,
        ctx: &InvocationContext,
    ) -> ClientResult<HttpResponse>;
}

#[async_trait]
impl<T> HttpTransport for Arc<T>
where
    T: HttpTransport + ?Sized,
{
    async fn execute(
        &self,
        request: HttpRequestBuilder,
        ctx: &InvocationContext,
    ) -> ClientResult<HttpResponse> {
        (**self).execute(request, ctx).await
    }
}
