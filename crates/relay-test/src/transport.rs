//! Scripted transport.

use async_trait::async_trait;
use parking_lot::Mutex;
use relay_core::{ClientError, ClientResult, HttpRequestBuilder, HttpResponse, InvocationContext};
use relay_middleware::HttpTransport;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

type Responder = Box<dyn Fn(&HttpRequestBuilder) -> ClientResult<HttpResponse> + Send + Sync>;

/// An [`HttpTransport`] that answers from a script.
///
/// Queued outcomes are used first, in order. Once the queue is empty the
/// responder closure answers, if one is set; otherwise the call fails with
/// [`ClientError::Connection`]. Every request is recorded either way.
///
/// # Example
///
/// ```
/// use http::StatusCode;
/// use relay_core::HttpResponse;
/// use relay_test::MockTransport;
///
/// let transport = MockTransport::responding(|request| {
///     Ok(HttpResponse::new(StatusCode::OK, request.path().to_string()))
/// });
/// assert!(transport.requests().is_empty());
/// ```
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<ClientResult<HttpResponse>>>,
    responder: Option<Responder>,
    delay: Option<Duration>,
    requests: Mutex<Vec<HttpRequestBuilder>>,
    calls: AtomicUsize,
}

impl MockTransport {
    /// Creates a transport with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport that answers every request with `responder`.
    #[must_use]
    pub fn responding<F>(responder: F) -> Self
    where
        F: Fn(&HttpRequestBuilder) -> ClientResult<HttpResponse> + Send + Sync + 'static,
    {
        Self {
            responder: Some(Box::new(responder)),
            ..Self::default()
        }
    }

    /// Queues a response.
    #[must_use]
    pub fn with_response(self, response: HttpResponse) -> Self {
        self.push_response(response);
        self
    }

    /// Queues a failure.
    #[must_use]
    pub fn with_error(self, error: ClientError) -> Self {
        self.script.lock().push_back(Err(error));
        self
    }

    /// Waits `delay` before answering. The wait ends early, with
    /// [`ClientError::Cancelled`], if the context is cancelled.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queues a response on a shared transport.
    pub fn push_response(&self, response: HttpResponse) {
        self.script.lock().push_back(Ok(response));
    }

    /// Returns every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequestBuilder> {
        self.requests.lock().clone()
    }

    /// Returns the most recent request.
    #[must_use]
    pub fn last_request(&self) -> Option<HttpRequestBuilder> {
        self.requests.lock().last().cloned()
    }

    /// Returns how many times `execute` was called.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn answer(&self, request: &HttpRequestBuilder) -> ClientResult<HttpResponse> {
        if let Some(outcome) = self.script.lock().pop_front() {
            return outcome;
        }
        match &self.responder {
            Some(responder) => responder(request),
            None => Err(ClientError::connection("mock transport has no scripted response")),
        }
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("queued", &self.script.lock().len())
            .field("has_responder", &self.responder.is_some())
            .field("delay", &self.delay)
            .field("calls", &self.call_count())
            .finish()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn execute(
        &self,
        request: HttpRequestBuilder,
        ctx: &InvocationContext,
    ) -> ClientResult<HttpResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::select! {
                biased;
                () = ctx.cancelled() => return Err(ClientError::Cancelled),
                () = tokio::time::sleep(delay) => {}
            }
        }

        self.answer(&request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use relay_core::ErrorKind;

    #[tokio::test]
    async fn test_queue_then_responder() {
        let transport = MockTransport::responding(|_| Ok(HttpResponse::new(StatusCode::ACCEPTED, "")))
            .with_response(HttpResponse::ok());
        let ctx = InvocationContext::new();

        let first = transport.execute(HttpRequestBuilder::new("/a"), &ctx).await.unwrap();
        let second = transport.execute(HttpRequestBuilder::new("/b"), &ctx).await.unwrap();

        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(second.status(), StatusCode::ACCEPTED);
        assert_eq!(transport.call_count(), 2);
        assert_eq!(transport.last_request().unwrap().path(), "/b");
    }

    #[tokio::test]
    async fn test_empty_script_fails() {
        let transport = MockTransport::new();
        let ctx = InvocationContext::new();

        let err = transport
            .execute(HttpRequestBuilder::new("/"), &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_scripted_error() {
        let transport = MockTransport::new().with_error(ClientError::connection("reset"));
        let ctx = InvocationContext::new();

        let err = transport
            .execute(HttpRequestBuilder::new("/"), &ctx)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("reset"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_cancelled() {
        let transport = MockTransport::new()
            .with_response(HttpResponse::ok())
            .with_delay(Duration::from_secs(60));
        let ctx = InvocationContext::new();
        let token = ctx.cancellation_token().clone();

        let call = transport.execute(HttpRequestBuilder::new("/"), &ctx);
        let cancel = async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            token.cancel();
        };
        let (result, ()) = tokio::join!(call, cancel);

        assert!(result.unwrap_err().is_cancelled());
    }
}
