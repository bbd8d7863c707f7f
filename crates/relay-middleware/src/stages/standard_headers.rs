//! Standard headers stage.

use crate::middleware::{BoxFuture, Middleware, Next};
use http::header::{ACCEPT, USER_AGENT};
use relay_core::{ClientResult, HttpRequestBuilder, HttpResponse, InvocationContext};

/// The `user-agent` sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("relay/", env!("CARGO_PKG_VERSION"));

/// Attaches `user-agent` and `accept` unless already present.
#[derive(Debug, Clone)]
pub struct StandardHeadersMiddleware {
    user_agent: String,
    accept: String,
}

impl StandardHeadersMiddleware {
    /// Creates the stage with the given user agent and `accept: */*`.
    #[must_use]
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            accept: "*/*".to_string(),
        }
    }

    /// Sets the `accept` value.
    #[must_use]
    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = accept.into();
        self
    }
}

impl Default for StandardHeadersMiddleware {
    fn default() -> Self {
        Self::new(DEFAULT_USER_AGENT)
    }
}

impl Middleware<HttpRequestBuilder, HttpResponse> for StandardHeadersMiddleware {
    fn name(&self) -> &'static str {
        "standard_headers"
    }

    fn handle<'a>(
        &'a self,
        mut request: HttpRequestBuilder,
        ctx: &'a InvocationContext,
        next: Next<'a, HttpRequestBuilder, HttpResponse>,
    ) -> BoxFuture<'a, ClientResult<HttpResponse>> {
        Box::pin(async move {
            if !request.headers().contains_key(USER_AGENT) {
                request.insert_header(USER_AGENT.as_str(), &self.user_agent)?;
            }
            if !request.headers().contains_key(ACCEPT) {
                request.insert_header(ACCEPT.as_str(), &self.accept)?;
            }
            next.run(request, ctx).await
        })
    }
}
