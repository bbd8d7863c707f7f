//! Host stage.
//!
//! Sets the request's scheme and host name from the resolved endpoint.

use crate::middleware::{BoxFuture, Middleware, Next};
use relay_core::{ClientResult, HttpRequestBuilder, HttpResponse, InvocationContext, Scheme};

/// Sets scheme and host on the outgoing request.
#[derive(Debug, Clone)]
pub struct HostMiddleware {
    host: String,
    scheme: Scheme,
}

impl HostMiddleware {
    /// Creates the stage for the given endpoint.
    #[must_use]
    pub fn new(host: impl Into<String>, scheme: Scheme) -> Self {
        Self {
            host: host.into(),
            scheme,
        }
    }
}

impl Middleware<HttpRequestBuilder, HttpResponse> for HostMiddleware {
    fn name(&self) -> &'static str {
        "host"
    }

    fn handle<'a>(
        &'a self,
        mut request: HttpRequestBuilder,
        ctx: &'a InvocationContext,
        next: Next<'a, HttpRequestBuilder, HttpResponse>,
    ) -> BoxFuture<'a, ClientResult<HttpResponse>> {
        request.set_scheme(self.scheme);
        request.set_host(self.host.as_str());
        next.run(request, ctx)
    }
}
