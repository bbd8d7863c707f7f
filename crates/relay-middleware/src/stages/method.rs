//! Method stage.

use crate::middleware::{BoxFuture, Middleware, Next};
use http::Method;
use relay_core::{ClientResult, HttpRequestBuilder, HttpResponse, InvocationContext};

/// Sets the HTTP method of the operation.
#[derive(Debug, Clone)]
pub struct MethodMiddleware {
    method: Method,
}

impl MethodMiddleware {
    /// Creates the stage.
    #[must_use]
    pub const fn new(method: Method) -> Self {
        Self { method }
    }
}

impl Middleware<HttpRequestBuilder, HttpResponse> for MethodMiddleware {
    fn name(&self) -> &'static str {
        "method"
    }

    fn handle<'a>(
        &'a self,
        mut request: HttpRequestBuilder,
        ctx: &'a InvocationContext,
        next: Next<'a, HttpRequestBuilder, HttpResponse>,
    ) -> BoxFuture<'a, ClientResult<HttpResponse>> {
        request.set_method(self.method.clone());
        next.run(request, ctx)
    }
}
