//! Port stage.

use crate::middleware::{BoxFuture, Middleware, Next};
use relay_core::{ClientResult, HttpRequestBuilder, HttpResponse, InvocationContext};

/// Sets the port, falling back to the scheme's well-known port.
///
/// Runs after the host stage so that the scheme is already known.
#[derive(Debug, Clone, Copy, Default)]
pub struct PortMiddleware {
    port: Option<u16>,
}

impl PortMiddleware {
    /// Creates the stage. `None` selects the scheme default.
    #[must_use]
    pub const fn new(port: Option<u16>) -> Self {
        Self { port }
    }
}

impl Middleware<HttpRequestBuilder, HttpResponse> for PortMiddleware {
    fn name(&self) -> &'static str {
        "port"
    }

    fn handle<'a>(
        &'a self,
        mut request: HttpRequestBuilder,
        ctx: &'a InvocationContext,
        next: Next<'a, HttpRequestBuilder, HttpResponse>,
    ) -> BoxFuture<'a, ClientResult<HttpResponse>> {
        let port = self
            .port
            .unwrap_or_else(|| request.scheme().default_port());
        request.set_port(port);
        next.run(request, ctx)
    }
}
