//! Void-output transform.

use relay_core::{ClientResult, HttpResponse, InvocationContext};
use relay_middleware::Transform;
use tracing::trace;

/// Discards the response body and yields `()`.
///
/// Used by operations that have no output; the body is never parsed, so an
/// empty or malformed body is not an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct VoidOutwardTransform;

impl Transform<HttpResponse, ()> for VoidOutwardTransform {
    fn name(&self) -> &'static str {
        "void_outward"
    }

    fn transform(&self, response: HttpResponse, ctx: &InvocationContext) -> ClientResult<()> {
        trace!(
            request_id = %ctx.request_id(),
            status = response.status().as_u16(),
            discarded_bytes = response.body().len(),
            "Response body discarded"
        );
        Ok(())
    }
}
