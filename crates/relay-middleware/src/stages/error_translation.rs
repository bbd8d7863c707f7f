//! Error translation stage.
//!
//! The innermost fixed stage. Non-2xx responses from the transport are turned
//! into [`ClientError::Service`] here, so nothing above this stage ever sees
//! an error response as a successful value. This is the only place in the
//! chain where one error kind is produced from something else.

use crate::middleware::{BoxFuture, Middleware, Next};
use relay_core::{
    BoxError, ClientError, ClientResult, HttpRequestBuilder, HttpResponse, InvocationContext,
    ServiceError,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Decodes the body of an error response into the client's typed error.
///
/// Implemented per wire format; the returned box holds the typed payload that
/// callers later recover with [`ServiceError::payload`].
pub trait ErrorDecoder: Send + Sync {
    /// Decodes `response` into the typed error payload.
    fn decode(&self, response: &HttpResponse) -> Result<BoxError, BoxError>;
}

/// Converts non-2xx responses into [`ClientError::Service`].
///
/// If the body cannot be decoded, the service error is still returned with
/// the status and raw body but without a typed payload.
#[derive(Clone)]
pub struct ErrorTranslationMiddleware {
    decoder: Arc<dyn ErrorDecoder>,
}

impl ErrorTranslationMiddleware {
    /// Creates the stage.
    #[must_use]
    pub fn new(decoder: Arc<dyn ErrorDecoder>) -> Self {
        Self { decoder }
    }

    /// Builds the service error for a non-2xx response.
    pub fn translate(&self, response: &HttpResponse) -> ServiceError {
        let error = ServiceError::new(response.status(), response.body().clone());
        match self.decoder.decode(response) {
            Ok(payload) => error.with_boxed_payload(payload),
            Err(decode_error) => {
                debug!(
                    status = response.status().as_u16(),
                    error = %decode_error,
                    "Error body could not be decoded"
                );
                error
            }
        }
    }
}

impl std::fmt::Debug for ErrorTranslationMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorTranslationMiddleware").finish_non_exhaustive()
    }
}

impl Middleware<HttpRequestBuilder, HttpResponse> for ErrorTranslationMiddleware {
    fn name(&self) -> &'static str {
        "error_translation"
    }

    fn handle<'a>(
        &'a self,
        request: HttpRequestBuilder,
        ctx: &'a InvocationContext,
        next: Next<'a, HttpRequestBuilder, HttpResponse>,
    ) -> BoxFuture<'a, ClientResult<HttpResponse>> {
        Box::pin(async move {
            let response = next.run(request, ctx).await?;
            if response.is_success() {
                return Ok(response);
            }

            let error = self.translate(&response);
            warn!(
                request_id = %ctx.request_id(),
                status = response.status().as_u16(),
                typed = error.has_payload(),
                message = %error.message(),
                "Service returned an error response"
            );
            Err(ClientError::Service(error))
        })
    }
}
