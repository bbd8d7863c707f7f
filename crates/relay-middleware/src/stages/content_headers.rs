//! Content headers stage.
//!
//! Attaches `content-type` and `content-length`. Runs after the signer, so
//! these headers never take part in the signature.

use crate::middleware::{BoxFuture, Middleware, Next};
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use relay_core::{ClientResult, HttpRequestBuilder, HttpResponse, InvocationContext};

/// Attaches `content-type` and `content-length`.
#[derive(Debug, Clone)]
pub struct ContentHeadersMiddleware {
    content_type: String,
    for_zero_length_body: bool,
}

impl ContentHeadersMiddleware {
    /// Creates the stage.
    ///
    /// When `for_zero_length_body` is `false`, requests with an empty body
    /// are sent without content headers.
    #[must_use]
    pub fn new(content_type: impl Into<String>, for_zero_length_body: bool) -> Self {
        Self {
            content_type: content_type.into(),
            for_zero_length_body,
        }
    }
}

impl Middleware<HttpRequestBuilder, HttpResponse> for ContentHeadersMiddleware {
    fn name(&self) -> &'static str {
        "content_headers"
    }

    fn handle<'a>(
        &'a self,
        mut request: HttpRequestBuilder,
        ctx: &'a InvocationContext,
        next: Next<'a, HttpRequestBuilder, HttpResponse>,
    ) -> BoxFuture<'a, ClientResult<HttpResponse>> {
        Box::pin(async move {
            if !request.body().is_empty() || self.for_zero_length_body {
                if !request.headers().contains_key(CONTENT_TYPE) {
                    request.insert_header(CONTENT_TYPE.as_str(), &self.content_type)?;
                }
                let length = request.body().len().to_string();
                request.insert_header(CONTENT_LENGTH.as_str(), &length)?;
            }
            next.run(request, ctx).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::test_support::{capture, captured, Captured};

    async fn run(stage: &ContentHeadersMiddleware, request: HttpRequestBuilder) -> HttpRequestBuilder {
        let ctx = InvocationContext::new();
        let slot = Captured::default();
        stage
            .handle(request, &ctx, capture(slot.clone(), HttpResponse::ok()))
            .await
            .unwrap();
        captured(&slot)
    }

    #[tokio::test]
    async fn test_attaches_headers_for_body() {
        let stage = ContentHeadersMiddleware::new("application/json", false);
        let mut request = HttpRequestBuilder::new("/items");
        request.set_body(r#"{"id":"abc"}"#);

        let request = run(&stage, request).await;
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.header("content-length"), Some("12"));
    }

    #[tokio::test]
    async fn test_skips_empty_body_by_default() {
        let stage = ContentHeadersMiddleware::new("application/json", false);
        let request = run(&stage, HttpRequestBuilder::new("/items")).await;

        assert!(request.header("content-type").is_none());
        assert!(request.header("content-length").is_none());
    }

    #[tokio::test]
    async fn test_zero_length_policy() {
        let stage = ContentHeadersMiddleware::new("application/xml", true);
        let request = run(&stage, HttpRequestBuilder::new("/items")).await;

        assert_eq!(request.header("content-type"), Some("application/xml"));
        assert_eq!(request.header("content-length"), Some("0"));
    }

    #[tokio::test]
    async fn test_keeps_existing_content_type() {
        let stage = ContentHeadersMiddleware::new("application/json", false);
        let mut request = HttpRequestBuilder::new("/items");
        request.set_body("a=b");
        request
            .insert_header("content-type", "application/x-www-form-urlencoded")
            .unwrap();

        let request = run(&stage, request).await;
        assert_eq!(
            request.header("content-type"),
            Some("application/x-www-form-urlencoded")
        );
    }
}
