//! Format-conversion steps.
//!
//! A [`Transform`] converts between the typed domain and the raw HTTP
//! domain. Unlike a [`Middleware`](crate::Middleware) it never delegates:
//! it is a pure function of its input and the context.

use relay_core::{ClientResult, InvocationContext};

/// A pure conversion from `In` to `Out`.
///
/// Inward transforms (typed input to `HttpRequestBuilder`) fail with
/// `ClientError::Encoding`; outward transforms (`HttpResponse` to typed
/// output) fail with `ClientError::Decoding`.
pub trait Transform<In, Out>: Send + Sync {
    /// Returns the name of this transform, used in logs.
    fn name(&self) -> &'static str;

    /// Converts `input`.
    fn transform(&self, input: In, ctx: &InvocationContext) -> ClientResult<Out>;
}

/// A transform built from a closure.
pub struct FnTransform<F> {
    name: &'static str,
    func: F,
}

impl<F> FnTransform<F> {
    /// Creates a new function-based transform.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F, In, Out> Transform<In, Out> for FnTransform<F>
where
    F: Fn(In, &InvocationContext) -> ClientResult<Out> + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn transform(&self, input: In, ctx: &InvocationContext) -> ClientResult<Out> {
        (self.func)(input, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::ClientError;

    #[test]
    fn test_fn_transform() {
        let parse = FnTransform::new("parse", |input: String, _ctx: &InvocationContext| {
            input
                .parse::<u32>()
                .map_err(|e| ClientError::decoding_with_source("not a number", e))
        });
        let ctx = InvocationContext::new();

        assert_eq!(parse.name(), "parse");
        assert_eq!(parse.transform("42".to_string(), &ctx).unwrap(), 42);
        assert_eq!(
            parse.transform("x".to_string(), &ctx).unwrap_err().kind(),
            relay_core::ErrorKind::Decoding
        );
    }
}
