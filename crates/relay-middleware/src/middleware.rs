//! Core middleware trait and types.
//!
//! This module defines the [`Middleware`] trait that every step of a Relay
//! chain implements. A step receives an input value, the shared
//! [`InvocationContext`] and a [`Next`] handle for the remainder of the chain.
//!
//! The same trait is used at both levels of the pipeline:
//!
//! - `Middleware<I, O>` for outer steps that see the caller's typed input and
//!   typed output
//! - `Middleware<HttpRequestBuilder, HttpResponse>` for inner steps that see
//!   the raw HTTP request and response
//!
//! # Example
//!
//! ```
//! use relay_core::{ClientResult, HttpRequestBuilder, HttpResponse, InvocationContext};
//! use relay_middleware::{BoxFuture, Middleware, Next};
//!
//! struct TraceHeaderMiddleware;
//!
//! impl Middleware<HttpRequestBuilder, HttpResponse> for TraceHeaderMiddleware {
//!     fn name(&self) -> &'static str {
//!         "trace_header"
//!     }
//!
//!     fn handle<'a>(
//!         &'a self,
//!         mut request: HttpRequestBuilder,
//!         ctx: &'a InvocationContext,
//!         next: Next<'a, HttpRequestBuilder, HttpResponse>,
//!     ) -> BoxFuture<'a, ClientResult<HttpResponse>> {
//!         Box::pin(async move {
//!             request.insert_header("x-request-id", &ctx.request_id().to_string())?;
//!             next.run(request, ctx).await
//!         })
//!     }
//! }
//! ```

use relay_core::{ClientError, ClientResult, InvocationContext};
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The core middleware trait.
///
/// # Invariants
///
/// - `next` is consumed by value, so it can be run at most once
/// - Not running `next` short-circuits the rest of the chain
/// - Errors from downstream are propagated unchanged unless the step's
///   documented purpose is to translate them
pub trait Middleware<In, Out>: Send + Sync {
    /// Returns the name of this step.
    ///
    /// This name is used for logging and for asserting chain order in tests.
    fn name(&self) -> &'static str;

    /// Processes `input`, usually by delegating to `next`.
    fn handle<'a>(
        &'a self,
        input: In,
        ctx: &'a InvocationContext,
        next: Next<'a, In, Out>,
    ) -> BoxFuture<'a, ClientResult<Out>>;
}

type Terminal<'a, In, Out> =
    Box<dyn FnOnce(In, &'a InvocationContext) -> BoxFuture<'a, ClientResult<Out>> + Send + 'a>;

/// Handle to the remainder of a middleware chain.
pub struct Next<'a, In, Out> {
    inner: NextInner<'a, In, Out>,
}

enum NextInner<'a, In, Out> {
    /// More middleware to process
    Chain {
        middleware: &'a dyn Middleware<In, Out>,
        next: Box<Next<'a, In, Out>>,
    },
    /// End of chain
    Terminal(Terminal<'a, In, Out>),
}

impl<'a, In, Out> Next<'a, In, Out> {
    /// Creates a `Next` that invokes `middleware`, which in turn receives `next`.
    pub fn new(middleware: &'a dyn Middleware<In, Out>, next: Self) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Creates the end of a chain.
    pub fn terminal<F>(f: F) -> Self
    where
        F: FnOnce(In, &'a InvocationContext) -> BoxFuture<'a, ClientResult<Out>> + Send + 'a,
    {
        Self {
            inner: NextInner::Terminal(Box::new(f)),
        }
    }

    /// Invokes the next step of the chain.
    ///
    /// Fails with [`ClientError::Cancelled`] without invoking anything once the
    /// context has been cancelled.
    pub fn run(self, input: In, ctx: &'a InvocationContext) -> BoxFuture<'a, ClientResult<Out>> {
        if ctx.is_cancelled() {
            return Box::pin(async { Err(ClientError::Cancelled) });
        }

        match self.inner {
            NextInner::Chain { middleware, next } => middleware.handle(input, ctx, *next),
            NextInner::Terminal(terminal) => terminal(input, ctx),
        }
    }
}

/// A step that forwards to `next` and does nothing else.
///
/// Used wherever a caller did not supply outer or inner middleware, so the
/// chain never has to special-case an absent step.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMiddleware;

impl<In, Out> Middleware<In, Out> for NoOpMiddleware {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn handle<'a>(
        &'a self,
        input: In,
        ctx: &'a InvocationContext,
        next: Next<'a, In, Out>,
    ) -> BoxFuture<'a, ClientResult<Out>> {
        next.run(input, ctx)
    }
}

/// A middleware built from a closure.
///
/// # Example
///
/// ```
/// use relay_core::{HttpRequestBuilder, HttpResponse};
/// use relay_middleware::{FnMiddleware, Middleware};
///
/// let middleware = FnMiddleware::<_, HttpRequestBuilder, HttpResponse>::new(
///     "tenant_header",
///     |mut request, ctx, next| {
///         Box::pin(async move {
///             request.insert_header("x-tenant", "acme")?;
///             next.run(request, ctx).await
///         })
///     },
/// );
///
/// assert_eq!(middleware.name(), "tenant_header");
/// ```
pub struct FnMiddleware<F, In, Out> {
    name: &'static str,
    func: F,
    _marker: PhantomData<fn(In) -> Out>,
}

impl<F, In, Out> FnMiddleware<F, In, Out>
where
    F: for<'a> Fn(In, &'a InvocationContext, Next<'a, In, Out>) -> BoxFuture<'a, ClientResult<Out>>
        + Send
        + Sync,
{
    /// Creates a new function-based middleware.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self {
            name,
            func,
            _marker: PhantomData,
        }
    }
}

impl<F, In, Out> Middleware<In, Out> for FnMiddleware<F, In, Out>
where
    F: for<'a> Fn(In, &'a InvocationContext, Next<'a, In, Out>) -> BoxFuture<'a, ClientResult<Out>>
        + Send
        + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn handle<'a>(
        &'a self,
        input: In,
        ctx: &'a InvocationContext,
        next: Next<'a, In, Out>,
    ) -> BoxFuture<'a, ClientResult<Out>> {
        (self.func)(input, ctx, next)
    }
}
