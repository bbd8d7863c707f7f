//! Invocation context types.
//!
//! The [`InvocationContext`] carries ambient, call-scoped state through every
//! step of one pipeline execution. It is owned by the caller and lent to the
//! pipeline by shared reference; the pipeline never mutates or retains it.

use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// A unique identifier for each invocation, using UUID v7.
///
/// UUID v7 is time-ordered, which makes it ideal for request tracking
/// and log correlation.
///
/// # Example
///
/// ```
/// use relay_core::RequestId;
///
/// let id = RequestId::new();
/// println!("Request ID: {}", id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `RequestId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Context that flows through one pipeline execution.
///
/// Carries the invocation's request id, optional trace correlation ids,
/// the logical operation name, a cancellation token and typed extensions.
/// Every middleware step and transform receives it by reference.
///
/// # Example
///
/// ```
/// use relay_core::InvocationContext;
///
/// let ctx = InvocationContext::new()
///     .with_trace_id("4bf92f3577b34da6a3ce929d0e0e4736")
///     .with_operation("GetItem");
///
/// assert_eq!(ctx.operation(), Some("GetItem"));
/// assert!(!ctx.is_cancelled());
/// ```
#[derive(Debug)]
pub struct InvocationContext {
    /// Unique identifier for this invocation.
    request_id: RequestId,

    /// Trace ID (hex string) of the caller's trace, if any.
    trace_id: Option<String>,

    /// Span ID (hex string) of the caller's span, if any.
    span_id: Option<String>,

    /// Logical operation name used in logs.
    operation: Option<String>,

    /// When the invocation started.
    started_at: Instant,

    /// Cooperative cancellation signal.
    cancellation: CancellationToken,

    /// Type-erased extension data.
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl InvocationContext {
    /// Creates a new context with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates a context with a specific request ID.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            trace_id: None,
            span_id: None,
            operation: None,
            started_at: Instant::now(),
            cancellation: CancellationToken::new(),
            extensions: HashMap::new(),
        }
    }

    /// Sets the trace ID.
    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    /// Sets the span ID.
    #[must_use]
    pub fn with_span_id(mut self, span_id: impl Into<String>) -> Self {
        self.span_id = Some(span_id.into());
        self
    }

    /// Sets the logical operation name.
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Uses the given token as this invocation's cancellation signal.
    ///
    /// Pass a child token of a wider scope to tie the invocation to it.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the trace ID, if set.
    #[must_use]
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// Returns the span ID, if set.
    #[must_use]
    pub fn span_id(&self) -> Option<&str> {
        self.span_id.as_deref()
    }

    /// Returns the operation name, if set.
    #[must_use]
    pub fn operation(&self) -> Option<&str> {
        self.operation.as_deref()
    }

    /// Returns when the invocation started.
    #[must_use]
    pub const fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the elapsed time since the invocation started.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    /// Returns the cancellation token.
    #[must_use]
    pub const fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Returns `true` once cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Requests cancellation of the invocation.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Completes when cancellation is requested.
    pub async fn cancelled(&self) {
        self.cancellation.cancelled().await;
    }

    /// Stores a typed extension value.
    ///
    /// Extensions are attached by the caller before the invocation starts and
    /// are readable by every step.
    ///
    /// # Example
    ///
    /// ```
    /// use relay_core::InvocationContext;
    ///
    /// #[derive(Clone)]
    /// struct Tenant(String);
    ///
    /// let mut ctx = InvocationContext::new();
    /// ctx.set_extension(Tenant("acme".to_string()));
    ///
    /// assert_eq!(ctx.get_extension::<Tenant>().unwrap().0, "acme");
    /// ```
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Removes and returns a typed extension value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }

    /// Checks if an extension of the given type exists.
    #[must_use]
    pub fn has_extension<T: Send + Sync + 'static>(&self) -> bool {
        self.extensions.contains_key(&TypeId::of::<T>())
    }
}

impl Default for InvocationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for InvocationContext {
    fn clone(&self) -> Self {
        // Extensions are not cloned - they don't implement Clone
        Self {
            request_id: self.request_id,
            trace_id: self.trace_id.clone(),
            span_id: self.span_id.clone(),
            operation: self.operation.clone(),
            started_at: self.started_at,
            cancellation: self.cancellation.clone(),
            extensions: HashMap::new(),
        }
    }
}
