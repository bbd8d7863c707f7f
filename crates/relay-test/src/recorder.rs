//! Middleware that records the order of calls.

use parking_lot::Mutex;
use relay_core::{ClientResult, InvocationContext};
use relay_middleware::{BoxFuture, Middleware, Next};
use std::sync::Arc;

/// A shared, ordered log of events.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    events: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event.
    pub fn push(&self, event: impl Into<String>) {
        self.events.lock().push(event.into());
    }

    /// Returns the events recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    /// Removes every event.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

/// Records `"<label>:enter"` before delegating and `"<label>:exit"` after.
///
/// Works at any level of the chain, since it never looks at the values it
/// passes on.
#[derive(Debug, Clone)]
pub struct RecordingMiddleware {
    label: &'static str,
    log: CallLog,
}

impl RecordingMiddleware {
    /// Creates a recorder writing to `log`.
    #[must_use]
    pub fn new(label: &'static str, log: &CallLog) -> Self {
        Self {
            label,
            log: log.clone(),
        }
    }
}

impl<In: Send + 'static, Out: Send + 'static> Middleware<In, Out> for RecordingMiddleware {
    fn name(&self) -> &'static str {
        self.label
    }

    fn handle<'a>(
        &'a self,
        input: In,
        ctx: &'a InvocationContext,
        next: Next<'a, In, Out>,
    ) -> BoxFuture<'a, ClientResult<Out>> {
        Box::pin(async move {
            self.log.push(format!("{}:enter", self.label));
            let result = next.run(input, ctx).await;
            self.log.push(format!("{}:exit", self.label));
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_around_next() {
        let log = CallLog::new();
        let recorder = RecordingMiddleware::new("outer", &log);
        let ctx = InvocationContext::new();

        let inner_log = log.clone();
        let next = Next::<'_, u32, u32>::terminal(move |n, _ctx| {
            Box::pin(async move {
                inner_log.push("terminal");
                Ok(n + 1)
            })
        });

        let out = recorder.handle(1, &ctx, next).await.unwrap();

        assert_eq!(out, 2);
        assert_eq!(log.events(), ["outer:enter", "terminal", "outer:exit"]);
        assert_eq!(Middleware::<u32, u32>::name(&recorder), "outer");

        log.clear();
        assert!(log.events().is_empty());
    }
}
