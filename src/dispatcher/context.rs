use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::handler::HandlerError;
use crate::ids::RequestId;

/// Per-request context handed to every handler.
///
/// Carries the request id used in logs, the cancellation token the dispatcher fires
/// on timeout or on behalf of the transport, and the handler deadline if one is
/// configured.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// Context with a fresh token and no deadline
    #[must_use]
    pub fn new(request_id: RequestId) -> Self {
        Self {
            request_id,
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Share an existing token, typically one the transport cancels on disconnect
    #[must_use]
    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Set the deadline `timeout` from now
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Identifier of this request
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// The cancellation token
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Cancel the request
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// `true` once the request was cancelled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolve once the request is cancelled
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// Deadline for the handler, if any
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; zero once it has passed
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Run blocking work on the blocking thread pool and await its result.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::Internal`] if the closure panicked or the runtime is
    /// shutting down.
    pub async fn spawn_blocking<F, R>(&self, f: F) -> Result<R, HandlerError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        tokio::task::spawn_blocking(f)
            .await
            .map_err(HandlerError::internal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cancel_wakes_waiters() {
        let ctx = RequestContext::new(RequestId::new());
        let waiter = {
            let ctx = ctx.clone();
            tokio::spawn(async move { ctx.cancelled().await })
        };
        tokio::task::yield_now().await;
        assert!(!ctx.is_cancelled());
        ctx.cancel();
        waiter.await.unwrap();
        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_resolves_immediately_when_already_cancelled() {
        let token = CancellationToken::new();
        let ctx = RequestContext::new(RequestId::new()).with_token(token.clone());
        token.cancel();
        token.cancel();
        ctx.cancelled().await;
        assert!(ctx.token().is_cancelled());
    }

    #[tokio::test]
    async fn test_child_token_follows_transport_token() {
        let transport = CancellationToken::new();
        let ctx = RequestContext::new(RequestId::new()).with_token(transport.child_token());
        ctx.cancel();
        assert!(!transport.is_cancelled());

        let ctx = RequestContext::new(RequestId::new()).with_token(transport.child_token());
        transport.cancel();
        ctx.cancelled().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_remaining_counts_down() {
        let ctx = RequestContext::new(RequestId::new()).with_timeout(Duration::from_secs(2));
        assert_eq!(ctx.remaining(), Some(Duration::from_secs(2)));
        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
    }

    #[tokio::test]
    async fn test_spawn_blocking_returns_value() {
        let ctx = RequestContext::new(RequestId::new());
        let value = ctx.spawn_blocking(|| 6 * 7).await.unwrap();
        assert_eq!(value, 42);
    }
}
