//! Per-call context carrying cancellation and an optional deadline.
//!
//! Every store primitive a session runs is raced against the context it was
//! opened with, so cancelling the token (or passing the deadline) makes the
//! in-flight call fail with `StoreError::Cancelled` / `StoreError::DeadlineExceeded`.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{StoreError, StoreResult};

/// Cancellation scope for one or more repository calls.
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a child context that is cancelled together with `self`.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Derive a child context that expires after `timeout`.
    ///
    /// The earlier of the parent's deadline and the new one wins.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a child context that expires at `deadline`.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// Cancel this context and all contexts derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Run a store future under this context.
    pub async fn run<T, F>(&self, fut: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        if self.token.is_cancelled() {
            return Err(StoreError::Cancelled);
        }

        match self.deadline {
            Some(deadline) => {
                if Instant::now() >= deadline {
                    return Err(StoreError::DeadlineExceeded);
                }
                tokio::select! {
                    biased;
                    _ = self.token.cancelled() => Err(StoreError::Cancelled),
                    _ = tokio::time::sleep_until(deadline) => Err(StoreError::DeadlineExceeded),
                    result = fut => result,
                }
            }
            None => {
                tokio::select! {
                    biased;
                    _ = self.token.cancelled() => Err(StoreError::Cancelled),
                    result = fut => result,
                }
            }
        }
    }
}
