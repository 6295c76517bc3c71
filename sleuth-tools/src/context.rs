use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Why an in-flight call stopped before its work finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Interrupted {
    #[error("cancelled by caller")]
    Cancelled,
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// Per-call cancellation scope handed to every [`crate::Tool`] invocation.
///
/// Cloning shares the same token, so cancelling any clone cancels them all.
/// Use [`CallContext::child`] for a scope that can be cancelled on its own.
#[derive(Debug, Clone)]
pub struct CallContext {
    call_id: Uuid,
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl Default for CallContext {
    fn default() -> Self {
        Self::new()
    }
}

impl CallContext {
    pub fn new() -> Self {
        Self::with_token(CancellationToken::new())
    }

    /// Bind the call to an externally owned token (Ctrl-C handler, parent task).
    pub fn with_token(cancel: CancellationToken) -> Self {
        Self {
            call_id: Uuid::new_v4(),
            cancel,
            deadline: None,
        }
    }

    /// Add a relative deadline. An earlier existing deadline wins.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// A scope cancelled with this one, which can also be cancelled alone.
    pub fn child(&self) -> Self {
        Self {
            call_id: Uuid::new_v4(),
            cancel: self.cancel.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn call_id(&self) -> Uuid {
        self.call_id
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Drive `work` to completion unless the scope is cancelled or its
    /// deadline passes first. The losing future is dropped.
    pub async fn run<F>(&self, work: F) -> Result<F::Output, Interrupted>
    where
        F: Future,
    {
        let deadline = self.deadline;
        let expiry = async move {
            match deadline {
                Some(at) => sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Interrupted::Cancelled),
            _ = expiry => Err(Interrupted::DeadlineExceeded),
            out = work => Ok(out),
        }
    }
}
