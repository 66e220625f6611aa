use thiserror::Error;

/// Errors surfaced by [`Pool`](crate::pool::Pool) and [`Future`](crate::future::Future).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutorError {
    /// The deadline passed before a result was available. The work may still
    /// be queued or running; waiting again is valid.
    #[error("operation timed out")]
    Timeout,

    /// The work panicked. Every later read of the same future repeats this.
    #[error("work failed due to: {0}")]
    Execution(String),

    #[error("pool '{0}' is closed")]
    Closed(String),

    #[error("pool '{0}' is already closed")]
    AlreadyClosed(String),

    #[error("queue of pool '{0}' is full")]
    QueueFull(String),

    /// The work item was dropped before it produced a result.
    #[error("work was abandoned before completion")]
    Abandoned,

    /// The caller's wait was cancelled; the work itself keeps running.
    #[error("wait cancelled")]
    Cancelled,

    #[error("invalid pool config: {0}")]
    InvalidConfig(String),

    #[error("failed to spawn worker thread: {0}")]
    Spawn(String),
}

impl ExecutorError {
    #[inline]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// True for outcomes stored in a future, which every later read repeats.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Execution(_) | Self::Abandoned)
    }
}
