use super::{
    errors::ExecutorError,
    future::Promise,
};
use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
};


/// A unit of work the pool can run.
///
/// Implemented for every `FnOnce() -> T` closure, so most callers never name
/// this trait. Implement it directly to submit a struct carrying its own inputs.
pub trait Work: Send + 'static {
    /// Shared by every handle to the result, possibly across threads.
    type Output: Send + Sync + 'static;

    fn call(self) -> Self::Output;
}

impl<F, T> Work for F
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + Sync + 'static,
{
    type Output = T;

    #[inline]
    fn call(self) -> T {
        self()
    }
}


pub(crate) type Task = Box<dyn FnOnce() -> bool + Send + 'static>;

/// Work paired with the promise for its result, erased to a single task type
/// so one queue carries work of any output type.
pub(crate) struct WorkItem {
    task: Task,
}

impl WorkItem {
    pub(crate) fn new<W: Work>(work: W, promise: Promise<W::Output>) -> Self {
        let task: Task = Box::new(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(move || work.call()))
                .map_err(|payload| ExecutorError::Execution(panic_message(&*payload)));
            let succeeded = outcome.is_ok();
            if let Err(ExecutorError::Execution(reason)) = &outcome {
                tracing::warn!(%reason, "work panicked");
            }
            promise.complete(outcome);
            succeeded
        });
        Self { task }
    }

    /// Runs the work and delivers its outcome. Returns `true` on success.
    #[inline]
    pub(crate) fn run(self) -> bool {
        (self.task)()
    }
}


fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
