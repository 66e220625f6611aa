use super::{
    errors::ExecutorError,
    result::ExecutorResult,
};
use std::{
    fmt,
    sync::{Arc, Condvar, Mutex, OnceLock, PoisonError},
    time::Duration,
};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;


struct Shared<T> {
    outcome: OnceLock<ExecutorResult<T>>,
    lock: Mutex<()>,
    completed: Condvar,
    notify: Notify,
}

impl<T> Shared<T> {
    fn new() -> Self {
        Self {
            outcome: OnceLock::new(),
            lock: Mutex::new(()),
            completed: Condvar::new(),
            notify: Notify::new(),
        }
    }

    /// Stores the outcome and wakes every waiter. Returns `false` without
    /// touching the stored value if an outcome was already set.
    fn complete(&self, outcome: ExecutorResult<T>) -> bool {
        if self.outcome.set(outcome).is_err() {
            return false;
        }
        // Blocking waiters re-check the cell under this lock, so notifying
        // while holding it cannot lose a wakeup.
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.completed.notify_all();
        self.notify.notify_waiters();
        true
    }
}


/// Creates a connected writer/reader pair for one unit of work.
pub(crate) fn pair<T>() -> (Promise<T>, Future<T>) {
    let shared = Arc::new(Shared::new());
    (
        Promise { shared: Some(shared.clone()) },
        Future { shared },
    )
}


/// Write side of a [`Future`]. Owned by the worker that runs the work.
///
/// Dropping a promise that was never completed resolves the future with
/// [`ExecutorError::Abandoned`].
pub(crate) struct Promise<T> {
    shared: Option<Arc<Shared<T>>>,
}

impl<T> Promise<T> {
    pub(crate) fn complete(mut self, outcome: ExecutorResult<T>) -> bool {
        match self.shared.take() {
            Some(shared) => shared.complete(outcome),
            None => false,
        }
    }
}

impl<T> Drop for Promise<T> {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            shared.complete(Err(ExecutorError::Abandoned));
        }
    }
}


/// Handle to the eventual outcome of work submitted to a pool.
///
/// Cloned handles observe the same outcome. Reads never consume it: once set,
/// every `get` returns the identical value or error.
pub struct Future<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Future<T> {
    fn clone(&self) -> Self {
        Self { shared: self.shared.clone() }
    }
}

impl<T> fmt::Debug for Future<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Future")
            .field("done", &self.is_done())
            .finish()
    }
}

impl<T> Future<T> {
    #[inline]
    pub fn is_done(&self) -> bool {
        self.shared.outcome.get().is_some()
    }

    /// Borrows the outcome if it is already available.
    #[inline]
    pub fn try_get_ref(&self) -> Option<ExecutorResult<&T>> {
        self.shared
            .outcome
            .get()
            .map(|outcome| outcome.as_ref().map_err(Clone::clone))
    }

    /// Blocks the calling thread until the outcome is set or `timeout` elapses,
    /// then borrows it. Works for outputs that are not `Clone`.
    ///
    /// A timeout returns [`ExecutorError::Timeout`] and leaves the future
    /// untouched, so a later call still sees the real outcome.
    pub fn get_ref(&self, timeout: Duration) -> ExecutorResult<&T> {
        if !self.is_done() {
            let guard = self.shared.lock.lock().unwrap_or_else(PoisonError::into_inner);
            let _guard = self
                .shared
                .completed
                .wait_timeout_while(guard, timeout, |_| !self.is_done())
                .unwrap_or_else(PoisonError::into_inner);
        }

        self.try_get_ref().unwrap_or(Err(ExecutorError::Timeout))
    }

    /// Async counterpart of [`get_ref`](Self::get_ref) for callers on a tokio runtime.
    pub async fn get_async_ref(&self, timeout: Duration) -> ExecutorResult<&T> {
        match tokio::time::timeout(timeout, self.completion()).await {
            Ok(()) => self.try_get_ref().unwrap_or(Err(ExecutorError::Abandoned)),
            Err(_) => Err(ExecutorError::Timeout),
        }
    }

    /// Waits for the outcome until `token` is cancelled.
    ///
    /// Cancelling only stops this wait; the work keeps running and its
    /// outcome stays readable through any handle.
    pub async fn get_cancellable_ref(&self, token: &CancellationToken) -> ExecutorResult<&T> {
        tokio::select! {
            _ = self.completion() => self.try_get_ref().unwrap_or(Err(ExecutorError::Abandoned)),
            _ = token.cancelled() => Err(ExecutorError::Cancelled),
        }
    }

    async fn completion(&self) {
        let notified = self.shared.notify.notified();
        tokio::pin!(notified);
        loop {
            // Register before checking so a completion in between still wakes us.
            notified.as_mut().enable();
            if self.is_done() {
                return;
            }
            notified.as_mut().await;
            notified.set(self.shared.notify.notified());
        }
    }
}

/// Owned reads. Each call hands out a fresh copy of the stored outcome.
impl<T: Clone> Future<T> {
    #[inline]
    pub fn try_get(&self) -> Option<ExecutorResult<T>> {
        self.try_get_ref().map(|r| r.cloned())
    }

    pub fn get(&self, timeout: Duration) -> ExecutorResult<T> {
        self.get_ref(timeout).cloned()
    }

    pub async fn get_async(&self, timeout: Duration) -> ExecutorResult<T> {
        self.get_async_ref(timeout).await.cloned()
    }

    pub async fn get_cancellable(&self, token: &CancellationToken) -> ExecutorResult<T> {
        self.get_cancellable_ref(token).await.cloned()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_completion_is_ignored() {
        let (promise, future) = pair::<u32>();
        let shared = future.shared.clone();

        assert!(promise.complete(Ok(1)));
        assert!(!shared.complete(Ok(2)));
        assert!(!shared.complete(Err(ExecutorError::Execution("late".into()))));

        assert_eq!(future.get(Duration::from_millis(10)), Ok(1));
    }

    #[test]
    fn dropped_promise_abandons_future() {
        let (promise, future) = pair::<String>();
        assert!(!future.is_done());

        drop(promise);

        assert_eq!(future.try_get(), Some(Err(ExecutorError::Abandoned)));
        assert_eq!(future.get(Duration::from_millis(10)), Err(ExecutorError::Abandoned));
    }

    #[test]
    fn timeout_does_not_consume_outcome() {
        let (promise, future) = pair::<&'static str>();

        assert_eq!(future.get(Duration::from_millis(20)), Err(ExecutorError::Timeout));
        assert!(promise.complete(Ok("done")));
        assert_eq!(future.get(Duration::from_millis(20)), Ok("done"));
        assert_eq!(future.clone().get(Duration::ZERO), Ok("done"));
    }

    #[test]
    fn blocked_waiter_is_woken_by_completion() {
        let (promise, future) = pair::<u64>();
        let waiter = {
            let future = future.clone();
            std::thread::spawn(move || future.get(Duration::from_secs(5)))
        };

        std::thread::sleep(Duration::from_millis(50));
        promise.complete(Ok(7));

        assert_eq!(waiter.join().unwrap(), Ok(7));
    }

    #[tokio::test]
    async fn async_waiter_is_woken_by_completion() {
        let (promise, future) = pair::<u64>();
        let waiter = {
            let future = future.clone();
            tokio::spawn(async move { future.get_async(Duration::from_secs(5)).await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        promise.complete(Ok(9));

        assert_eq!(waiter.await.unwrap(), Ok(9));
    }
}
