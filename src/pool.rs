use super::{
    errors::ExecutorError,
    result::ExecutorResult,
    future::{self, Future},
    model::PoolMetrics,
    work::{Work, WorkItem},
};
use std::{
    fmt,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, PoisonError, RwLock,
    },
    thread::{self, JoinHandle},
    time::Duration,
};
use crossbeam::channel::{self, Receiver, SendTimeoutError, Sender, TrySendError};
use tracing::{debug, info, trace, warn};


/// Pool configuration. `Default` sizes the pool from the CPU count.
#[derive(Debug, Clone)]
pub struct Config {
    /// Diagnostic label, also the prefix of worker thread names.
    pub name: String,
    pub num_workers: usize,
    /// Pending items the queue holds before `submit` blocks. `0` hands each
    /// item directly to an idle worker.
    pub queue_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        let num_cpus = num_cpus::get();
        Self {
            name: "pool".to_string(),
            num_workers: num_cpus,
            queue_capacity: num_cpus * 20,
        }
    }
}

impl Config {
    pub fn cpu_bound() -> Self {
        let num_cpus = num_cpus::get();
        Self {
            num_workers: num_cpus,
            queue_capacity: num_cpus * 10,
            ..Default::default()
        }
    }

    pub fn io_bound() -> Self {
        let num_cpus = num_cpus::get();
        Self {
            num_workers: num_cpus * 2,
            queue_capacity: num_cpus * 20,
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    pub fn validate(&self) -> ExecutorResult<()> {
        if self.num_workers == 0 {
            return Err(ExecutorError::InvalidConfig(
                "num_workers must be at least 1".into(),
            ));
        }
        if self.name.contains('\0') {
            return Err(ExecutorError::InvalidConfig(
                "name must not contain NUL bytes".into(),
            ));
        }
        Ok(())
    }
}


#[derive(Default)]
struct Counters {
    active: AtomicUsize,
    total_submitted: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
}


/// Fixed-size pool of worker threads draining a bounded FIFO queue.
///
/// Every submission returns a [`Future`] for its outcome. A panic inside the
/// work is caught at the item boundary and delivered as
/// [`ExecutorError::Execution`]; the worker keeps running.
pub struct Pool {
    /// `None` once closed.
    sender: RwLock<Option<Sender<WorkItem>>>,
    queue: Receiver<WorkItem>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    counters: Arc<Counters>,
    config: Config,
}

impl Pool {
    pub fn new(
        name: impl Into<String>,
        num_workers: usize,
        queue_capacity: usize,
    ) -> ExecutorResult<Self> {
        Self::with_config(Config {
            name: name.into(),
            num_workers,
            queue_capacity,
        })
    }

    pub fn with_config(config: Config) -> ExecutorResult<Self> {
        config.validate()?;

        let (sender, queue) = channel::bounded(config.queue_capacity);
        let counters = Arc::new(Counters::default());

        // On a spawn error `sender` is dropped on return, which releases the
        // workers started so far.
        let mut workers = Vec::with_capacity(config.num_workers);
        for n in 1..=config.num_workers {
            let id = format!("{}-worker_{}", config.name, n);
            let queue = queue.clone();
            let counters = counters.clone();
            let handle = thread::Builder::new()
                .name(id.clone())
                .spawn(move || worker_loop(id, queue, counters))
                .map_err(|e| ExecutorError::Spawn(e.to_string()))?;
            workers.push(handle);
        }

        info!(
            pool = %config.name,
            workers = config.num_workers,
            queue_capacity = config.queue_capacity,
            "pool started"
        );

        Ok(Self {
            sender: RwLock::new(Some(sender)),
            queue,
            workers: Mutex::new(workers),
            counters,
            config,
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    #[inline]
    pub fn num_workers(&self) -> usize {
        self.config.num_workers
    }

    #[inline]
    pub fn queue_capacity(&self) -> usize {
        self.config.queue_capacity
    }

    pub fn is_closed(&self) -> bool {
        self.sender
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Queues `work` and returns a handle to its outcome.
    ///
    /// Blocks while the queue is full. Fails with [`ExecutorError::Closed`]
    /// after [`close`](Self::close).
    pub fn submit<W: Work>(&self, work: W) -> ExecutorResult<Future<W::Output>> {
        self.enqueue(work, |sender, item| {
            sender.send(item).map_err(|_| self.closed_error())
        })
    }

    /// Like [`submit`](Self::submit) but fails with
    /// [`ExecutorError::QueueFull`] instead of blocking.
    pub fn try_submit<W: Work>(&self, work: W) -> ExecutorResult<Future<W::Output>> {
        self.enqueue(work, |sender, item| match sender.try_send(item) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                Err(ExecutorError::QueueFull(self.config.name.clone()))
            }
            Err(TrySendError::Disconnected(_)) => Err(self.closed_error()),
        })
    }

    /// Like [`submit`](Self::submit) but waits at most `timeout` for a free
    /// queue slot.
    pub fn submit_timeout<W: Work>(
        &self,
        work: W,
        timeout: Duration,
    ) -> ExecutorResult<Future<W::Output>> {
        self.enqueue(work, |sender, item| match sender.send_timeout(item, timeout) {
            Ok(()) => Ok(()),
            Err(SendTimeoutError::Timeout(_)) => Err(ExecutorError::Timeout),
            Err(SendTimeoutError::Disconnected(_)) => Err(self.closed_error()),
        })
    }

    fn enqueue<W, S>(&self, work: W, send: S) -> ExecutorResult<Future<W::Output>>
    where
        W: Work,
        S: FnOnce(&Sender<WorkItem>, WorkItem) -> ExecutorResult<()>,
    {
        // Clone out of the lock so a blocked send never holds up `close`.
        let sender = self
            .sender
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| self.closed_error())?;

        let (promise, future) = future::pair();
        send(&sender, WorkItem::new(work, promise))?;
        self.counters.total_submitted.fetch_add(1, Ordering::Relaxed);

        Ok(future)
    }

    /// Stops accepting work. Queued and running items still complete; workers
    /// exit once the queue is empty. Does not wait for that to happen.
    pub fn close(&self) -> ExecutorResult<()> {
        let sender = self
            .sender
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match sender {
            Some(sender) => {
                drop(sender);
                info!(pool = %self.config.name, queued = self.queue.len(), "pool closed");
                Ok(())
            }
            None => Err(ExecutorError::AlreadyClosed(self.config.name.clone())),
        }
    }

    /// Closes the pool if still open and blocks until every worker has
    /// drained the queue and exited.
    pub fn shutdown(&self) {
        if self.close().is_err() {
            debug!(pool = %self.config.name, "shutdown of already closed pool");
        }

        let workers = std::mem::take(
            &mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner),
        );
        let current = thread::current().id();
        for handle in workers {
            // A worker shutting down its own pool cannot join itself.
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                warn!(pool = %self.config.name, "worker thread panicked");
            }
        }

        info!(pool = %self.config.name, "pool drained");
    }

    pub fn metrics(&self) -> PoolMetrics {
        let active = self.counters.active.load(Ordering::Relaxed);
        PoolMetrics {
            active_tasks: active,
            idle_workers: self.config.num_workers.saturating_sub(active),
            queued_tasks: self.queue.len(),
            queue_capacity: self.config.queue_capacity,
            total_submitted: self.counters.total_submitted.load(Ordering::Relaxed),
            completed_tasks: self.counters.completed.load(Ordering::Relaxed),
            failed_tasks: self.counters.failed.load(Ordering::Relaxed),
        }
    }

    #[inline]
    fn closed_error(&self) -> ExecutorError {
        ExecutorError::Closed(self.config.name.clone())
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        let sender = self
            .sender
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if sender.is_some() {
            debug!(pool = %self.config.name, "pool dropped while open, workers drain in background");
        }
    }
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("name", &self.config.name)
            .field("num_workers", &self.config.num_workers)
            .field("queue_capacity", &self.config.queue_capacity)
            .field("closed", &self.is_closed())
            .finish()
    }
}


/// Drains `queue` until it is closed and empty.
fn worker_loop(id: String, queue: Receiver<WorkItem>, counters: Arc<Counters>) {
    debug!(worker = %id, "worker started");

    for item in queue.iter() {
        counters.active.fetch_add(1, Ordering::Relaxed);
        trace!(worker = %id, "processing work item");

        if item.run() {
            counters.completed.fetch_add(1, Ordering::Relaxed);
        } else {
            counters.failed.fetch_add(1, Ordering::Relaxed);
        }

        counters.active.fetch_sub(1, Ordering::Relaxed);
    }

    debug!(worker = %id, "worker shutting down");
}
