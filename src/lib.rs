//! Fixed-size worker pool with single-assignment, timeout-capable futures.
//!
//! # Features
//! - Bounded FIFO queue with blocking backpressure
//! - Panics in submitted work are caught and reported through the future
//! - Blocking, async and cancellable result retrieval
//! - Graceful close that drains queued work
//! - Pool metrics

pub mod errors;
pub mod future;
pub mod model;
pub mod pool;
pub mod result;
pub mod work;

pub use errors::ExecutorError;
pub use future::Future;
pub use model::PoolMetrics;
pub use pool::{Config, Pool};
pub use result::ExecutorResult;
pub use work::Work;
