//! Background jobs
//!
//! Cache population runs off the request path on an in-process queue.

mod cache_jobs;
mod queue;

pub use cache_jobs::CacheJob;
pub use queue::{JobQueue, JobStats};
