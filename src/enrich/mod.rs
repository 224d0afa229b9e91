// file: src/enrich/mod.rs
// description: enrichment module exports
// reference: internal module structure

pub mod fetcher;
pub mod page;
pub mod pool;
pub mod rate_limit;
pub mod retry;

pub use fetcher::{Fetcher, LinkedInFetcher};
pub use pool::{WorkerEvent, WorkerPool};
pub use rate_limit::{RateLimiter, RequestLease};
pub use retry::{AttemptState, RetryPolicy};
