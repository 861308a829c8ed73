//! Background job scheduler and job implementations.

mod batch_emails;
mod pool_metrics;
mod rate_limit_prune;
mod scheduler;

pub use batch_emails::BatchEmailJob;
pub use pool_metrics::PoolMetricsJob;
pub use rate_limit_prune::RateLimitPruneJob;
pub use scheduler::{Job, JobFrequency, JobScheduler};
