//! Drops idle clients from the rate limiter's keyed state.

use std::sync::Arc;
use tracing::debug;

use super::scheduler::{Job, JobFrequency};
use crate::middleware::RateLimiterState;

pub struct RateLimitPruneJob {
    limiter: Arc<RateLimiterState>,
}

impl RateLimitPruneJob {
    pub fn new(limiter: Arc<RateLimiterState>) -> Self {
        Self { limiter }
    }
}

#[async_trait::async_trait]
impl Job for RateLimitPruneJob {
    fn name(&self) -> &'static str {
        "rate_limit_prune"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(5)
    }

    async fn execute(&self) -> anyhow::Result<()> {
        let before = self.limiter.tracked_clients();
        self.limiter.prune();
        debug!(before, after = self.limiter.tracked_clients(), "Rate limiter pruned");
        Ok(())
    }
}
