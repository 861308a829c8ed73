//! Periodic connection pool gauges.

use sqlx::PgPool;
use tracing::warn;

use super::scheduler::{Job, JobFrequency};

pub struct PoolMetricsJob {
    pool: PgPool,
    max_connections: u32,
}

impl PoolMetricsJob {
    pub fn new(pool: PgPool, max_connections: u32) -> Self {
        Self {
            pool,
            max_connections,
        }
    }
}

/// Every connection is checked out and none idle.
fn is_saturated(size: u32, idle: usize, max_connections: u32) -> bool {
    size >= max_connections && idle == 0
}

#[async_trait::async_trait]
impl Job for PoolMetricsJob {
    fn name(&self) -> &'static str {
        "pool_metrics"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Seconds(15)
    }

    fn run_on_start(&self) -> bool {
        true
    }

    async fn execute(&self) -> anyhow::Result<()> {
        persistence::metrics::record_pool_metrics(&self.pool);
        if is_saturated(self.pool.size(), self.pool.num_idle(), self.max_connections) {
            warn!(
                max_connections = self.max_connections,
                "Database pool saturated"
            );
        }
        Ok(())
    }
}
