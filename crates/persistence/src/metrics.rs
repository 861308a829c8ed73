//! Query timing and connection pool gauges.

use metrics::{counter, gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Times one repository operation.
///
/// Single queries pass their result through [`QueryTimer::finish`] so the
/// outcome is labelled. Transactions that bail out early with `?` call
/// [`QueryTimer::record`] only after committing.
///
/// ```ignore
/// let timer = QueryTimer::new("find_event_by_id");
/// let result = sqlx::query_as::<_, EventEntity>(sql).fetch_optional(&pool).await;
/// timer.finish(result)
/// ```
pub struct QueryTimer {
    query_name: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query_name: &'static str) -> Self {
        Self {
            query_name,
            start: Instant::now(),
        }
    }

    /// Record a completed operation as successful.
    pub fn record(self) {
        self.observe("ok");
    }

    /// Record the outcome of `result` and return it unchanged.
    pub fn finish<T>(self, result: Result<T, sqlx::Error>) -> Result<T, sqlx::Error> {
        self.observe(outcome_label(&result));
        result
    }

    fn observe(self, outcome: &'static str) {
        histogram!(
            "database_query_duration_seconds",
            "query" => self.query_name,
            "outcome" => outcome
        )
        .record(self.start.elapsed().as_secs_f64());

        if outcome == "error" {
            counter!("database_query_errors_total", "query" => self.query_name).increment(1);
        }
    }
}

fn outcome_label<T>(result: &Result<T, sqlx::Error>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(sqlx::Error::RowNotFound) => "not_found",
        Err(_) => "error",
    }
}

/// Publish connection pool gauges; called by the periodic pool job.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();
    let active = size.saturating_sub(idle);

    gauge!("database_connections_active").set(active as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_total").set(size as f64);
}
