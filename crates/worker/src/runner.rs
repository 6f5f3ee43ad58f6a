//! Background job runner.
//!
//! Polls for pending jobs every `poll_interval` and executes them
//! inline. Uses `SELECT FOR UPDATE SKIP LOCKED` via
//! [`JobRepo::claim_next`] so multiple worker instances never
//! double-claim.

use std::time::Duration;

use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use labelforge_db::models::job::{GenerateRequestsParams, Job, JOB_GENERATE_REQUESTS};
use labelforge_db::repositories::JobRepo;

use crate::config::WorkerConfig;
use crate::generate::run_generate;

/// Default polling interval for the runner loop.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Long-lived job runner: one claimed job executes at a time per
/// worker process.
pub struct JobRunner {
    pool: PgPool,
    config: WorkerConfig,
    poll_interval: Duration,
}

impl JobRunner {
    /// Create a runner with the default 1-second poll interval.
    pub fn new(pool: PgPool, config: WorkerConfig) -> Self {
        Self {
            pool,
            config,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Run the polling loop until the cancellation token is triggered.
    /// A job already executing finishes before shutdown completes.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        tracing::info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            job_timeout_secs = self.config.job_timeout_secs,
            "Job runner started",
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Job runner shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.try_run_next().await {
                        tracing::error!(error = %e, "Job cycle failed");
                    }
                }
            }
        }
    }

    /// One cycle: claim the next pending job, if any, and execute it
    /// under the configured runtime budget.
    async fn try_run_next(&self) -> Result<(), sqlx::Error> {
        let Some(job) = JobRepo::claim_next(&self.pool).await? else {
            return Ok(());
        };

        tracing::info!(job_id = job.id, job_type = %job.job_type, "Job claimed");
        JobRepo::mark_started(&self.pool, job.id).await?;

        let budget = Duration::from_secs(self.config.job_timeout_secs);
        match tokio::time::timeout(budget, self.execute(&job)).await {
            Ok(Ok(result)) => {
                tracing::info!(job_id = job.id, "Job completed");
                JobRepo::complete(&self.pool, job.id, &result).await?;
            }
            Ok(Err(message)) => {
                tracing::error!(job_id = job.id, error = %message, "Job failed");
                JobRepo::fail(&self.pool, job.id, &message).await?;
            }
            Err(_) => {
                let message =
                    format!("timed out after {}s", self.config.job_timeout_secs);
                tracing::error!(job_id = job.id, %message, "Job overran its budget");
                JobRepo::fail(&self.pool, job.id, &message).await?;
            }
        }

        Ok(())
    }

    /// Dispatch on job type. Errors come back as the message stored on
    /// the failed job row.
    async fn execute(&self, job: &Job) -> Result<serde_json::Value, String> {
        match job.job_type.as_str() {
            JOB_GENERATE_REQUESTS => {
                let params: GenerateRequestsParams =
                    serde_json::from_value(job.parameters.clone())
                        .map_err(|e| format!("invalid job parameters: {e}"))?;
                run_generate(&self.pool, &self.config, job.id, &params)
                    .await
                    .map_err(|e| e.to_string())
            }
            other => Err(format!("unknown job type: {other}")),
        }
    }
}
