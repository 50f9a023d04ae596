// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::settings::ResetterSettings;
use crate::domain::repositories::job_repository::{JobQueueStore, ResetOutcome};
use crate::infrastructure::observability::metrics::JOBS_RESET_TOTAL;
use crate::utils::errors::{RepositoryError, WorkerError};
use crate::workers::worker::Worker;

/// 卡住任务回收器
///
/// 周期性地把心跳过期的 processing 任务放回队列
pub struct Resetter<J>
where
    J: JobQueueStore + ?Sized,
{
    jobs: Arc<J>,
    interval: Duration,
    stalled_max_age: Duration,
}

impl<J> Resetter<J>
where
    J: JobQueueStore + ?Sized,
{
    pub fn new(jobs: Arc<J>, settings: &ResetterSettings) -> Self {
        Self {
            jobs,
            interval: Duration::from_secs(settings.interval_secs.max(1)),
            stalled_max_age: Duration::from_secs(settings.stalled_max_age_secs),
        }
    }

    pub async fn run_once(&self) -> Result<ResetOutcome, RepositoryError> {
        let outcome = self.jobs.reset_stalled(self.stalled_max_age).await?;

        counter!(JOBS_RESET_TOTAL, "outcome" => "requeued").increment(outcome.reset_ids.len() as u64);
        counter!(JOBS_RESET_TOTAL, "outcome" => "failed").increment(outcome.failed_ids.len() as u64);

        if !outcome.reset_ids.is_empty() {
            info!("Requeued {} stalled jobs: {:?}", outcome.reset_ids.len(), outcome.reset_ids);
        }
        if !outcome.failed_ids.is_empty() {
            warn!(
                "Failed {} jobs that stalled too many times: {:?}",
                outcome.failed_ids.len(),
                outcome.failed_ids
            );
        }
        Ok(outcome)
    }
}

#[async_trait]
impl<J> Worker for Resetter<J>
where
    J: JobQueueStore + ?Sized + 'static,
{
    async fn run(&self, cancel: CancellationToken) -> Result<(), WorkerError> {
        info!("Stalled job resetter started");
        let mut interval = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }

            if let Err(e) = self.run_once().await {
                error!("Failed to reset stalled jobs: {}", e);
            }
        }

        info!("Stalled job resetter stopped");
        Ok(())
    }

    fn name(&self) -> &str {
        "resetter"
    }
}

#[cfg(test)]
#[path = "resetter_test.rs"]
mod tests;
