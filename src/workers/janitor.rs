// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::counter;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::settings::JanitorSettings;
use crate::domain::repositories::job_repository::JobQueueStore;
use crate::infrastructure::observability::metrics::JANITOR_DELETED_TOTAL;
use crate::utils::errors::{RepositoryError, WorkerError};
use crate::workers::worker::Worker;

/// 任务清理工作器
///
/// 删除保留期之前结束的任务，以及已关闭信号类型的全部任务
pub struct Janitor<J>
where
    J: JobQueueStore + ?Sized,
{
    jobs: Arc<J>,
    interval: Duration,
    retention: chrono::Duration,
}

impl<J> Janitor<J>
where
    J: JobQueueStore + ?Sized,
{
    pub fn new(jobs: Arc<J>, settings: &JanitorSettings) -> Self {
        Self {
            jobs,
            interval: Duration::from_secs(settings.interval_secs.max(1)),
            retention: chrono::Duration::days(settings.retention_days),
        }
    }

    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let deleted = self.jobs.delete_expired(now - self.retention).await?;
        counter!(JANITOR_DELETED_TOTAL).increment(deleted);
        if deleted > 0 {
            info!("Deleted {} expired signal jobs", deleted);
        }
        Ok(deleted)
    }
}

#[async_trait]
impl<J> Worker for Janitor<J>
where
    J: JobQueueStore + ?Sized + 'static,
{
    async fn run(&self, cancel: CancellationToken) -> Result<(), WorkerError> {
        info!("Signal job janitor started");
        let mut interval = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }

            if let Err(e) = self.run_once(Utc::now()).await {
                error!("Failed to delete expired jobs: {}", e);
            }
        }

        info!("Signal job janitor stopped");
        Ok(())
    }

    fn name(&self) -> &str {
        "janitor"
    }
}

#[cfg(test)]
#[path = "janitor_test.rs"]
mod tests;
