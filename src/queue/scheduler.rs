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
use tracing::{debug, error, info};

use crate::config::settings::SignalScheduleSettings;
use crate::domain::models::signal::{ConfigurationFilter, SignalKind};
use crate::domain::repositories::job_repository::JobQueueStore;
use crate::domain::repositories::signal_config_repository::SignalConfigurationStore;
use crate::infrastructure::observability::metrics::JOBS_QUEUED_TOTAL;
use crate::utils::errors::{JobError, RepositoryError, WorkerError};
use crate::workers::worker::Worker;

/// 单次调度的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// 信号已关闭，未插入任何任务
    Disabled,
    /// 插入的任务数
    Enqueued(u64),
}

/// 单个任务类型的周期调度器
///
/// 每个刷新周期检查信号开关，开启时以一条语句为所有符合条件的仓库入队
pub struct Scheduler<J, C>
where
    J: JobQueueStore + ?Sized,
    C: SignalConfigurationStore + ?Sized,
{
    kind: SignalKind,
    jobs: Arc<J>,
    configs: Arc<C>,
    refresh_interval: Duration,
    index_interval: Duration,
    name: String,
}

impl<J, C> Scheduler<J, C>
where
    J: JobQueueStore + ?Sized,
    C: SignalConfigurationStore + ?Sized,
{
    pub fn new(
        kind: SignalKind,
        jobs: Arc<J>,
        configs: Arc<C>,
        schedule: &SignalScheduleSettings,
    ) -> Self {
        Self {
            kind,
            jobs,
            configs,
            refresh_interval: schedule.refresh_interval(),
            index_interval: schedule.index_interval(),
            name: format!("scheduler:{}", kind.name()),
        }
    }

    pub fn kind(&self) -> SignalKind {
        self.kind
    }

    /// 执行一次调度
    ///
    /// 配置缺失是本次调度的不可重试错误，下一周期仍会继续
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<TickOutcome, JobError> {
        let job_type = self.kind.name();
        let config = self
            .configs
            .load_configurations(ConfigurationFilter::by_name(job_type))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RepositoryError::ConfigurationNotFound(job_type.to_string()))?;

        if !config.enabled {
            debug!("Signal {} is disabled, skipping", job_type);
            return Ok(TickOutcome::Disabled);
        }

        let inserted = self
            .jobs
            .insert_eligible_jobs(&config, self.index_interval, now)
            .await?;

        counter!(JOBS_QUEUED_TOTAL, "job_type" => job_type).increment(inserted);
        if inserted > 0 {
            info!("Enqueued {} {} jobs", inserted, job_type);
        }

        Ok(TickOutcome::Enqueued(inserted))
    }
}

#[async_trait]
impl<J, C> Worker for Scheduler<J, C>
where
    J: JobQueueStore + ?Sized + 'static,
    C: SignalConfigurationStore + ?Sized + 'static,
{
    async fn run(&self, cancel: CancellationToken) -> Result<(), WorkerError> {
        info!(
            "{} started, refresh every {:?}",
            self.name, self.refresh_interval
        );
        let mut interval = tokio::time::interval(self.refresh_interval.max(Duration::from_secs(1)));

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }

            if let Err(e) = self.run_once(Utc::now()).await {
                error!("{} tick failed: {}", self.name, e);
            }
        }

        info!("{} stopped", self.name);
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod tests;
