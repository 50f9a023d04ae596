// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use metrics::counter;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::config::settings::WorkerSettings;
use crate::domain::models::job::{ExecutionLogEntry, Job};
use crate::domain::models::signal::SignalKind;
use crate::domain::repositories::job_repository::JobQueueStore;
use crate::infrastructure::observability::metrics::JOBS_PROCESSED_TOTAL;
use crate::queue::rate_limiter::RateLimiters;
use crate::utils::errors::{JobError, WorkerError};
use crate::workers::handlers::{HandlerContext, HandlerRegistry, JobHandler};

pub const CANCELLED_MESSAGE: &str = "job cancelled";
const SHUTDOWN_MESSAGE: &str = "worker shut down while processing the job";
const LOG_KEY: &str = "handler";

/// 单次处理的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    Completed,
    /// 进入重试路径（可能因重试耗尽而成为 failed）
    Errored,
    /// 不可重试，直接 failed
    Failed,
    /// 被外部请求取消
    Cancelled,
    /// 任务在处理中被回收或删除，不再更新其状态
    Vanished,
    /// 进程关闭时仍在处理，放回队列且不计失败
    Interrupted,
}

impl ProcessOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessOutcome::Completed => "completed",
            ProcessOutcome::Errored => "errored",
            ProcessOutcome::Failed => "failed",
            ProcessOutcome::Cancelled => "cancelled",
            ProcessOutcome::Vanished => "vanished",
            ProcessOutcome::Interrupted => "interrupted",
        }
    }
}

/// 处理被打断的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interruption {
    Vanished,
    CancelRequested,
    Shutdown,
}

enum Attempt {
    Finished(Result<(), JobError>),
    Interrupted(Interruption),
}

/// 工作池参数
#[derive(Debug, Clone)]
pub struct PoolOptions {
    pub num_handlers: usize,
    pub poll_interval: Duration,
    pub heartbeat_interval: Duration,
    pub hostname: String,
}

impl PoolOptions {
    pub fn from_settings(settings: &WorkerSettings) -> Self {
        Self {
            num_handlers: settings.num_handlers.max(1),
            poll_interval: Duration::from_secs(settings.poll_interval_secs.max(1)),
            heartbeat_interval: Duration::from_secs(settings.heartbeat_interval_secs.max(1)),
            hostname: local_hostname(),
        }
    }
}

/// 当前主机名，取不到时使用随机标识
pub fn local_hostname() -> String {
    sysinfo::System::host_name().unwrap_or_else(|| format!("worker-{}", Uuid::new_v4()))
}

/// 信号任务处理器
///
/// 领取任务、获取限流令牌、分发到处理器并按结果迁移任务状态。
/// 处理期间按心跳间隔刷新心跳，任务被回收或请求取消时中止处理器。
pub struct SignalWorker<J>
where
    J: JobQueueStore + ?Sized,
{
    jobs: Arc<J>,
    registry: Arc<HandlerRegistry>,
    limiters: Arc<RateLimiters>,
    options: PoolOptions,
}

impl<J> SignalWorker<J>
where
    J: JobQueueStore + ?Sized,
{
    pub fn new(
        jobs: Arc<J>,
        registry: Arc<HandlerRegistry>,
        limiters: Arc<RateLimiters>,
        options: PoolOptions,
    ) -> Self {
        Self {
            jobs,
            registry,
            limiters,
            options,
        }
    }

    pub fn options(&self) -> &PoolOptions {
        &self.options
    }

    /// 处理槽主循环，队列为空时按轮询间隔休眠
    pub async fn run_slot(&self, slot: usize, cancel: CancellationToken) {
        info!("Signal worker slot {} started", slot);

        while !cancel.is_cancelled() {
            match self.process_next(&cancel).await {
                Ok(Some(_)) => continue,
                Ok(None) => {}
                Err(e) => error!("Slot {} failed to process job: {}", slot, e),
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.options.poll_interval) => {}
            }
        }

        info!("Signal worker slot {} stopped", slot);
    }

    /// 领取并处理一个任务，队列为空时返回 `None`
    pub async fn process_next(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Option<ProcessOutcome>, WorkerError> {
        let Some(job) = self.jobs.claim_next(&self.options.hostname).await? else {
            return Ok(None);
        };
        self.process(job, cancel).await.map(Some)
    }

    fn resolve(&self, job: &Job) -> Result<(SignalKind, Arc<dyn JobHandler>), JobError> {
        let kind: SignalKind = job.config_name.parse()?;
        let handler = self
            .registry
            .get(kind)
            .ok_or_else(|| JobError::UnknownJobType(job.config_name.clone()))?;
        Ok((kind, handler))
    }

    async fn process(
        &self,
        job: Job,
        cancel: &CancellationToken,
    ) -> Result<ProcessOutcome, WorkerError> {
        let start_time = Utc::now();
        let started = Instant::now();

        let (kind, handler) = match self.resolve(&job) {
            Ok(resolved) => resolved,
            Err(e) => {
                error!("Job {} has no handler: {}", job.id, e);
                self.finish(&job, ProcessOutcome::Failed, Some(e.to_string()), start_time, started)
                    .await?;
                return Ok(ProcessOutcome::Failed);
            }
        };

        let job_cancel = cancel.child_token();
        let ctx = HandlerContext::new(job_cancel.clone());
        // 关闭优先，处理器因子令牌取消而返回的错误不会被当作失败
        let attempt = tokio::select! {
            biased;
            _ = cancel.cancelled() => Attempt::Interrupted(Interruption::Shutdown),
            reason = self.heartbeat_until_interrupted(job.id) => Attempt::Interrupted(reason),
            result = self.run_handler(kind, handler, &ctx, &job) => Attempt::Finished(result),
        };
        job_cancel.cancel();

        let (outcome, message) = match attempt {
            Attempt::Finished(Ok(())) => (ProcessOutcome::Completed, None),
            Attempt::Finished(Err(e)) if e.is_retryable() => {
                warn!("Job {} ({}) failed, will retry: {}", job.id, kind, e);
                (ProcessOutcome::Errored, Some(e.to_string()))
            }
            Attempt::Finished(Err(e)) => {
                error!("Job {} ({}) failed permanently: {}", job.id, kind, e);
                (ProcessOutcome::Failed, Some(e.to_string()))
            }
            Attempt::Interrupted(Interruption::Vanished) => {
                warn!("Job {} is no longer held by this worker, abandoning it", job.id);
                counter!(JOBS_PROCESSED_TOTAL, "job_type" => kind.name(), "outcome" => ProcessOutcome::Vanished.as_str())
                    .increment(1);
                return Ok(ProcessOutcome::Vanished);
            }
            Attempt::Interrupted(Interruption::CancelRequested) => {
                info!("Job {} cancelled on request", job.id);
                (ProcessOutcome::Cancelled, Some(CANCELLED_MESSAGE.to_string()))
            }
            Attempt::Interrupted(Interruption::Shutdown) => {
                info!("Job {} interrupted by shutdown, requeueing", job.id);
                (ProcessOutcome::Interrupted, Some(SHUTDOWN_MESSAGE.to_string()))
            }
        };

        self.finish(&job, outcome, message, start_time, started).await?;
        Ok(outcome)
    }

    #[instrument(skip_all, fields(job_id = job.id, repo_id = job.repo_id, job_type = %kind))]
    async fn run_handler(
        &self,
        kind: SignalKind,
        handler: Arc<dyn JobHandler>,
        ctx: &HandlerContext,
        job: &Job,
    ) -> Result<(), JobError> {
        self.limiters.for_kind(kind).wait(&ctx.cancel).await?;
        handler.handle(ctx, job.repo_id).await
    }

    /// 周期刷新心跳，直到任务不再被持有或被请求取消
    async fn heartbeat_until_interrupted(&self, job_id: i32) -> Interruption {
        let mut interval = tokio::time::interval(self.options.heartbeat_interval);
        // 领取时已写入心跳
        interval.tick().await;

        loop {
            interval.tick().await;
            match self.jobs.heartbeat(&[job_id]).await {
                Ok(outcome) if !outcome.known_ids.contains(&job_id) => {
                    return Interruption::Vanished
                }
                Ok(outcome) if outcome.cancel_ids.contains(&job_id) => {
                    return Interruption::CancelRequested
                }
                Ok(_) => {}
                Err(e) => warn!("Heartbeat for job {} failed: {}", job_id, e),
            }
        }
    }

    /// 写入执行记录并迁移任务状态
    async fn finish(
        &self,
        job: &Job,
        outcome: ProcessOutcome,
        message: Option<String>,
        start_time: chrono::DateTime<Utc>,
        started: Instant,
    ) -> Result<(), WorkerError> {
        let message = message.unwrap_or_default();
        let transitioned = match outcome {
            ProcessOutcome::Completed => self.jobs.mark_completed(job.id).await?,
            ProcessOutcome::Errored => self.jobs.mark_failed(job.id, &message).await?,
            ProcessOutcome::Failed | ProcessOutcome::Cancelled => {
                self.jobs.mark_errored_permanently(job.id, &message).await?
            }
            ProcessOutcome::Interrupted => self.jobs.requeue(job.id, &message).await?,
            ProcessOutcome::Vanished => false,
        };
        if !transitioned {
            warn!("Job {} left processing before it was marked {}", job.id, outcome.as_str());
        }

        let entry = ExecutionLogEntry {
            key: LOG_KEY.to_string(),
            command: vec![job.config_name.clone(), format!("repo_id={}", job.repo_id)],
            start_time,
            exit_code: Some(if outcome == ProcessOutcome::Completed { 0 } else { 1 }),
            out: message,
            duration_ms: Some(started.elapsed().as_millis() as i64),
        };
        if let Err(e) = self.jobs.add_execution_log_entry(job.id, &entry).await {
            warn!("Failed to record execution log for job {}: {}", job.id, e);
        }

        counter!(JOBS_PROCESSED_TOTAL, "job_type" => job.config_name.clone(), "outcome" => outcome.as_str())
            .increment(1);
        Ok(())
    }
}

#[cfg(test)]
#[path = "signal_worker_test.rs"]
mod tests;
