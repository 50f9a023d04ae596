// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{ExecutionLogEntry, Job};
use crate::domain::models::signal::SignalConfiguration;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;

/// 心跳结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeartbeatOutcome {
    /// 仍处于 processing 的任务
    pub known_ids: Vec<i32>,
    /// 被外部请求取消的任务
    pub cancel_ids: Vec<i32>,
}

/// 卡住任务回收结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResetOutcome {
    /// 重新入队的任务
    pub reset_ids: Vec<i32>,
    /// 超过最大重置次数而置为失败的任务
    pub failed_ids: Vec<i32>,
}

/// 任务队列存储
///
/// 任务表唯一的写入口：领取、心跳、完成、失败、回收、删除与调度插入都通过这里完成
#[async_trait]
pub trait JobQueueStore: Send + Sync {
    /// 原子领取下一个可处理的任务（id 最小者优先）
    async fn claim_next(&self, worker_hostname: &str) -> Result<Option<Job>, RepositoryError>;

    /// 刷新心跳，返回仍被持有的任务与被请求取消的任务
    async fn heartbeat(&self, ids: &[i32]) -> Result<HeartbeatOutcome, RepositoryError>;

    /// 标记完成，任务已不在 processing 时返回 false
    async fn mark_completed(&self, id: i32) -> Result<bool, RepositoryError>;

    /// 标记失败：重试预算未耗尽时进入 errored 并退避，否则置为 failed
    async fn mark_failed(&self, id: i32, message: &str) -> Result<bool, RepositoryError>;

    /// 不可重试的失败，直接置为 failed
    async fn mark_errored_permanently(&self, id: i32, message: &str)
        -> Result<bool, RepositoryError>;

    /// 放回队列等待重新领取，不计入失败次数
    async fn requeue(&self, id: i32, message: &str) -> Result<bool, RepositoryError>;

    /// 追加一条执行记录
    async fn add_execution_log_entry(
        &self,
        id: i32,
        entry: &ExecutionLogEntry,
    ) -> Result<(), RepositoryError>;

    /// 回收心跳超过 `max_age` 的 processing 任务
    async fn reset_stalled(&self, max_age: Duration) -> Result<ResetOutcome, RepositoryError>;

    /// 经配置感知视图统计待处理任务数，已关闭的信号类型始终为 0
    async fn queued_count(&self, job_type: &str) -> Result<u64, RepositoryError>;

    /// 按类型统计原始任务行数
    async fn job_counts_by_type(&self) -> Result<HashMap<String, u64>, RepositoryError>;

    /// 删除早于 `retention_cutoff` 的终态任务以及所有已关闭类型的任务
    async fn delete_expired(&self, retention_cutoff: DateTime<Utc>)
        -> Result<u64, RepositoryError>;

    /// 以单条 INSERT … SELECT 为所有符合条件的仓库插入新任务，返回插入行数
    async fn insert_eligible_jobs(
        &self,
        config: &SignalConfiguration,
        index_interval: Duration,
        now: DateTime<Utc>,
    ) -> Result<u64, RepositoryError>;
}
