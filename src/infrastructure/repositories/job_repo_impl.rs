// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{ExecutionLogEntry, Job, JobState};
use crate::domain::models::signal::SignalConfiguration;
use crate::domain::repositories::job_repository::{HeartbeatOutcome, JobQueueStore, ResetOutcome};
use crate::infrastructure::database::entities::{
    repo, signal_configuration, signal_job, signal_job_config_aware,
};
use crate::utils::errors::RepositoryError;
use crate::utils::retry_policy::RetryPolicy;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    sea_query::{Expr, LockBehavior, LockType, Query},
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
    Set, TransactionTrait,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const STALL_LOOP_MESSAGE: &str = "job processor died while handling this job too many times";

/// 队列行为参数
#[derive(Debug, Clone)]
pub struct QueueOptions {
    /// 卡住任务最多被重置的次数
    pub max_num_resets: i32,
    /// 失败重试与退避策略
    pub retry_policy: RetryPolicy,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            max_num_resets: 3,
            retry_policy: RetryPolicy::default(),
        }
    }
}

/// 任务队列仓库实现
///
/// 基于SeaORM实现，领取使用 `FOR UPDATE SKIP LOCKED`
#[derive(Clone)]
pub struct JobRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
    options: QueueOptions,
}

impl JobRepositoryImpl {
    /// 创建新的任务队列仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    /// * `options` - 重试与重置参数
    pub fn new(db: Arc<DatabaseConnection>, options: QueueOptions) -> Self {
        Self { db, options }
    }

    fn max_num_failures(&self) -> i32 {
        self.options.retry_policy.max_retries as i32
    }
}

fn now_fixed() -> DateTime<FixedOffset> {
    Utc::now().into()
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::milliseconds(duration.as_millis() as i64)
}

/// 将 glob 模式转换为 SQL LIKE 模式
pub(crate) fn glob_to_like(pattern: &str) -> String {
    pattern
        .chars()
        .map(|c| match c {
            '*' => '%',
            '?' => '_',
            other => other,
        })
        .collect()
}

fn parse_execution_logs(
    logs: Option<serde_json::Value>,
) -> Result<Vec<ExecutionLogEntry>, RepositoryError> {
    match logs {
        Some(value) => Ok(serde_json::from_value(value)?),
        None => Ok(Vec::new()),
    }
}

fn to_job(model: signal_job::Model, config_name: String) -> Result<Job, RepositoryError> {
    Ok(Job {
        id: model.id,
        repo_id: model.repo_id,
        config_id: model.config_id,
        config_name,
        state: model.state.parse().unwrap_or_default(),
        failure_message: model.failure_message,
        queued_at: model.queued_at,
        started_at: model.started_at,
        finished_at: model.finished_at,
        process_after: model.process_after,
        num_resets: model.num_resets,
        num_failures: model.num_failures,
        last_heartbeat_at: model.last_heartbeat_at,
        execution_logs: parse_execution_logs(model.execution_logs)?,
        worker_hostname: model.worker_hostname,
        cancel: model.cancel,
    })
}

fn states(states: &[JobState]) -> Vec<String> {
    states.iter().map(ToString::to_string).collect()
}

#[async_trait]
impl JobQueueStore for JobRepositoryImpl {
    async fn claim_next(&self, worker_hostname: &str) -> Result<Option<Job>, RepositoryError> {
        let now = now_fixed();
        let txn = self.db.begin().await?;

        let enabled_configs = Query::select()
            .column(signal_configuration::Column::Id)
            .from(signal_configuration::Entity)
            .and_where(signal_configuration::Column::Enabled.eq(true))
            .to_owned();

        let candidate = signal_job::Entity::find()
            .filter(
                Condition::any()
                    .add(signal_job::Column::State.eq(JobState::Queued.to_string()))
                    .add(
                        Condition::all()
                            .add(signal_job::Column::State.eq(JobState::Errored.to_string()))
                            .add(signal_job::Column::NumFailures.lt(self.max_num_failures())),
                    ),
            )
            .filter(
                Condition::any()
                    .add(signal_job::Column::ProcessAfter.is_null())
                    .add(signal_job::Column::ProcessAfter.lte(now)),
            )
            .filter(signal_job::Column::ConfigId.in_subquery(enabled_configs))
            .order_by_asc(signal_job::Column::Id)
            .lock_with_behavior(LockType::Update, LockBehavior::SkipLocked)
            .one(&txn)
            .await?;

        let Some(model) = candidate else {
            txn.commit().await?;
            return Ok(None);
        };

        let mut active: signal_job::ActiveModel = model.into();
        active.state = Set(JobState::Processing.to_string());
        active.started_at = Set(Some(now));
        active.last_heartbeat_at = Set(Some(now));
        active.finished_at = Set(None);
        active.failure_message = Set(None);
        active.worker_hostname = Set(worker_hostname.to_owned());
        let updated = active.update(&txn).await?;

        let config = signal_configuration::Entity::find_by_id(updated.config_id)
            .one(&txn)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        txn.commit().await?;

        Ok(Some(to_job(updated, config.name)?))
    }

    async fn heartbeat(&self, ids: &[i32]) -> Result<HeartbeatOutcome, RepositoryError> {
        if ids.is_empty() {
            return Ok(HeartbeatOutcome::default());
        }

        signal_job::Entity::update_many()
            .col_expr(signal_job::Column::LastHeartbeatAt, Expr::value(now_fixed()))
            .filter(signal_job::Column::Id.is_in(ids.to_vec()))
            .filter(signal_job::Column::State.eq(JobState::Processing.to_string()))
            .exec(self.db.as_ref())
            .await?;

        let held: Vec<(i32, bool)> = signal_job::Entity::find()
            .select_only()
            .column(signal_job::Column::Id)
            .column(signal_job::Column::Cancel)
            .filter(signal_job::Column::Id.is_in(ids.to_vec()))
            .filter(signal_job::Column::State.eq(JobState::Processing.to_string()))
            .order_by_asc(signal_job::Column::Id)
            .into_tuple()
            .all(self.db.as_ref())
            .await?;

        let mut outcome = HeartbeatOutcome::default();
        for (id, cancel) in held {
            outcome.known_ids.push(id);
            if cancel {
                outcome.cancel_ids.push(id);
            }
        }
        Ok(outcome)
    }

    async fn mark_completed(&self, id: i32) -> Result<bool, RepositoryError> {
        let result = signal_job::Entity::update_many()
            .col_expr(
                signal_job::Column::State,
                Expr::value(JobState::Completed.to_string()),
            )
            .col_expr(signal_job::Column::FinishedAt, Expr::value(now_fixed()))
            .filter(signal_job::Column::Id.eq(id))
            .filter(signal_job::Column::State.eq(JobState::Processing.to_string()))
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected > 0)
    }

    async fn mark_failed(&self, id: i32, message: &str) -> Result<bool, RepositoryError> {
        let now = Utc::now();
        let txn = self.db.begin().await?;

        let Some(model) = signal_job::Entity::find_by_id(id)
            .filter(signal_job::Column::State.eq(JobState::Processing.to_string()))
            .one(&txn)
            .await?
        else {
            txn.commit().await?;
            return Ok(false);
        };

        let failures = model.num_failures + 1;
        let policy = &self.options.retry_policy;
        let mut active: signal_job::ActiveModel = model.into();
        active.num_failures = Set(failures);
        active.finished_at = Set(Some(now.into()));
        active.failure_message = Set(Some(message.to_owned()));

        if policy.should_retry(failures as u32) {
            let retry_at = policy.next_retry_time(failures as u32, now);
            active.state = Set(JobState::Errored.to_string());
            active.process_after = Set(Some(retry_at.into()));
        } else {
            active.state = Set(JobState::Failed.to_string());
        }

        active.update(&txn).await?;
        txn.commit().await?;
        Ok(true)
    }

    async fn mark_errored_permanently(
        &self,
        id: i32,
        message: &str,
    ) -> Result<bool, RepositoryError> {
        let result = signal_job::Entity::update_many()
            .col_expr(
                signal_job::Column::State,
                Expr::value(JobState::Failed.to_string()),
            )
            .col_expr(signal_job::Column::FinishedAt, Expr::value(now_fixed()))
            .col_expr(
                signal_job::Column::FailureMessage,
                Expr::value(message.to_owned()),
            )
            .filter(signal_job::Column::Id.eq(id))
            .filter(signal_job::Column::State.eq(JobState::Processing.to_string()))
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected > 0)
    }

    async fn requeue(&self, id: i32, message: &str) -> Result<bool, RepositoryError> {
        let result = signal_job::Entity::update_many()
            .col_expr(
                signal_job::Column::State,
                Expr::value(JobState::Queued.to_string()),
            )
            .col_expr(
                signal_job::Column::StartedAt,
                Expr::value(Option::<DateTime<FixedOffset>>::None),
            )
            .col_expr(
                signal_job::Column::LastHeartbeatAt,
                Expr::value(Option::<DateTime<FixedOffset>>::None),
            )
            .col_expr(signal_job::Column::WorkerHostname, Expr::value(""))
            .col_expr(
                signal_job::Column::FailureMessage,
                Expr::value(message.to_owned()),
            )
            .filter(signal_job::Column::Id.eq(id))
            .filter(signal_job::Column::State.eq(JobState::Processing.to_string()))
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected > 0)
    }

    async fn add_execution_log_entry(
        &self,
        id: i32,
        entry: &ExecutionLogEntry,
    ) -> Result<(), RepositoryError> {
        let txn = self.db.begin().await?;

        let model = signal_job::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let mut logs = parse_execution_logs(model.execution_logs.clone())?;
        logs.push(entry.clone());

        let mut active: signal_job::ActiveModel = model.into();
        active.execution_logs = Set(Some(serde_json::to_value(&logs)?));
        active.update(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    async fn reset_stalled(&self, max_age: Duration) -> Result<ResetOutcome, RepositoryError> {
        let now = Utc::now();
        let threshold: DateTime<FixedOffset> = (now - to_chrono(max_age)).into();
        let txn = self.db.begin().await?;

        let stalled: Vec<(i32, i32)> = signal_job::Entity::find()
            .select_only()
            .column(signal_job::Column::Id)
            .column(signal_job::Column::NumResets)
            .filter(signal_job::Column::State.eq(JobState::Processing.to_string()))
            .filter(
                Condition::any()
                    .add(signal_job::Column::LastHeartbeatAt.lt(threshold))
                    .add(
                        Condition::all()
                            .add(signal_job::Column::LastHeartbeatAt.is_null())
                            .add(signal_job::Column::StartedAt.lt(threshold)),
                    ),
            )
            .order_by_asc(signal_job::Column::Id)
            .lock_with_behavior(LockType::Update, LockBehavior::SkipLocked)
            .into_tuple()
            .all(&txn)
            .await?;

        let mut outcome = ResetOutcome::default();
        for (id, num_resets) in stalled {
            if num_resets < self.options.max_num_resets {
                outcome.reset_ids.push(id);
            } else {
                outcome.failed_ids.push(id);
            }
        }

        if !outcome.reset_ids.is_empty() {
            signal_job::Entity::update_many()
                .col_expr(
                    signal_job::Column::State,
                    Expr::value(JobState::Queued.to_string()),
                )
                .col_expr(
                    signal_job::Column::StartedAt,
                    Expr::value(Option::<DateTime<FixedOffset>>::None),
                )
                .col_expr(
                    signal_job::Column::LastHeartbeatAt,
                    Expr::value(Option::<DateTime<FixedOffset>>::None),
                )
                .col_expr(
                    signal_job::Column::NumResets,
                    Expr::col(signal_job::Column::NumResets).add(1),
                )
                .col_expr(signal_job::Column::WorkerHostname, Expr::value(""))
                .filter(signal_job::Column::Id.is_in(outcome.reset_ids.clone()))
                .exec(&txn)
                .await?;
        }

        if !outcome.failed_ids.is_empty() {
            signal_job::Entity::update_many()
                .col_expr(
                    signal_job::Column::State,
                    Expr::value(JobState::Failed.to_string()),
                )
                .col_expr(
                    signal_job::Column::FinishedAt,
                    Expr::value(DateTime::<FixedOffset>::from(now)),
                )
                .col_expr(
                    signal_job::Column::FailureMessage,
                    Expr::value(STALL_LOOP_MESSAGE),
                )
                .filter(signal_job::Column::Id.is_in(outcome.failed_ids.clone()))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;
        Ok(outcome)
    }

    async fn queued_count(&self, job_type: &str) -> Result<u64, RepositoryError> {
        let count = signal_job_config_aware::Entity::find()
            .filter(signal_job_config_aware::Column::ConfigName.eq(job_type))
            .filter(
                signal_job_config_aware::Column::State
                    .is_in(states(&[JobState::Queued, JobState::Errored])),
            )
            .count(self.db.as_ref())
            .await?;

        Ok(count)
    }

    async fn job_counts_by_type(&self) -> Result<HashMap<String, u64>, RepositoryError> {
        let rows: Vec<(String, i64)> = signal_job::Entity::find()
            .select_only()
            .column(signal_configuration::Column::Name)
            .column_as(
                Expr::col((signal_job::Entity, signal_job::Column::Id)).count(),
                "job_count",
            )
            .join(
                JoinType::InnerJoin,
                signal_job::Relation::SignalConfiguration.def(),
            )
            .group_by(signal_configuration::Column::Name)
            .into_tuple()
            .all(self.db.as_ref())
            .await?;

        Ok(rows
            .into_iter()
            .map(|(name, count)| (name, count.max(0) as u64))
            .collect())
    }

    async fn delete_expired(
        &self,
        retention_cutoff: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let cutoff: DateTime<FixedOffset> = retention_cutoff.into();

        let disabled_configs = Query::select()
            .column(signal_configuration::Column::Id)
            .from(signal_configuration::Entity)
            .and_where(signal_configuration::Column::Enabled.eq(false))
            .to_owned();

        let result = signal_job::Entity::delete_many()
            .filter(
                Condition::any()
                    .add(
                        Condition::all()
                            .add(
                                signal_job::Column::State
                                    .is_in(states(&[JobState::Completed, JobState::Failed])),
                            )
                            .add(signal_job::Column::FinishedAt.lt(cutoff)),
                    )
                    .add(signal_job::Column::ConfigId.in_subquery(disabled_configs)),
            )
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected)
    }

    async fn insert_eligible_jobs(
        &self,
        config: &SignalConfiguration,
        index_interval: Duration,
        now: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let queued_at: DateTime<FixedOffset> = now.into();
        let window_start: DateTime<FixedOffset> = (now - to_chrono(index_interval)).into();

        // 仍在处理中，或在索引间隔内刚结束的仓库
        let ineligible = Query::select()
            .column(signal_job::Column::RepoId)
            .from(signal_job::Entity)
            .cond_where(
                Condition::all()
                    .add(signal_job::Column::ConfigId.eq(config.id))
                    .add(
                        Condition::any()
                            .add(signal_job::Column::State.is_in(states(&[
                                JobState::Queued,
                                JobState::Processing,
                                JobState::Errored,
                            ])))
                            .add(
                                Condition::all()
                                    .add(
                                        signal_job::Column::State.is_in(states(&[
                                            JobState::Completed,
                                            JobState::Failed,
                                        ])),
                                    )
                                    .add(signal_job::Column::FinishedAt.gt(window_start)),
                            ),
                    ),
            )
            .to_owned();

        let mut eligible = Condition::all()
            .add(repo::Column::Cloned.eq(true))
            .add(repo::Column::DeletedAt.is_null())
            .add(repo::Column::Id.not_in_subquery(ineligible));
        for pattern in &config.excluded_repo_patterns {
            eligible = eligible.add(repo::Column::Name.not_like(glob_to_like(pattern)));
        }

        let select = Query::select()
            .column((repo::Entity, repo::Column::Id))
            .expr(Expr::val(config.id))
            .expr(Expr::val(JobState::Queued.to_string()))
            .expr(Expr::val(queued_at))
            .from(repo::Entity)
            .cond_where(eligible)
            .order_by((repo::Entity, repo::Column::Id), sea_orm::Order::Asc)
            .to_owned();

        let mut insert = Query::insert();
        insert
            .into_table(signal_job::Entity)
            .columns([
                signal_job::Column::RepoId,
                signal_job::Column::ConfigId,
                signal_job::Column::State,
                signal_job::Column::QueuedAt,
            ])
            .select_from(select)
            .map_err(|e| DbErr::Custom(e.to_string()))?;

        let backend = self.db.get_database_backend();
        let result = self.db.execute(backend.build(&insert)).await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
#[path = "job_repo_impl_test.rs"]
mod tests;
