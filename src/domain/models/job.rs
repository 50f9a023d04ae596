// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 信号索引任务
///
/// 每一行代表一个 (信号类型, 仓库) 的调度单元。`repo_id` 为分区键，
/// `config_name` 为所属信号配置的逻辑名称，决定由哪个处理器执行。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// 自增ID，也是先进先出的排序键
    pub id: i32,
    /// 目标仓库
    pub repo_id: i32,
    /// 所属信号配置ID
    pub config_id: i32,
    /// 所属信号配置名称
    pub config_name: String,
    /// 当前状态
    pub state: JobState,
    /// 最近一次失败信息
    pub failure_message: Option<String>,
    pub queued_at: DateTime<FixedOffset>,
    pub started_at: Option<DateTime<FixedOffset>>,
    pub finished_at: Option<DateTime<FixedOffset>>,
    /// 重试退避：在此时间之前不可被领取
    pub process_after: Option<DateTime<FixedOffset>>,
    /// 被回收器从卡住状态重置的次数
    pub num_resets: i32,
    /// 执行失败次数
    pub num_failures: i32,
    pub last_heartbeat_at: Option<DateTime<FixedOffset>>,
    /// 每次执行尝试的记录
    pub execution_logs: Vec<ExecutionLogEntry>,
    /// 当前持有该任务的工作节点
    pub worker_hostname: String,
    /// 外部取消标志
    pub cancel: bool,
}

/// 任务状态
///
/// queued → processing → completed / failed / errored；
/// errored 在退避结束后可被重新领取，processing 可被回收器重置为 queued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    #[default]
    Queued,
    Processing,
    /// 执行失败，等待退避后重试
    Errored,
    Completed,
    Failed,
}

impl JobState {
    /// 终态（只会被清理器删除）
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Queued => "queued",
            JobState::Processing => "processing",
            JobState::Errored => "errored",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobState {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(JobState::Queued),
            "processing" => Ok(JobState::Processing),
            "errored" => Ok(JobState::Errored),
            "completed" => Ok(JobState::Completed),
            "failed" => Ok(JobState::Failed),
            _ => Err(()),
        }
    }
}

/// 单次执行尝试的记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionLogEntry {
    pub key: String,
    pub command: Vec<String>,
    pub start_time: DateTime<Utc>,
    pub exit_code: Option<i32>,
    pub out: String,
    pub duration_ms: Option<i64>,
}
