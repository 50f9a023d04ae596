// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::DbErr;
use thiserror::Error;

/// 仓库层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
    /// 信号配置不存在
    #[error("Signal configuration not found: {0}")]
    ConfigurationNotFound(String),
    /// JSON 列反序列化失败
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// 任务执行错误
///
/// `is_retryable` 决定工作池把失败的任务送回重试路径还是直接置为终态
#[derive(Error, Debug)]
pub enum JobError {
    /// 不可重试的错误（输入数据损坏、权限永久拒绝等）
    #[error("non-retryable: {0}")]
    NonRetryable(String),

    /// 可重试的瞬时错误
    #[error("retryable: {0}")]
    Retryable(String),

    /// 等待限流令牌时被取消
    #[error("rate limiter wait cancelled")]
    RateLimiterCancelled,

    /// 未注册的任务类型
    #[error("unknown job type: {0}")]
    UnknownJobType(String),

    /// 必需的写入没有影响任何行（目标仓库已被删除）
    #[error("no rows affected writing {what} for repo {repo_id}")]
    NoRowsAffected { repo_id: i32, what: &'static str },

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// 外部协作者（版本控制、权限、事件日志）返回的错误
    #[error("collaborator error: {0}")]
    Collaborator(#[from] anyhow::Error),
}

impl JobError {
    /// 是否应当走有限重试路径
    pub fn is_retryable(&self) -> bool {
        match self {
            JobError::NonRetryable(_) | JobError::UnknownJobType(_) => false,
            JobError::Repository(RepositoryError::ConfigurationNotFound(_)) => false,
            JobError::Repository(RepositoryError::Serialization(_)) => false,
            _ => true,
        }
    }
}

/// Worker错误类型
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("仓库错误: {0}")]
    RepositoryError(#[from] RepositoryError),

    #[error("任务错误: {0}")]
    JobError(#[from] JobError),

    #[error("内部错误: {0}")]
    InternalError(String),
}
