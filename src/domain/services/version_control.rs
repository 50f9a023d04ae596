// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::actor::InternalActor;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// 提交日志中的一条记录
#[derive(Debug, Clone, PartialEq)]
pub struct CommitEntry {
    pub author_name: String,
    pub author_email: String,
    pub timestamp: DateTime<Utc>,
    pub sha: String,
    pub changed_files: Vec<String>,
}

/// 版本控制客户端
#[async_trait]
pub trait VersionControlClient: Send + Sync {
    /// 列出某个提交下的所有文件路径
    async fn list_files(
        &self,
        actor: &InternalActor,
        repo_id: i32,
        commit: &str,
    ) -> Result<Vec<String>>;

    /// 将修订名（如 `HEAD`）解析为提交ID
    async fn resolve_revision(
        &self,
        actor: &InternalActor,
        repo_id: i32,
        revision: &str,
    ) -> Result<String>;

    /// 读取 `since` 之后的提交日志
    async fn commit_log(
        &self,
        actor: &InternalActor,
        repo_id: i32,
        since: DateTime<Utc>,
    ) -> Result<Vec<CommitEntry>>;

    /// 读取文件内容，文件不存在时返回 `None`
    async fn read_file(
        &self,
        actor: &InternalActor,
        repo_id: i32,
        commit: &str,
        path: &str,
    ) -> Result<Option<Vec<u8>>>;
}
