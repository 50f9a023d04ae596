// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// 仓库的聚合归属统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OwnershipCounts {
    /// CODEOWNERS 覆盖的文件数
    pub codeowned: i32,
    /// 直接指派归属的文件数
    pub assigned_ownership: i32,
    /// 任一方式有归属的文件数
    pub total_owned: i32,
}

/// 一条提交者信号
#[derive(Debug, Clone, PartialEq)]
pub struct CommitRecord {
    pub repo_id: i32,
    pub author_name: String,
    pub author_email: String,
    pub timestamp: DateTime<Utc>,
    pub commit_sha: String,
    pub changed_files: Vec<String>,
}

/// 一组 (浏览者, 仓库, 路径) 的浏览次数增量
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewCount {
    pub viewer_id: i32,
    pub repo_id: i32,
    pub file_path: String,
    pub count: i64,
}

/// 书签推进条件，当前值仍为 `from` 时才推进到 `to`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookmarkAdvance {
    pub key: String,
    pub from: i64,
    pub to: i64,
}

/// 信号结果存储
///
/// 必需写入返回影响行数，0 表示目标仓库已不存在
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn update_file_counts(
        &self,
        repo_id: i32,
        total_count: i32,
        updated_at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError>;

    async fn update_aggregate_ownership_counts(
        &self,
        repo_id: i32,
        counts: OwnershipCounts,
        updated_at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError>;

    /// 清除仓库的提交者信号
    async fn clear_signals(&self, repo_id: i32) -> Result<(), RepositoryError>;

    async fn add_commit(&self, record: CommitRecord) -> Result<(), RepositoryError>;

    /// 在同一事务中累加浏览次数并推进书签
    ///
    /// 书签已被移动时不写入任何数据，返回 `false`
    async fn add_view_counts(
        &self,
        counts: &[ViewCount],
        advance: &BookmarkAdvance,
    ) -> Result<bool, RepositoryError>;

    /// 读取事件日志书签，从未写入时为 0
    async fn get_bookmark(&self, key: &str) -> Result<i64, RepositoryError>;
}
