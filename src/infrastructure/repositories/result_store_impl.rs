// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::result_store::{
    BookmarkAdvance, CommitRecord, OwnershipCounts, ResultStore, ViewCount,
};
use crate::infrastructure::database::entities::{
    commit_signal, event_log_bookmark, recent_view_signal, repo, repo_file_stats,
};
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    sea_query::{Expr, OnConflict, Query},
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use std::sync::Arc;

/// 信号结果仓库实现
///
/// 统计写入使用 `INSERT … SELECT FROM repos WHERE id = ?`，仓库不存在时影响 0 行
#[derive(Clone)]
pub struct ResultStoreImpl {
    db: Arc<DatabaseConnection>,
}

impl ResultStoreImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// 书签仍为 `advance.from` 时推进到 `advance.to`
    ///
    /// 并发的推进者只有一个能命中条件，其余影响 0 行
    async fn advance_bookmark<C: ConnectionTrait>(
        conn: &C,
        advance: &BookmarkAdvance,
    ) -> Result<bool, RepositoryError> {
        let now: DateTime<FixedOffset> = Utc::now().into();
        let rows = if advance.from == 0 {
            let model = event_log_bookmark::ActiveModel {
                signal_name: Set(advance.key.clone()),
                bookmark_id: Set(advance.to),
                updated_at: Set(now),
            };
            event_log_bookmark::Entity::insert(model)
                .on_conflict(
                    OnConflict::column(event_log_bookmark::Column::SignalName)
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(conn)
                .await?
        } else {
            event_log_bookmark::Entity::update_many()
                .col_expr(event_log_bookmark::Column::BookmarkId, Expr::value(advance.to))
                .col_expr(event_log_bookmark::Column::UpdatedAt, Expr::value(now))
                .filter(event_log_bookmark::Column::SignalName.eq(advance.key.as_str()))
                .filter(event_log_bookmark::Column::BookmarkId.eq(advance.from))
                .exec(conn)
                .await?
                .rows_affected
        };
        Ok(rows == 1)
    }

    /// 以仓库行为来源写入 `repo_file_stats`，冲突时更新指定列
    async fn upsert_stats(
        &self,
        repo_id: i32,
        columns: Vec<(repo_file_stats::Column, sea_orm::Value)>,
    ) -> Result<u64, RepositoryError> {
        let mut select = Query::select();
        select
            .column((repo::Entity, repo::Column::Id))
            .from(repo::Entity)
            .and_where(repo::Column::Id.eq(repo_id));

        let mut insert_columns = vec![repo_file_stats::Column::RepoId];
        let mut update_columns = Vec::with_capacity(columns.len());
        for (column, value) in columns {
            select.expr(Expr::val(value));
            insert_columns.push(column);
            update_columns.push(column);
        }

        let mut insert = Query::insert();
        insert
            .into_table(repo_file_stats::Entity)
            .columns(insert_columns)
            .select_from(select)
            .map_err(|e| DbErr::Custom(e.to_string()))?
            .on_conflict(
                OnConflict::column(repo_file_stats::Column::RepoId)
                    .update_columns(update_columns)
                    .to_owned(),
            );

        let backend = self.db.get_database_backend();
        let result = self.db.execute(backend.build(&insert)).await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ResultStore for ResultStoreImpl {
    async fn update_file_counts(
        &self,
        repo_id: i32,
        total_count: i32,
        updated_at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let updated_at: DateTime<FixedOffset> = updated_at.into();
        self.upsert_stats(
            repo_id,
            vec![
                (repo_file_stats::Column::TotalFileCount, total_count.into()),
                (repo_file_stats::Column::FileCountsUpdatedAt, updated_at.into()),
            ],
        )
        .await
    }

    async fn update_aggregate_ownership_counts(
        &self,
        repo_id: i32,
        counts: OwnershipCounts,
        updated_at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let updated_at: DateTime<FixedOffset> = updated_at.into();
        self.upsert_stats(
            repo_id,
            vec![
                (
                    repo_file_stats::Column::CodeownedFileCount,
                    counts.codeowned.into(),
                ),
                (
                    repo_file_stats::Column::AssignedOwnershipFileCount,
                    counts.assigned_ownership.into(),
                ),
                (
                    repo_file_stats::Column::TotalOwnedFileCount,
                    counts.total_owned.into(),
                ),
                (
                    repo_file_stats::Column::OwnershipCountsUpdatedAt,
                    updated_at.into(),
                ),
            ],
        )
        .await
    }

    async fn clear_signals(&self, repo_id: i32) -> Result<(), RepositoryError> {
        commit_signal::Entity::delete_many()
            .filter(commit_signal::Column::RepoId.eq(repo_id))
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }

    async fn add_commit(&self, record: CommitRecord) -> Result<(), RepositoryError> {
        let model = commit_signal::ActiveModel {
            repo_id: Set(record.repo_id),
            author_name: Set(record.author_name),
            author_email: Set(record.author_email),
            committed_at: Set(record.timestamp.into()),
            commit_sha: Set(record.commit_sha),
            changed_file_paths: Set(serde_json::to_value(record.changed_files)?),
            ..Default::default()
        };
        commit_signal::Entity::insert(model)
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }

    async fn add_view_counts(
        &self,
        counts: &[ViewCount],
        advance: &BookmarkAdvance,
    ) -> Result<bool, RepositoryError> {
        let txn = self.db.begin().await?;
        if !Self::advance_bookmark(&txn, advance).await? {
            txn.rollback().await?;
            return Ok(false);
        }

        for count in counts {
            let model = recent_view_signal::ActiveModel {
                viewer_id: Set(count.viewer_id),
                repo_id: Set(count.repo_id),
                file_path: Set(count.file_path.clone()),
                views_count: Set(count.count),
                ..Default::default()
            };
            recent_view_signal::Entity::insert(model)
                .on_conflict(
                    OnConflict::columns([
                        recent_view_signal::Column::ViewerId,
                        recent_view_signal::Column::RepoId,
                        recent_view_signal::Column::FilePath,
                    ])
                    .value(
                        recent_view_signal::Column::ViewsCount,
                        Expr::cust("recent_view_signals.views_count + excluded.views_count"),
                    )
                    .to_owned(),
                )
                .exec_without_returning(&txn)
                .await?;
        }
        txn.commit().await?;
        Ok(true)
    }

    async fn get_bookmark(&self, key: &str) -> Result<i64, RepositoryError> {
        let bookmark = event_log_bookmark::Entity::find_by_id(key.to_owned())
            .one(self.db.as_ref())
            .await?;
        Ok(bookmark.map(|b| b.bookmark_id).unwrap_or(0))
    }
}
