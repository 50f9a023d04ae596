// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::event_log::{EventLogReader, ViewEvent};
use crate::domain::services::InternalActor;
use crate::infrastructure::database::entities::event_log;
use anyhow::Result;
use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use std::sync::Arc;

/// 文件浏览事件名
pub const VIEW_BLOB_EVENT: &str = "ViewBlob";

/// 基于 `event_logs` 表的事件读取器
#[derive(Clone)]
pub struct EventLogRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl EventLogRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EventLogReader for EventLogRepositoryImpl {
    async fn view_events_after(
        &self,
        _actor: &InternalActor,
        repo_id: i32,
        after_id: i64,
        limit: u64,
    ) -> Result<Vec<ViewEvent>> {
        let rows = event_log::Entity::find()
            .filter(event_log::Column::Name.eq(VIEW_BLOB_EVENT))
            .filter(event_log::Column::RepoId.eq(repo_id))
            .filter(event_log::Column::Id.gt(after_id))
            .order_by_asc(event_log::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| ViewEvent {
                id: row.id,
                viewer_id: row.user_id,
                repo_id: row.repo_id,
                file_path: row.file_path,
                timestamp: row.timestamp.into(),
            })
            .collect())
    }
}
