// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::actor::InternalActor;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// 文件浏览事件
#[derive(Debug, Clone, PartialEq)]
pub struct ViewEvent {
    pub id: i64,
    pub viewer_id: i32,
    pub repo_id: i32,
    pub file_path: String,
    pub timestamp: DateTime<Utc>,
}

/// 事件日志读取
#[async_trait]
pub trait EventLogReader: Send + Sync {
    /// 按 id 升序读取仓库在 `after_id` 之后最多 `limit` 条浏览事件
    async fn view_events_after(
        &self,
        actor: &InternalActor,
        repo_id: i32,
        after_id: i64,
        limit: u64,
    ) -> Result<Vec<ViewEvent>>;
}
