// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use tracing::debug;

use super::{sub_repo_gated, Collaborators, HandlerContext, JobHandler};
use crate::domain::models::signal::SignalKind;
use crate::domain::repositories::result_store::{BookmarkAdvance, ViewCount};
use crate::domain::services::event_log::ViewEvent;
use crate::infrastructure::observability::metrics::EVENTS_INDEXED_TOTAL;
use crate::utils::errors::JobError;

const BATCH_SIZE: u64 = 5000;

/// 近期浏览信号
///
/// 每个任务只处理自身仓库的浏览事件，书签按仓库分别保存，
/// 每批的计数累加与书签推进在同一事务中提交
pub struct RecentViewsHandler {
    collaborators: Arc<Collaborators>,
    batch_size: u64,
}

impl RecentViewsHandler {
    pub fn new(collaborators: Arc<Collaborators>) -> Self {
        Self {
            collaborators,
            batch_size: BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: u64) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// 仓库的事件日志书签键
    pub fn bookmark_key(repo_id: i32) -> String {
        format!("{}:{}", SignalKind::RecentViews.name(), repo_id)
    }
}

fn aggregate(events: &[ViewEvent]) -> Vec<ViewCount> {
    let mut counts: BTreeMap<(i32, i32, &str), i64> = BTreeMap::new();
    for event in events {
        *counts
            .entry((event.viewer_id, event.repo_id, event.file_path.as_str()))
            .or_default() += 1;
    }

    counts
        .into_iter()
        .map(|((viewer_id, repo_id, file_path), count)| ViewCount {
            viewer_id,
            repo_id,
            file_path: file_path.to_string(),
            count,
        })
        .collect()
}

#[async_trait]
impl JobHandler for RecentViewsHandler {
    fn kind(&self) -> SignalKind {
        SignalKind::RecentViews
    }

    async fn handle(&self, ctx: &HandlerContext, repo_id: i32) -> Result<(), JobError> {
        let c = &self.collaborators;
        if sub_repo_gated(c, ctx, repo_id).await? {
            return Ok(());
        }

        let key = Self::bookmark_key(repo_id);
        let mut bookmark = c.results.get_bookmark(&key).await?;

        loop {
            if ctx.cancel.is_cancelled() {
                return Err(JobError::Retryable("recent views indexing cancelled".into()));
            }

            let events = c
                .events
                .view_events_after(&ctx.actor, repo_id, bookmark, self.batch_size)
                .await?;
            let Some(last) = events.last().map(|event| event.id) else {
                break;
            };

            let advance = BookmarkAdvance {
                key: key.clone(),
                from: bookmark,
                to: last,
            };
            if !c.results.add_view_counts(&aggregate(&events), &advance).await? {
                debug!(repo_id, "Bookmark {} moved by a concurrent job, stopping", key);
                break;
            }

            debug!("Indexed {} view events up to {}", events.len(), last);
            counter!(EVENTS_INDEXED_TOTAL).increment(events.len() as u64);
            bookmark = last;

            if (events.len() as u64) < self.batch_size {
                break;
            }
        }

        Ok(())
    }
}
