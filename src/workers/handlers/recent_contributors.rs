// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use metrics::counter;
use tracing::debug;

use super::{sub_repo_gated, Collaborators, HandlerContext, JobHandler};
use crate::domain::models::signal::SignalKind;
use crate::domain::repositories::result_store::CommitRecord;
use crate::infrastructure::observability::metrics::COMMITS_INDEXED_TOTAL;
use crate::utils::errors::JobError;

const LOOKBACK_DAYS: i64 = 90;

/// 近期提交者信号
///
/// 先清除仓库已有信号，再写入回溯窗口内的每个提交
pub struct RecentContributorsHandler {
    collaborators: Arc<Collaborators>,
    lookback: Duration,
}

impl RecentContributorsHandler {
    pub fn new(collaborators: Arc<Collaborators>) -> Self {
        Self {
            collaborators,
            lookback: Duration::days(LOOKBACK_DAYS),
        }
    }
}

#[async_trait]
impl JobHandler for RecentContributorsHandler {
    fn kind(&self) -> SignalKind {
        SignalKind::RecentContributors
    }

    async fn handle(&self, ctx: &HandlerContext, repo_id: i32) -> Result<(), JobError> {
        let c = &self.collaborators;
        if sub_repo_gated(c, ctx, repo_id).await? {
            return Ok(());
        }

        let head = c.vcs.resolve_revision(&ctx.actor, repo_id, "HEAD").await?;
        let commits = c
            .vcs
            .commit_log(&ctx.actor, repo_id, Utc::now() - self.lookback)
            .await?;
        debug!("Indexing {} commits of repo {} at {}", commits.len(), repo_id, head);

        c.results.clear_signals(repo_id).await?;
        let indexed = commits.len() as u64;
        for commit in commits {
            c.results
                .add_commit(CommitRecord {
                    repo_id,
                    author_name: commit.author_name,
                    author_email: commit.author_email,
                    timestamp: commit.timestamp,
                    commit_sha: commit.sha,
                    changed_files: commit.changed_files,
                })
                .await?;
        }

        counter!(COMMITS_INDEXED_TOTAL).increment(indexed);
        Ok(())
    }
}
