// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use metrics::counter;

use super::{sub_repo_gated, Collaborators, HandlerContext, JobHandler};
use crate::domain::models::signal::SignalKind;
use crate::domain::repositories::result_store::OwnershipCounts;
use crate::domain::services::ownership::{AssigneeMatcher, Ruleset};
use crate::infrastructure::observability::metrics::FILES_INDEXED_TOTAL;
use crate::utils::errors::JobError;

/// 文件数与归属统计
pub struct AnalyticsHandler {
    collaborators: Arc<Collaborators>,
}

impl AnalyticsHandler {
    pub fn new(collaborators: Arc<Collaborators>) -> Self {
        Self { collaborators }
    }
}

/// 统计代码归属、指派归属与总归属文件数
///
/// 匹配规则至少有一个所有者即为代码归属；任一指派匹配器返回结果即为指派归属
pub fn count_ownership(
    files: &[String],
    ruleset: Option<&dyn Ruleset>,
    assigned_owners: &dyn AssigneeMatcher,
    assigned_teams: &dyn AssigneeMatcher,
) -> OwnershipCounts {
    let mut counts = OwnershipCounts::default();
    for path in files {
        let codeowned = ruleset
            .and_then(|rules| rules.match_path(path))
            .is_some_and(|rule| !rule.owners().is_empty());
        let assigned = !assigned_owners.match_path(path).is_empty()
            || !assigned_teams.match_path(path).is_empty();

        if codeowned {
            counts.codeowned += 1;
        }
        if assigned {
            counts.assigned_ownership += 1;
        }
        if codeowned || assigned {
            counts.total_owned += 1;
        }
    }
    counts
}

#[async_trait]
impl JobHandler for AnalyticsHandler {
    fn kind(&self) -> SignalKind {
        SignalKind::Analytics
    }

    async fn handle(&self, ctx: &HandlerContext, repo_id: i32) -> Result<(), JobError> {
        let c = &self.collaborators;
        if sub_repo_gated(c, ctx, repo_id).await? {
            return Ok(());
        }

        let commit = c.vcs.resolve_revision(&ctx.actor, repo_id, "HEAD").await?;
        let files = c.vcs.list_files(&ctx.actor, repo_id, &commit).await?;
        let total = i32::try_from(files.len())
            .map_err(|_| JobError::NonRetryable(format!("too many files: {}", files.len())))?;
        let now = Utc::now();

        if c.results.update_file_counts(repo_id, total, now).await? == 0 {
            return Err(JobError::NoRowsAffected {
                repo_id,
                what: "file counts",
            });
        }

        let ruleset = c.ownership.ruleset_for_repo(&ctx.actor, repo_id, &commit).await?;
        let assigned_owners = c
            .ownership
            .assigned_ownership(&ctx.actor, repo_id, &commit)
            .await?;
        let assigned_teams = c.ownership.assigned_teams(&ctx.actor, repo_id, &commit).await?;

        let counts = count_ownership(
            &files,
            ruleset.as_deref(),
            assigned_owners.as_ref(),
            assigned_teams.as_ref(),
        );
        if c
            .results
            .update_aggregate_ownership_counts(repo_id, counts, now)
            .await?
            == 0
        {
            return Err(JobError::NoRowsAffected {
                repo_id,
                what: "ownership counts",
            });
        }

        counter!(FILES_INDEXED_TOTAL).increment(files.len() as u64);
        Ok(())
    }
}
