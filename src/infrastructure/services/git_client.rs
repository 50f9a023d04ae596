// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sea_orm::{DatabaseConnection, EntityTrait};
use tokio::process::Command;

use crate::domain::services::version_control::{CommitEntry, VersionControlClient};
use crate::domain::services::InternalActor;
use crate::infrastructure::database::entities::repo;

const RECORD_SEPARATOR: char = '\u{1e}';
const FIELD_SEPARATOR: char = '\u{1f}';

/// 基于 git 命令行的版本控制客户端
///
/// 仓库克隆位于 `{repos_root}/{repo.name}`
#[derive(Clone)]
pub struct GitCliClient {
    db: Arc<DatabaseConnection>,
    repos_root: PathBuf,
}

impl GitCliClient {
    pub fn new(db: Arc<DatabaseConnection>, repos_root: impl Into<PathBuf>) -> Self {
        Self {
            db,
            repos_root: repos_root.into(),
        }
    }

    async fn repo_dir(&self, repo_id: i32) -> Result<PathBuf> {
        let repo = repo::Entity::find_by_id(repo_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| anyhow!("repo {} not found", repo_id))?;
        Ok(self.repos_root.join(repo.name))
    }

    async fn git(&self, repo_id: i32, args: &[&str]) -> Result<std::process::Output> {
        let dir = self.repo_dir(repo_id).await?;
        Command::new("git")
            .arg("-C")
            .arg(&dir)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("failed to run git in {}", dir.display()))
    }

    async fn git_stdout(&self, repo_id: i32, args: &[&str]) -> Result<String> {
        let output = self.git(repo_id, args).await?;
        if !output.status.success() {
            bail!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// 解析 `git log --format=%x1e%H%x1f%an%x1f%ae%x1f%cI --name-only` 的输出
fn parse_commit_log(raw: &str) -> Result<Vec<CommitEntry>> {
    raw.split(RECORD_SEPARATOR)
        .filter(|record| !record.trim().is_empty())
        .map(|record| {
            let mut lines = record.lines();
            let header = lines.next().unwrap_or_default();
            let fields: Vec<&str> = header.split(FIELD_SEPARATOR).collect();
            let [sha, name, email, date] = fields[..] else {
                bail!("malformed commit header: {:?}", header);
            };
            let timestamp = DateTime::parse_from_rfc3339(date)
                .with_context(|| format!("bad commit date {:?}", date))?
                .with_timezone(&Utc);

            Ok(CommitEntry {
                author_name: name.to_string(),
                author_email: email.to_string(),
                timestamp,
                sha: sha.to_string(),
                changed_files: lines
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(ToString::to_string)
                    .collect(),
            })
        })
        .collect()
}

#[async_trait]
impl VersionControlClient for GitCliClient {
    async fn list_files(
        &self,
        _actor: &InternalActor,
        repo_id: i32,
        commit: &str,
    ) -> Result<Vec<String>> {
        let out = self
            .git_stdout(repo_id, &["ls-tree", "-r", "-z", "--name-only", commit])
            .await?;
        Ok(out
            .split('\0')
            .filter(|path| !path.is_empty())
            .map(ToString::to_string)
            .collect())
    }

    async fn resolve_revision(
        &self,
        _actor: &InternalActor,
        repo_id: i32,
        revision: &str,
    ) -> Result<String> {
        let spec = format!("{}^{{commit}}", revision);
        let out = self
            .git_stdout(repo_id, &["rev-parse", "--verify", &spec])
            .await?;
        Ok(out.trim().to_string())
    }

    async fn commit_log(
        &self,
        _actor: &InternalActor,
        repo_id: i32,
        since: DateTime<Utc>,
    ) -> Result<Vec<CommitEntry>> {
        let since = format!("--since={}", since.to_rfc3339_opts(SecondsFormat::Secs, true));
        let out = self
            .git_stdout(
                repo_id,
                &[
                    "log",
                    &since,
                    "--format=%x1e%H%x1f%an%x1f%ae%x1f%cI",
                    "--name-only",
                    "HEAD",
                ],
            )
            .await?;
        parse_commit_log(&out)
    }

    async fn read_file(
        &self,
        _actor: &InternalActor,
        repo_id: i32,
        commit: &str,
        path: &str,
    ) -> Result<Option<Vec<u8>>> {
        let object = format!("{}:{}", commit, path);
        let output = self.git(repo_id, &["show", &object]).await?;
        if output.status.success() {
            return Ok(Some(output.stdout));
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("does not exist") || stderr.contains("exists on disk, but not in") {
            return Ok(None);
        }
        bail!("git show {} failed: {}", object, stderr.trim())
    }
}
