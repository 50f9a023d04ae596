// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use migration::{Migrator, MigratorTrait};
use ownsignals::config::settings::DatabaseSettings;
use ownsignals::domain::services::ownership::{
    AssigneeMatcher, NoAssignments, OwnershipResolver, Ruleset,
};
use ownsignals::domain::services::version_control::{CommitEntry, VersionControlClient};
use ownsignals::domain::services::InternalActor;
use ownsignals::infrastructure::database::connection::create_pool;
use ownsignals::infrastructure::database::entities::{event_log, repo, signal_configuration};
use ownsignals::infrastructure::repositories::event_log_repo_impl::{
    EventLogRepositoryImpl, VIEW_BLOB_EVENT,
};
use ownsignals::infrastructure::repositories::result_store_impl::ResultStoreImpl;
use ownsignals::infrastructure::services::codeowners::CodeownersResolver;
use ownsignals::infrastructure::services::permission_checker_impl::StaticPermissionChecker;
use ownsignals::workers::handlers::Collaborators;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

pub const HEAD: &str = "0123456789abcdef0123456789abcdef01234567";

pub async fn setup_db() -> Arc<DatabaseConnection> {
    let settings = DatabaseSettings {
        url: "sqlite::memory:".to_string(),
        max_connections: None,
        min_connections: None,
        connect_timeout: None,
        idle_timeout: None,
    };
    let db = Arc::new(create_pool(&settings).await.unwrap());
    Migrator::up(db.as_ref(), None).await.unwrap();
    db
}

pub async fn insert_repo(db: &DatabaseConnection, name: &str, cloned: bool) -> i32 {
    repo::ActiveModel {
        name: Set(name.to_string()),
        cloned: Set(cloned),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
    .id
}

pub async fn config_id(db: &DatabaseConnection, name: &str) -> i32 {
    signal_configuration::Entity::find()
        .filter(signal_configuration::Column::Name.eq(name))
        .one(db)
        .await
        .unwrap()
        .unwrap()
        .id
}

pub async fn insert_view_event(db: &DatabaseConnection, viewer: i32, repo_id: i32, path: &str) {
    event_log::ActiveModel {
        name: Set(VIEW_BLOB_EVENT.to_string()),
        user_id: Set(viewer),
        repo_id: Set(repo_id),
        file_path: Set(path.to_string()),
        timestamp: Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();
}

/// 内存中的版本控制数据
#[derive(Default)]
pub struct FakeVcs {
    pub files: HashMap<i32, Vec<String>>,
    pub contents: HashMap<(i32, String), String>,
    pub commits: HashMap<i32, Vec<CommitEntry>>,
    pub missing: HashSet<i32>,
}

impl FakeVcs {
    pub fn with_files(mut self, repo_id: i32, files: &[&str]) -> Self {
        self.files
            .insert(repo_id, files.iter().map(ToString::to_string).collect());
        self
    }

    pub fn with_file_content(mut self, repo_id: i32, path: &str, content: &str) -> Self {
        self.contents
            .insert((repo_id, path.to_string()), content.to_string());
        self
    }

    /// 该仓库的所有访问都返回错误
    pub fn with_missing_repo(mut self, repo_id: i32) -> Self {
        self.missing.insert(repo_id);
        self
    }

    pub fn with_commit(mut self, repo_id: i32, sha: &str, author: &str, files: &[&str]) -> Self {
        self.commits.entry(repo_id).or_default().push(CommitEntry {
            author_name: author.to_string(),
            author_email: format!("{}@example.com", author.to_lowercase()),
            timestamp: Utc::now() - chrono::Duration::days(1),
            sha: sha.to_string(),
            changed_files: files.iter().map(ToString::to_string).collect(),
        });
        self
    }
}

#[async_trait]
impl VersionControlClient for FakeVcs {
    async fn list_files(
        &self,
        _actor: &InternalActor,
        repo_id: i32,
        _commit: &str,
    ) -> Result<Vec<String>> {
        Ok(self.files.get(&repo_id).cloned().unwrap_or_default())
    }

    async fn resolve_revision(
        &self,
        _actor: &InternalActor,
        repo_id: i32,
        revision: &str,
    ) -> Result<String> {
        if self.missing.contains(&repo_id) {
            Err(anyhow!("repo {} is not cloned on this host", repo_id))
        } else if revision == "HEAD" {
            Ok(HEAD.to_string())
        } else {
            Err(anyhow!("unknown revision {} in repo {}", revision, repo_id))
        }
    }

    async fn commit_log(
        &self,
        _actor: &InternalActor,
        repo_id: i32,
        since: DateTime<Utc>,
    ) -> Result<Vec<CommitEntry>> {
        Ok(self
            .commits
            .get(&repo_id)
            .map(|commits| {
                commits
                    .iter()
                    .filter(|c| c.timestamp >= since)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn read_file(
        &self,
        _actor: &InternalActor,
        repo_id: i32,
        _commit: &str,
        path: &str,
    ) -> Result<Option<Vec<u8>>> {
        Ok(self
            .contents
            .get(&(repo_id, path.to_string()))
            .map(|content| content.as_bytes().to_vec()))
    }
}

/// 按路径集合返回被指派人的匹配器
pub struct AssignedPaths(pub HashSet<String>);

impl AssigneeMatcher for AssignedPaths {
    fn match_path(&self, path: &str) -> Vec<String> {
        if self.0.contains(path) {
            vec!["assignee".to_string()]
        } else {
            Vec::new()
        }
    }
}

/// CODEOWNERS 规则加上固定的直接指派
pub struct FakeOwnership {
    pub codeowners: CodeownersResolver,
    pub assigned: HashSet<String>,
}

#[async_trait]
impl OwnershipResolver for FakeOwnership {
    async fn ruleset_for_repo(
        &self,
        actor: &InternalActor,
        repo_id: i32,
        commit: &str,
    ) -> Result<Option<Box<dyn Ruleset>>> {
        self.codeowners.ruleset_for_repo(actor, repo_id, commit).await
    }

    async fn assigned_ownership(
        &self,
        _actor: &InternalActor,
        _repo_id: i32,
        _commit: &str,
    ) -> Result<Box<dyn AssigneeMatcher>> {
        Ok(Box::new(AssignedPaths(self.assigned.clone())))
    }

    async fn assigned_teams(
        &self,
        _actor: &InternalActor,
        _repo_id: i32,
        _commit: &str,
    ) -> Result<Box<dyn AssigneeMatcher>> {
        Ok(Box::new(NoAssignments))
    }
}

/// 使用真实的结果与事件日志存储、内存版本控制数据构造协作者
pub fn collaborators(
    db: &Arc<DatabaseConnection>,
    vcs: FakeVcs,
    assigned: &[&str],
    sub_repo_enabled: &[i32],
) -> Arc<Collaborators> {
    let vcs: Arc<dyn VersionControlClient> = Arc::new(vcs);
    Arc::new(Collaborators {
        ownership: Arc::new(FakeOwnership {
            codeowners: CodeownersResolver::new(vcs.clone()),
            assigned: assigned.iter().map(ToString::to_string).collect(),
        }),
        vcs,
        permissions: Arc::new(StaticPermissionChecker::new(sub_repo_enabled.iter().copied())),
        results: Arc::new(ResultStoreImpl::new(db.clone())),
        events: Arc::new(EventLogRepositoryImpl::new(db.clone())),
    })
}
