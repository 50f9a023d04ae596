// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::actor::InternalActor;
use anyhow::Result;
use async_trait::async_trait;

/// 匹配到的归属规则
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rule {
    owners: Vec<String>,
}

impl Rule {
    pub fn new(owners: Vec<String>) -> Self {
        Self { owners }
    }

    pub fn owners(&self) -> &[String] {
        &self.owners
    }
}

/// CODEOWNERS 规则集
pub trait Ruleset: Send + Sync {
    /// 返回匹配该路径的规则
    fn match_path(&self, path: &str) -> Option<Rule>;
}

/// 指派归属匹配器
pub trait AssigneeMatcher: Send + Sync {
    /// 返回该路径的被指派人
    fn match_path(&self, path: &str) -> Vec<String>;
}

/// 不包含任何指派的匹配器
pub struct NoAssignments;

impl AssigneeMatcher for NoAssignments {
    fn match_path(&self, _path: &str) -> Vec<String> {
        Vec::new()
    }
}

/// 归属解析器
#[async_trait]
pub trait OwnershipResolver: Send + Sync {
    async fn ruleset_for_repo(
        &self,
        actor: &InternalActor,
        repo_id: i32,
        commit: &str,
    ) -> Result<Option<Box<dyn Ruleset>>>;

    async fn assigned_ownership(
        &self,
        actor: &InternalActor,
        repo_id: i32,
        commit: &str,
    ) -> Result<Box<dyn AssigneeMatcher>>;

    async fn assigned_teams(
        &self,
        actor: &InternalActor,
        repo_id: i32,
        commit: &str,
    ) -> Result<Box<dyn AssigneeMatcher>>;
}
