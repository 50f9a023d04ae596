// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::domain::services::ownership::{
    AssigneeMatcher, NoAssignments, OwnershipResolver, Rule, Ruleset,
};
use crate::domain::services::version_control::VersionControlClient;
use crate::domain::services::InternalActor;

/// 依次查找的 CODEOWNERS 文件位置
const CODEOWNERS_PATHS: [&str; 3] = ["CODEOWNERS", ".github/CODEOWNERS", "docs/CODEOWNERS"];

#[derive(Debug, Clone)]
struct OwnerPattern {
    anchored: bool,
    directory: bool,
    segments: Vec<String>,
    owners: Vec<String>,
}

impl OwnerPattern {
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let mut parts = line.split_whitespace();
        let raw = parts.next()?;
        let owners = parts
            .take_while(|part| !part.starts_with('#'))
            .map(ToString::to_string)
            .collect();

        let anchored = raw.starts_with('/') || raw.trim_end_matches('/').contains('/');
        let directory = raw.ends_with('/');
        let segments = raw
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect();

        Some(Self {
            anchored,
            directory,
            segments,
            owners,
        })
    }

    fn matches(&self, path: &str) -> bool {
        let parts: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        if self.segments.is_empty() {
            return false;
        }

        if self.anchored {
            return self.matches_from(&parts);
        }
        (0..parts.len()).any(|start| self.matches_from(&parts[start..]))
    }

    fn matches_from(&self, parts: &[&str]) -> bool {
        if parts.len() < self.segments.len() {
            return false;
        }
        let prefix_matches = self
            .segments
            .iter()
            .zip(parts)
            .all(|(pattern, part)| segment_matches(pattern, part));
        if !prefix_matches {
            return false;
        }

        // 目录规则要求还有后续路径，文件规则必须恰好匹配或作为目录前缀
        if self.directory {
            parts.len() > self.segments.len()
        } else {
            true
        }
    }
}

/// 单个路径段上的 `*`/`?` 通配
fn segment_matches(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ti));
            pi += 1;
        } else if let Some((sp, st)) = star {
            pi = sp + 1;
            ti = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|c| *c == '*')
}

/// 解析后的 CODEOWNERS 文件，后出现的规则优先
#[derive(Debug, Clone, Default)]
pub struct CodeownersFile {
    patterns: Vec<OwnerPattern>,
}

impl CodeownersFile {
    pub fn parse(content: &str) -> Self {
        Self {
            patterns: content.lines().filter_map(OwnerPattern::parse).collect(),
        }
    }
}

impl Ruleset for CodeownersFile {
    fn match_path(&self, path: &str) -> Option<Rule> {
        self.patterns
            .iter()
            .rev()
            .find(|pattern| pattern.matches(path))
            .map(|pattern| Rule::new(pattern.owners.clone()))
    }
}

/// 从仓库中的 CODEOWNERS 文件解析归属
///
/// 该部署不维护指派归属，两个指派匹配器始终为空
pub struct CodeownersResolver {
    vcs: Arc<dyn VersionControlClient>,
}

impl CodeownersResolver {
    pub fn new(vcs: Arc<dyn VersionControlClient>) -> Self {
        Self { vcs }
    }
}

#[async_trait]
impl OwnershipResolver for CodeownersResolver {
    async fn ruleset_for_repo(
        &self,
        actor: &InternalActor,
        repo_id: i32,
        commit: &str,
    ) -> Result<Option<Box<dyn Ruleset>>> {
        for path in CODEOWNERS_PATHS {
            if let Some(bytes) = self.vcs.read_file(actor, repo_id, commit, path).await? {
                debug!("Using {} for repo {}", path, repo_id);
                let content = String::from_utf8_lossy(&bytes);
                return Ok(Some(Box::new(CodeownersFile::parse(&content))));
            }
        }
        Ok(None)
    }

    async fn assigned_ownership(
        &self,
        _actor: &InternalActor,
        _repo_id: i32,
        _commit: &str,
    ) -> Result<Box<dyn AssigneeMatcher>> {
        Ok(Box::new(NoAssignments))
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
