// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::JobError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// 已注册的信号类型
///
/// 每个类型对应一个信号配置（按逻辑名称关联）和一个任务处理器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    /// 最近提交者
    RecentContributors,
    /// 最近浏览者
    RecentViews,
    /// 文件与归属统计
    Analytics,
}

impl SignalKind {
    pub const ALL: [SignalKind; 3] = [
        SignalKind::RecentContributors,
        SignalKind::RecentViews,
        SignalKind::Analytics,
    ];

    /// 逻辑名称，与 `signal_configurations.name` 一致
    pub fn name(&self) -> &'static str {
        match self {
            SignalKind::RecentContributors => "recent-contributors",
            SignalKind::RecentViews => "recent-views",
            SignalKind::Analytics => "analytics",
        }
    }

    /// 配置文件中使用的键名
    pub fn config_key(&self) -> &'static str {
        match self {
            SignalKind::RecentContributors => "recent_contributors",
            SignalKind::RecentViews => "recent_views",
            SignalKind::Analytics => "analytics",
        }
    }

    pub fn enabled_by_default(&self) -> bool {
        !matches!(self, SignalKind::Analytics)
    }

    pub fn default_refresh_interval(&self) -> Duration {
        DAY
    }

    pub fn default_index_interval(&self) -> Duration {
        DAY
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SignalKind {
    type Err = JobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SignalKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| JobError::UnknownJobType(s.to_string()))
    }
}

/// 信号配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalConfiguration {
    pub id: i32,
    pub name: String,
    pub description: String,
    /// 关闭时调度器不再插入任务，清理器删除该类型的所有任务
    pub enabled: bool,
    /// 排除的仓库名模式（glob 或 SQL LIKE）
    pub excluded_repo_patterns: Vec<String>,
}

/// 配置查询条件
#[derive(Debug, Clone, Default)]
pub struct ConfigurationFilter {
    pub name: Option<String>,
}

impl ConfigurationFilter {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

/// 配置更新，`None` 字段保持不变
#[derive(Debug, Clone, Default)]
pub struct ConfigurationUpdate {
    pub enabled: Option<bool>,
    pub excluded_repo_patterns: Option<Vec<String>>,
}
