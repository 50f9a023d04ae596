// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 各信号类型的任务处理器
//!
//! 处理器只依赖协作者接口，写入全部经过 [`ResultStore`]。
//! 对同一仓库重复执行必须得到与执行一次相同的结果。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::models::signal::SignalKind;
use crate::domain::repositories::result_store::ResultStore;
use crate::domain::services::event_log::EventLogReader;
use crate::domain::services::ownership::OwnershipResolver;
use crate::domain::services::permissions::PermissionChecker;
use crate::domain::services::version_control::VersionControlClient;
use crate::domain::services::InternalActor;
use crate::utils::errors::JobError;

pub mod analytics;
pub mod recent_contributors;
pub mod recent_views;

pub use analytics::AnalyticsHandler;
pub use recent_contributors::RecentContributorsHandler;
pub use recent_views::RecentViewsHandler;

/// 处理器依赖的外部协作者
pub struct Collaborators {
    pub vcs: Arc<dyn VersionControlClient>,
    pub ownership: Arc<dyn OwnershipResolver>,
    pub permissions: Arc<dyn PermissionChecker>,
    pub results: Arc<dyn ResultStore>,
    pub events: Arc<dyn EventLogReader>,
}

/// 单次处理调用的上下文
#[derive(Debug, Clone)]
pub struct HandlerContext {
    pub actor: InternalActor,
    pub cancel: CancellationToken,
}

impl HandlerContext {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            actor: InternalActor::background(),
            cancel,
        }
    }
}

/// 任务处理器
#[async_trait]
pub trait JobHandler: Send + Sync {
    fn kind(&self) -> SignalKind;

    async fn handle(&self, ctx: &HandlerContext, repo_id: i32) -> Result<(), JobError>;
}

/// 启动时构建的处理器注册表
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<SignalKind, Arc<dyn JobHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册处理器，同一类型后注册的覆盖先注册的
    pub fn register(&mut self, handler: Arc<dyn JobHandler>) -> &mut Self {
        self.handlers.insert(handler.kind(), handler);
        self
    }

    pub fn get(&self, kind: SignalKind) -> Option<Arc<dyn JobHandler>> {
        self.handlers.get(&kind).cloned()
    }

    /// 注册全部内置信号的处理器
    pub fn standard(collaborators: Arc<Collaborators>) -> Self {
        let mut registry = Self::new();
        registry
            .register(Arc::new(RecentContributorsHandler::new(collaborators.clone())))
            .register(Arc::new(RecentViewsHandler::new(collaborators.clone())))
            .register(Arc::new(AnalyticsHandler::new(collaborators)));
        registry
    }
}

/// 仓库启用了子仓库权限时跳过处理，这不是错误
pub(crate) async fn sub_repo_gated(
    collaborators: &Collaborators,
    ctx: &HandlerContext,
    repo_id: i32,
) -> Result<bool, JobError> {
    let enabled = collaborators
        .permissions
        .is_sub_repo_perms_enabled_for_repo(&ctx.actor, repo_id)
        .await?;
    if enabled {
        debug!("Repo {} has sub-repo permissions enabled, skipping", repo_id);
    }
    Ok(enabled)
}
