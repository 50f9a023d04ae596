// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::actor::InternalActor;
use anyhow::Result;
use async_trait::async_trait;

/// 权限检查
#[async_trait]
pub trait PermissionChecker: Send + Sync {
    /// 仓库是否启用了子仓库权限
    async fn is_sub_repo_perms_enabled_for_repo(
        &self,
        actor: &InternalActor,
        repo_id: i32,
    ) -> Result<bool>;
}
