// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::signal::{ConfigurationFilter, ConfigurationUpdate, SignalConfiguration};
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;

/// 信号配置存储
#[async_trait]
pub trait SignalConfigurationStore: Send + Sync {
    /// 按条件加载配置
    async fn load_configurations(
        &self,
        filter: ConfigurationFilter,
    ) -> Result<Vec<SignalConfiguration>, RepositoryError>;

    /// 更新指定名称的配置
    async fn update_configuration(
        &self,
        name: &str,
        update: ConfigurationUpdate,
    ) -> Result<SignalConfiguration, RepositoryError>;
}
