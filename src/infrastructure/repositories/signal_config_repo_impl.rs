// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::signal::{ConfigurationFilter, ConfigurationUpdate, SignalConfiguration};
use crate::domain::repositories::signal_config_repository::SignalConfigurationStore;
use crate::infrastructure::database::entities::signal_configuration;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;

/// 信号配置仓库实现
#[derive(Clone)]
pub struct SignalConfigurationRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl SignalConfigurationRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl TryFrom<signal_configuration::Model> for SignalConfiguration {
    type Error = RepositoryError;

    fn try_from(model: signal_configuration::Model) -> Result<Self, Self::Error> {
        let excluded_repo_patterns = match model.excluded_repo_patterns {
            Some(value) => serde_json::from_value(value)?,
            None => Vec::new(),
        };

        Ok(Self {
            id: model.id,
            name: model.name,
            description: model.description,
            enabled: model.enabled,
            excluded_repo_patterns,
        })
    }
}

#[async_trait]
impl SignalConfigurationStore for SignalConfigurationRepositoryImpl {
    async fn load_configurations(
        &self,
        filter: ConfigurationFilter,
    ) -> Result<Vec<SignalConfiguration>, RepositoryError> {
        let mut query = signal_configuration::Entity::find();
        if let Some(name) = filter.name {
            query = query.filter(signal_configuration::Column::Name.eq(name));
        }

        query
            .order_by_asc(signal_configuration::Column::Id)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(SignalConfiguration::try_from)
            .collect()
    }

    async fn update_configuration(
        &self,
        name: &str,
        update: ConfigurationUpdate,
    ) -> Result<SignalConfiguration, RepositoryError> {
        let model = signal_configuration::Entity::find()
            .filter(signal_configuration::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| RepositoryError::ConfigurationNotFound(name.to_string()))?;

        let mut active: signal_configuration::ActiveModel = model.into();
        if let Some(enabled) = update.enabled {
            active.enabled = Set(enabled);
        }
        if let Some(patterns) = update.excluded_repo_patterns {
            active.excluded_repo_patterns = Set(Some(serde_json::to_value(patterns)?));
        }

        let updated = active.update(self.db.as_ref()).await?;
        updated.try_into()
    }
}
