// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 单元测试共用的 SQLite 内存库与数据构造

use crate::config::settings::DatabaseSettings;
use crate::domain::models::job::JobState;
use crate::infrastructure::database::connection::create_pool;
use crate::infrastructure::database::entities::{repo, signal_configuration, signal_job};
use chrono::{DateTime, FixedOffset, Utc};
use migration::{Migrator, MigratorTrait};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use std::sync::Arc;

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

pub async fn config(db: &DatabaseConnection, name: &str) -> signal_configuration::Model {
    signal_configuration::Entity::find()
        .filter(signal_configuration::Column::Name.eq(name))
        .one(db)
        .await
        .unwrap()
        .unwrap()
}

pub async fn set_enabled(db: &DatabaseConnection, name: &str, enabled: bool) {
    let mut active: signal_configuration::ActiveModel = config(db, name).await.into();
    active.enabled = Set(enabled);
    active.update(db).await.unwrap();
}

pub async fn insert_job(
    db: &DatabaseConnection,
    repo_id: i32,
    config_id: i32,
    state: JobState,
    finished_at: Option<DateTime<Utc>>,
) -> i32 {
    signal_job::ActiveModel {
        repo_id: Set(repo_id),
        config_id: Set(config_id),
        state: Set(state.to_string()),
        queued_at: Set(Utc::now().into()),
        finished_at: Set(finished_at.map(DateTime::<FixedOffset>::from)),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
    .id
}

pub async fn find_job(db: &DatabaseConnection, id: i32) -> signal_job::Model {
    signal_job::Entity::find_by_id(id)
        .one(db)
        .await
        .unwrap()
        .unwrap()
}
