// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "signal_configurations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub description: String,
    pub enabled: bool,
    pub excluded_repo_patterns: Option<Json>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::signal_job::Entity")]
    SignalJob,
}

impl Related<super::signal_job::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SignalJob.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
