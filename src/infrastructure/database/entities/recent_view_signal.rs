// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "recent_view_signals")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub viewer_id: i32,
    pub repo_id: i32,
    pub file_path: String,
    pub views_count: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
