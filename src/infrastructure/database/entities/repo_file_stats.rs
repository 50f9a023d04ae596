// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "repo_file_stats")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub repo_id: i32,
    pub total_file_count: i32,
    pub codeowned_file_count: i32,
    pub assigned_ownership_file_count: i32,
    pub total_owned_file_count: i32,
    pub file_counts_updated_at: Option<ChronoDateTimeWithTimeZone>,
    pub ownership_counts_updated_at: Option<ChronoDateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
