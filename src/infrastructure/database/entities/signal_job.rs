// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "signal_jobs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub repo_id: i32,
    pub config_id: i32,
    pub state: String,
    pub failure_message: Option<String>,
    pub queued_at: ChronoDateTimeWithTimeZone,
    pub started_at: Option<ChronoDateTimeWithTimeZone>,
    pub finished_at: Option<ChronoDateTimeWithTimeZone>,
    pub process_after: Option<ChronoDateTimeWithTimeZone>,
    pub num_resets: i32,
    pub num_failures: i32,
    pub last_heartbeat_at: Option<ChronoDateTimeWithTimeZone>,
    pub execution_logs: Option<Json>,
    pub worker_hostname: String,
    pub cancel: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::signal_configuration::Entity",
        from = "Column::ConfigId",
        to = "super::signal_configuration::Column::Id"
    )]
    SignalConfiguration,
}

impl Related<super::signal_configuration::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SignalConfiguration.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
