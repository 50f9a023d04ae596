// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 内置信号配置：(名称, 描述, 默认启用)
const SIGNALS: [(&str, &str, bool); 3] = [
    (
        "recent-contributors",
        "Indexes recent commit authors as ownership signals",
        true,
    ),
    (
        "recent-views",
        "Indexes recent file views as ownership signals",
        true,
    ),
    (
        "analytics",
        "Computes aggregate file and ownership counts per repository",
        false,
    ),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut insert = Query::insert();
        insert
            .into_table(SignalConfigurations::Table)
            .columns([
                SignalConfigurations::Name,
                SignalConfigurations::Description,
                SignalConfigurations::Enabled,
            ])
            .on_conflict(
                OnConflict::column(SignalConfigurations::Name)
                    .do_nothing()
                    .to_owned(),
            );
        for (name, description, enabled) in SIGNALS {
            insert.values_panic([name.into(), description.into(), enabled.into()]);
        }

        manager.exec_stmt(insert).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let names = SIGNALS.iter().map(|(name, _, _)| *name);
        manager
            .exec_stmt(
                Query::delete()
                    .from_table(SignalConfigurations::Table)
                    .and_where(Expr::col(SignalConfigurations::Name).is_in(names))
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum SignalConfigurations {
    Table,
    Name,
    Description,
    Enabled,
}
