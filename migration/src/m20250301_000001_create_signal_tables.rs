// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const CREATE_CONFIG_AWARE_VIEW: &str = r#"
CREATE VIEW signal_jobs_config_aware AS
SELECT
    j.id,
    j.repo_id,
    j.config_id,
    j.state,
    c.name AS config_name
FROM signal_jobs j
JOIN signal_configurations c ON c.id = j.config_id
WHERE c.enabled
"#;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Repos::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Repos::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Repos::Name).string().not_null().unique_key())
                    .col(ColumnDef::new(Repos::Cloned).boolean().not_null().default(false))
                    .col(ColumnDef::new(Repos::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Repos::DeletedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SignalConfigurations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SignalConfigurations::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SignalConfigurations::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(SignalConfigurations::Description)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(SignalConfigurations::Enabled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(SignalConfigurations::ExcludedRepoPatterns).json())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SignalJobs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SignalJobs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SignalJobs::RepoId).integer().not_null())
                    .col(ColumnDef::new(SignalJobs::ConfigId).integer().not_null())
                    .col(
                        ColumnDef::new(SignalJobs::State)
                            .string()
                            .not_null()
                            .default("queued"),
                    )
                    .col(ColumnDef::new(SignalJobs::FailureMessage).text())
                    .col(ColumnDef::new(SignalJobs::QueuedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(SignalJobs::StartedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(SignalJobs::FinishedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(SignalJobs::ProcessAfter).timestamp_with_time_zone())
                    .col(ColumnDef::new(SignalJobs::NumResets).integer().not_null().default(0))
                    .col(ColumnDef::new(SignalJobs::NumFailures).integer().not_null().default(0))
                    .col(ColumnDef::new(SignalJobs::LastHeartbeatAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(SignalJobs::ExecutionLogs).json())
                    .col(
                        ColumnDef::new(SignalJobs::WorkerHostname)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(SignalJobs::Cancel).boolean().not_null().default(false))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_signal_jobs_config_id")
                            .from(SignalJobs::Table, SignalJobs::ConfigId)
                            .to(SignalConfigurations::Table, SignalConfigurations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_signal_jobs_repo_id")
                            .from(SignalJobs::Table, SignalJobs::RepoId)
                            .to(Repos::Table, Repos::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_signal_jobs_config_state")
                    .table(SignalJobs::Table)
                    .col(SignalJobs::ConfigId)
                    .col(SignalJobs::State)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_signal_jobs_repo_id")
                    .table(SignalJobs::Table)
                    .col(SignalJobs::RepoId)
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(CREATE_CONFIG_AWARE_VIEW)
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP VIEW IF EXISTS signal_jobs_config_aware")
            .await?;
        manager
            .drop_table(Table::drop().table(SignalJobs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SignalConfigurations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Repos::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Repos {
    Table,
    Id,
    Name,
    Cloned,
    CreatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
enum SignalConfigurations {
    Table,
    Id,
    Name,
    Description,
    Enabled,
    ExcludedRepoPatterns,
}

#[derive(DeriveIden)]
enum SignalJobs {
    Table,
    Id,
    RepoId,
    ConfigId,
    State,
    FailureMessage,
    QueuedAt,
    StartedAt,
    FinishedAt,
    ProcessAfter,
    NumResets,
    NumFailures,
    LastHeartbeatAt,
    ExecutionLogs,
    WorkerHostname,
    Cancel,
}
