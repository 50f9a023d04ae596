// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RepoFileStats::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RepoFileStats::RepoId)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RepoFileStats::TotalFileCount).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(RepoFileStats::CodeownedFileCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(RepoFileStats::AssignedOwnershipFileCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(RepoFileStats::TotalOwnedFileCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(RepoFileStats::FileCountsUpdatedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(RepoFileStats::OwnershipCountsUpdatedAt)
                            .timestamp_with_time_zone(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_repo_file_stats_repo_id")
                            .from(RepoFileStats::Table, RepoFileStats::RepoId)
                            .to(Repos::Table, Repos::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CommitSignals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CommitSignals::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CommitSignals::RepoId).integer().not_null())
                    .col(ColumnDef::new(CommitSignals::AuthorName).string().not_null())
                    .col(ColumnDef::new(CommitSignals::AuthorEmail).string().not_null())
                    .col(
                        ColumnDef::new(CommitSignals::CommittedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CommitSignals::CommitSha).string().not_null())
                    .col(ColumnDef::new(CommitSignals::ChangedFilePaths).json().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_commit_signals_repo_id")
                            .from(CommitSignals::Table, CommitSignals::RepoId)
                            .to(Repos::Table, Repos::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_commit_signals_repo_id")
                    .table(CommitSignals::Table)
                    .col(CommitSignals::RepoId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RecentViewSignals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RecentViewSignals::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RecentViewSignals::ViewerId).integer().not_null())
                    .col(ColumnDef::new(RecentViewSignals::RepoId).integer().not_null())
                    .col(ColumnDef::new(RecentViewSignals::FilePath).string().not_null())
                    .col(
                        ColumnDef::new(RecentViewSignals::ViewsCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_recent_view_signals_unique")
                    .table(RecentViewSignals::Table)
                    .col(RecentViewSignals::ViewerId)
                    .col(RecentViewSignals::RepoId)
                    .col(RecentViewSignals::FilePath)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EventLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EventLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EventLogs::Name).string().not_null())
                    .col(ColumnDef::new(EventLogs::UserId).integer().not_null())
                    .col(ColumnDef::new(EventLogs::RepoId).integer().not_null())
                    .col(ColumnDef::new(EventLogs::FilePath).string().not_null())
                    .col(
                        ColumnDef::new(EventLogs::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_event_logs_repo_id_id")
                    .table(EventLogs::Table)
                    .col(EventLogs::RepoId)
                    .col(EventLogs::Id)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EventLogBookmarks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EventLogBookmarks::SignalName)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(EventLogBookmarks::BookmarkId)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(EventLogBookmarks::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EventLogBookmarks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(EventLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RecentViewSignals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CommitSignals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RepoFileStats::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Repos {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum RepoFileStats {
    Table,
    RepoId,
    TotalFileCount,
    CodeownedFileCount,
    AssignedOwnershipFileCount,
    TotalOwnedFileCount,
    FileCountsUpdatedAt,
    OwnershipCountsUpdatedAt,
}

#[derive(DeriveIden)]
enum CommitSignals {
    Table,
    Id,
    RepoId,
    AuthorName,
    AuthorEmail,
    CommittedAt,
    CommitSha,
    ChangedFilePaths,
}

#[derive(DeriveIden)]
enum RecentViewSignals {
    Table,
    Id,
    ViewerId,
    RepoId,
    FilePath,
    ViewsCount,
}

#[derive(DeriveIden)]
enum EventLogs {
    Table,
    Id,
    Name,
    UserId,
    RepoId,
    FilePath,
    Timestamp,
}

#[derive(DeriveIden)]
enum EventLogBookmarks {
    Table,
    SignalName,
    BookmarkId,
    UpdatedAt,
}
