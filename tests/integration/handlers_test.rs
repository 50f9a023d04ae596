// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use ownsignals::domain::models::signal::SignalKind;
use ownsignals::domain::repositories::result_store::ResultStore;
use ownsignals::infrastructure::database::entities::{
    commit_signal, recent_view_signal, repo_file_stats,
};
use ownsignals::infrastructure::repositories::result_store_impl::ResultStoreImpl;
use ownsignals::utils::errors::JobError;
use ownsignals::workers::handlers::{HandlerContext, HandlerRegistry, JobHandler, RecentViewsHandler};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use tokio_util::sync::CancellationToken;

use crate::helpers::{collaborators, insert_repo, insert_view_event, setup_db, FakeVcs};

fn ctx() -> HandlerContext {
    HandlerContext::new(CancellationToken::new())
}

fn owned_files() -> [&'static str; 5] {
    [
        "notOwned.go",
        "owned/file1.go",
        "owned/file2.go",
        "owned/file3.go",
        "assigned.go",
    ]
}

#[tokio::test]
async fn test_analytics_counts_codeowned_and_assigned_files() {
    let db = setup_db().await;
    let repo_id = insert_repo(&db, "github.com/sourcegraph/owned", true).await;
    let vcs = FakeVcs::default()
        .with_files(repo_id, &owned_files())
        .with_file_content(repo_id, "CODEOWNERS", "/owned/* @owner\n");
    let registry =
        HandlerRegistry::standard(collaborators(&db, vcs, &["owned/file1.go", "assigned.go"], &[]));

    let handler = registry.get(SignalKind::Analytics).unwrap();
    handler.handle(&ctx(), repo_id).await.unwrap();

    let stats = repo_file_stats::Entity::find_by_id(repo_id)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stats.total_file_count, 5);
    assert_eq!(stats.codeowned_file_count, 3);
    assert_eq!(stats.assigned_ownership_file_count, 2);
    assert_eq!(stats.total_owned_file_count, 4);
    assert!(stats.file_counts_updated_at.is_some());
    assert!(stats.ownership_counts_updated_at.is_some());
}

#[tokio::test]
async fn test_analytics_fails_when_repo_row_vanished() {
    let db = setup_db().await;
    let vcs = FakeVcs::default().with_files(4242, &owned_files());
    let registry = HandlerRegistry::standard(collaborators(&db, vcs, &[], &[]));

    let err = registry
        .get(SignalKind::Analytics)
        .unwrap()
        .handle(&ctx(), 4242)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        JobError::NoRowsAffected {
            repo_id: 4242,
            what: "file counts"
        }
    ));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_recent_contributors_rerun_supersedes_previous_results() {
    let db = setup_db().await;
    let repo_id = insert_repo(&db, "github.com/sourcegraph/busy", true).await;
    let other_id = insert_repo(&db, "github.com/sourcegraph/other", true).await;
    let vcs = FakeVcs::default()
        .with_commit(repo_id, "aaa", "Alice", &["src/main.rs"])
        .with_commit(repo_id, "bbb", "Bob", &["README.md", "src/lib.rs"])
        .with_commit(other_id, "ccc", "Carol", &["go.mod"]);
    let registry = HandlerRegistry::standard(collaborators(&db, vcs, &[], &[]));
    let handler = registry.get(SignalKind::RecentContributors).unwrap();

    handler.handle(&ctx(), other_id).await.unwrap();
    handler.handle(&ctx(), repo_id).await.unwrap();
    let first: Vec<(String, String)> = commit_signal::Entity::find()
        .filter(commit_signal::Column::RepoId.eq(repo_id))
        .order_by_asc(commit_signal::Column::CommitSha)
        .all(db.as_ref())
        .await
        .unwrap()
        .into_iter()
        .map(|row| (row.commit_sha, row.author_email))
        .collect();

    handler.handle(&ctx(), repo_id).await.unwrap();
    let second: Vec<(String, String)> = commit_signal::Entity::find()
        .filter(commit_signal::Column::RepoId.eq(repo_id))
        .order_by_asc(commit_signal::Column::CommitSha)
        .all(db.as_ref())
        .await
        .unwrap()
        .into_iter()
        .map(|row| (row.commit_sha, row.author_email))
        .collect();

    assert_eq!(
        first,
        vec![
            ("aaa".to_string(), "alice@example.com".to_string()),
            ("bbb".to_string(), "bob@example.com".to_string()),
        ]
    );
    assert_eq!(first, second);
    assert_eq!(
        commit_signal::Entity::find()
            .filter(commit_signal::Column::RepoId.eq(other_id))
            .count(db.as_ref())
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn test_sub_repo_permissions_make_handlers_a_no_op() {
    let db = setup_db().await;
    let repo_id = insert_repo(&db, "github.com/sourcegraph/private", true).await;
    let vcs = FakeVcs::default()
        .with_files(repo_id, &owned_files())
        .with_commit(repo_id, "aaa", "Alice", &["secret.go"]);
    let registry = HandlerRegistry::standard(collaborators(&db, vcs, &[], &[repo_id]));

    for kind in SignalKind::ALL {
        registry
            .get(kind)
            .unwrap()
            .handle(&ctx(), repo_id)
            .await
            .unwrap();
    }

    assert!(repo_file_stats::Entity::find_by_id(repo_id)
        .one(db.as_ref())
        .await
        .unwrap()
        .is_none());
    assert_eq!(commit_signal::Entity::find().count(db.as_ref()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_recent_views_aggregates_in_batches_and_advances_bookmark() {
    let db = setup_db().await;
    let public = insert_repo(&db, "github.com/sourcegraph/public", true).await;
    let private = insert_repo(&db, "github.com/sourcegraph/private", true).await;

    insert_view_event(&db, 1, public, "README.md").await;
    insert_view_event(&db, 1, public, "README.md").await;
    insert_view_event(&db, 2, public, "README.md").await;
    insert_view_event(&db, 1, private, "secret.go").await;
    insert_view_event(&db, 1, public, "src/lib.rs").await;

    let handler = RecentViewsHandler::new(collaborators(&db, FakeVcs::default(), &[], &[private]))
        .with_batch_size(2);
    handler.handle(&ctx(), public).await.unwrap();

    let rows: Vec<(i32, String, i64)> = recent_view_signal::Entity::find()
        .order_by_asc(recent_view_signal::Column::ViewerId)
        .order_by_asc(recent_view_signal::Column::FilePath)
        .all(db.as_ref())
        .await
        .unwrap()
        .into_iter()
        .map(|row| (row.viewer_id, row.file_path, row.views_count))
        .collect();
    assert_eq!(
        rows,
        vec![
            (1, "README.md".to_string(), 2),
            (1, "src/lib.rs".to_string(), 1),
            (2, "README.md".to_string(), 1),
        ]
    );

    let results = ResultStoreImpl::new(db.clone());
    assert_eq!(
        results
            .get_bookmark(&RecentViewsHandler::bookmark_key(public))
            .await
            .unwrap(),
        5
    );
    assert_eq!(
        results
            .get_bookmark(&RecentViewsHandler::bookmark_key(private))
            .await
            .unwrap(),
        0
    );

    // 没有新事件时重跑不会重复累加
    handler.handle(&ctx(), public).await.unwrap();
    let total: i64 = recent_view_signal::Entity::find()
        .all(db.as_ref())
        .await
        .unwrap()
        .iter()
        .map(|row| row.views_count)
        .sum();
    assert_eq!(total, 4);
}

#[tokio::test]
async fn test_concurrent_recent_views_jobs_count_each_event_once() {
    let db = setup_db().await;
    let first = insert_repo(&db, "github.com/sourcegraph/first", true).await;
    let second = insert_repo(&db, "github.com/sourcegraph/second", true).await;

    insert_view_event(&db, 1, first, "README.md").await;
    insert_view_event(&db, 2, second, "main.go").await;
    insert_view_event(&db, 1, first, "README.md").await;
    insert_view_event(&db, 3, second, "main.go").await;

    let handler = RecentViewsHandler::new(collaborators(&db, FakeVcs::default(), &[], &[]));
    let (ctx_a, ctx_b, ctx_again) = (ctx(), ctx(), ctx());
    let (a, b, again) = tokio::join!(
        handler.handle(&ctx_a, first),
        handler.handle(&ctx_b, second),
        handler.handle(&ctx_again, first),
    );
    a.unwrap();
    b.unwrap();
    again.unwrap();

    let rows = recent_view_signal::Entity::find()
        .all(db.as_ref())
        .await
        .unwrap();
    let total: i64 = rows.iter().map(|row| row.views_count).sum();
    assert_eq!(total, 4);
    let first_total: i64 = rows
        .iter()
        .filter(|row| row.repo_id == first)
        .map(|row| row.views_count)
        .sum();
    assert_eq!(first_total, 2);
}
