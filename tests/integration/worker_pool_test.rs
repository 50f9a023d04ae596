// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use ownsignals::config::settings::SignalScheduleSettings;
use ownsignals::domain::models::signal::SignalKind;
use ownsignals::domain::repositories::job_repository::JobQueueStore;
use ownsignals::infrastructure::database::entities::{commit_signal, signal_job};
use ownsignals::infrastructure::repositories::job_repo_impl::{JobRepositoryImpl, QueueOptions};
use ownsignals::infrastructure::repositories::signal_config_repo_impl::SignalConfigurationRepositoryImpl;
use ownsignals::queue::rate_limiter::RateLimiters;
use ownsignals::queue::scheduler::Scheduler;
use ownsignals::workers::handlers::HandlerRegistry;
use ownsignals::workers::manager::WorkerManager;
use ownsignals::workers::pool::WorkerPool;
use ownsignals::workers::signal_worker::{PoolOptions, SignalWorker};
use sea_orm::{EntityTrait, PaginatorTrait};

use crate::helpers::{collaborators, insert_repo, setup_db, FakeVcs};

#[tokio::test]
async fn test_pool_processes_scheduled_jobs_end_to_end() {
    let db = setup_db().await;
    let one = insert_repo(&db, "github.com/sourcegraph/one", true).await;
    let two = insert_repo(&db, "github.com/sourcegraph/two", true).await;
    // 版本控制访问失败的仓库进入重试
    let broken = insert_repo(&db, "github.com/sourcegraph/broken", true).await;

    let vcs = FakeVcs::default()
        .with_commit(one, "aaa", "Alice", &["a.go"])
        .with_commit(two, "bbb", "Bob", &["b.go"])
        .with_commit(two, "ccc", "Carol", &["c.go"])
        .with_missing_repo(broken);
    let registry = Arc::new(HandlerRegistry::standard(collaborators(&db, vcs, &[], &[])));

    let jobs = Arc::new(JobRepositoryImpl::new(db.clone(), QueueOptions::default()));
    let configs = Arc::new(SignalConfigurationRepositoryImpl::new(db.clone()));
    Scheduler::new(
        SignalKind::RecentContributors,
        jobs.clone(),
        configs,
        &SignalScheduleSettings {
            refresh_interval_secs: 60,
            index_interval_secs: 3600,
        },
    )
    .run_once(Utc::now())
    .await
    .unwrap();
    assert_eq!(jobs.queued_count("recent-contributors").await.unwrap(), 3);

    let worker = SignalWorker::new(
        jobs.clone(),
        registry,
        Arc::new(RateLimiters::new(100, 10)),
        PoolOptions {
            num_handlers: 2,
            poll_interval: Duration::from_millis(10),
            heartbeat_interval: Duration::from_secs(1),
            hostname: "pool-test".to_string(),
        },
    );

    let mut manager = WorkerManager::new();
    manager.spawn(Arc::new(WorkerPool::new(Arc::new(worker))));
    tokio::time::sleep(Duration::from_millis(500)).await;
    manager.shutdown().await;

    assert_eq!(
        commit_signal::Entity::find().count(db.as_ref()).await.unwrap(),
        3
    );

    let rows = signal_job::Entity::find().all(db.as_ref()).await.unwrap();
    assert_eq!(rows.len(), 3);
    for row in rows {
        if row.repo_id == broken {
            assert_eq!(row.state, "errored");
            assert_eq!(row.num_failures, 1);
            assert!(row.process_after.is_some());
            assert!(row
                .failure_message
                .unwrap_or_default()
                .contains("not cloned on this host"));
        } else {
            assert_eq!(row.state, "completed");
            assert_eq!(row.worker_hostname, "pool-test");
        }
        assert!(row.execution_logs.is_some());
    }
}
