// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use ownsignals::config::settings::{JanitorSettings, ResetterSettings, SignalScheduleSettings};
use ownsignals::domain::models::job::JobState;
use ownsignals::domain::models::signal::{ConfigurationUpdate, SignalKind};
use ownsignals::domain::repositories::job_repository::JobQueueStore;
use ownsignals::domain::repositories::signal_config_repository::SignalConfigurationStore;
use ownsignals::infrastructure::repositories::job_repo_impl::{JobRepositoryImpl, QueueOptions};
use ownsignals::infrastructure::repositories::signal_config_repo_impl::SignalConfigurationRepositoryImpl;
use ownsignals::queue::scheduler::Scheduler;
use ownsignals::workers::janitor::Janitor;
use ownsignals::workers::resetter::Resetter;

use crate::helpers::{insert_repo, setup_db};

#[tokio::test]
async fn test_crashed_worker_job_is_recovered_then_given_up() {
    let db = setup_db().await;
    insert_repo(&db, "github.com/sourcegraph/one", true).await;

    let jobs = Arc::new(JobRepositoryImpl::new(
        db.clone(),
        QueueOptions {
            max_num_resets: 1,
            ..Default::default()
        },
    ));
    let configs = Arc::new(SignalConfigurationRepositoryImpl::new(db.clone()));
    let scheduler = Scheduler::new(
        SignalKind::RecentViews,
        jobs.clone(),
        configs,
        &SignalScheduleSettings {
            refresh_interval_secs: 60,
            index_interval_secs: 3600,
        },
    );
    let resetter = Resetter::new(
        jobs.clone(),
        &ResetterSettings {
            interval_secs: 1,
            stalled_max_age_secs: 0,
            max_num_resets: 1,
        },
    );

    scheduler.run_once(Utc::now()).await.unwrap();

    // 领取后不再发送心跳，模拟处理进程崩溃
    let job = jobs.claim_next("crashed-host").await.unwrap().unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    let outcome = resetter.run_once().await.unwrap();
    assert_eq!(outcome.reset_ids, vec![job.id]);

    let again = jobs.claim_next("crashed-host").await.unwrap().unwrap();
    assert_eq!(again.id, job.id);
    assert_eq!(again.num_resets, 1);

    tokio::time::sleep(Duration::from_millis(20)).await;
    let outcome = resetter.run_once().await.unwrap();
    assert_eq!(outcome.failed_ids, vec![job.id]);
    assert!(jobs.claim_next("healthy-host").await.unwrap().is_none());
}

#[tokio::test]
async fn test_disabled_signal_is_invisible_and_cleaned_up() {
    let db = setup_db().await;
    insert_repo(&db, "github.com/sourcegraph/one", true).await;
    insert_repo(&db, "github.com/sourcegraph/two", true).await;

    let jobs = Arc::new(JobRepositoryImpl::new(db.clone(), QueueOptions::default()));
    let configs = Arc::new(SignalConfigurationRepositoryImpl::new(db.clone()));
    let scheduler = Scheduler::new(
        SignalKind::RecentContributors,
        jobs.clone(),
        configs.clone(),
        &SignalScheduleSettings {
            refresh_interval_secs: 60,
            index_interval_secs: 3600,
        },
    );
    let janitor = Janitor::new(
        jobs.clone(),
        &JanitorSettings {
            interval_secs: 300,
            retention_days: 7,
        },
    );

    scheduler.run_once(Utc::now()).await.unwrap();
    let claimed = jobs.claim_next("host").await.unwrap().unwrap();
    assert!(jobs.mark_completed(claimed.id).await.unwrap());
    assert_eq!(jobs.queued_count("recent-contributors").await.unwrap(), 1);

    // 关闭后立即不可见，也不再被领取
    configs
        .update_configuration(
            "recent-contributors",
            ConfigurationUpdate {
                enabled: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(jobs.queued_count("recent-contributors").await.unwrap(), 0);
    assert!(jobs.claim_next("host").await.unwrap().is_none());

    assert_eq!(janitor.run_once(Utc::now()).await.unwrap(), 2);
    assert!(jobs.job_counts_by_type().await.unwrap().is_empty());

    // 重新开启后从零开始调度
    configs
        .update_configuration(
            "recent-contributors",
            ConfigurationUpdate {
                enabled: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    scheduler.run_once(Utc::now()).await.unwrap();
    let state_counts = jobs.job_counts_by_type().await.unwrap();
    assert_eq!(state_counts.get("recent-contributors"), Some(&2));
    let next = jobs.claim_next("host").await.unwrap().unwrap();
    assert_eq!(next.state, JobState::Processing);
}
