// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use chrono::Utc;
use ownsignals::config::settings::SignalScheduleSettings;
use ownsignals::domain::models::signal::{ConfigurationUpdate, SignalKind};
use ownsignals::domain::repositories::job_repository::JobQueueStore;
use ownsignals::domain::repositories::signal_config_repository::SignalConfigurationStore;
use ownsignals::infrastructure::repositories::job_repo_impl::{JobRepositoryImpl, QueueOptions};
use ownsignals::infrastructure::repositories::signal_config_repo_impl::SignalConfigurationRepositoryImpl;
use ownsignals::queue::scheduler::{Scheduler, TickOutcome};

use crate::helpers::{insert_repo, setup_db};

fn schedule() -> SignalScheduleSettings {
    SignalScheduleSettings {
        refresh_interval_secs: 60,
        index_interval_secs: 24 * 60 * 60,
    }
}

#[tokio::test]
async fn test_tick_enqueues_only_cloned_repos_of_enabled_signals() {
    let db = setup_db().await;
    for (name, cloned) in [
        ("github.com/sourcegraph/one", true),
        ("github.com/sourcegraph/two", true),
        ("github.com/sourcegraph/three", true),
        ("github.com/sourcegraph/four", false),
    ] {
        insert_repo(&db, name, cloned).await;
    }

    let jobs = Arc::new(JobRepositoryImpl::new(db.clone(), QueueOptions::default()));
    let configs = Arc::new(SignalConfigurationRepositoryImpl::new(db.clone()));

    for kind in SignalKind::ALL {
        let scheduler = Scheduler::new(kind, jobs.clone(), configs.clone(), &schedule());
        let outcome = scheduler.run_once(Utc::now()).await.unwrap();
        match kind {
            SignalKind::Analytics => assert_eq!(outcome, TickOutcome::Disabled),
            _ => assert_eq!(outcome, TickOutcome::Enqueued(3)),
        }
    }

    let counts = jobs.job_counts_by_type().await.unwrap();
    assert_eq!(counts.get("recent-contributors"), Some(&3));
    assert_eq!(counts.get("recent-views"), Some(&3));
    assert_eq!(counts.get("analytics").copied().unwrap_or(0), 0);
    assert_eq!(jobs.queued_count("recent-contributors").await.unwrap(), 3);
}

#[tokio::test]
async fn test_excluded_patterns_and_enabling_a_signal() {
    let db = setup_db().await;
    insert_repo(&db, "github.com/sourcegraph/keep", true).await;
    insert_repo(&db, "github.com/forks/skip-one", true).await;
    insert_repo(&db, "gitlab.com/forks/skip-two", true).await;

    let jobs = Arc::new(JobRepositoryImpl::new(db.clone(), QueueOptions::default()));
    let configs = Arc::new(SignalConfigurationRepositoryImpl::new(db.clone()));
    let scheduler = Scheduler::new(SignalKind::Analytics, jobs.clone(), configs.clone(), &schedule());

    assert_eq!(
        scheduler.run_once(Utc::now()).await.unwrap(),
        TickOutcome::Disabled
    );

    let updated = configs
        .update_configuration(
            "analytics",
            ConfigurationUpdate {
                enabled: Some(true),
                excluded_repo_patterns: Some(vec!["*/forks/*".to_string()]),
            },
        )
        .await
        .unwrap();
    assert!(updated.enabled);

    assert_eq!(
        scheduler.run_once(Utc::now()).await.unwrap(),
        TickOutcome::Enqueued(1)
    );
    assert_eq!(jobs.queued_count("analytics").await.unwrap(), 1);
}
