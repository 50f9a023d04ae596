// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;

use migration::{Migrator, MigratorTrait};
use ownsignals::config::settings::Settings;
use ownsignals::domain::models::signal::SignalKind;
use ownsignals::domain::services::version_control::VersionControlClient;
use ownsignals::infrastructure::cache::memory_cache::MemoryCache;
use ownsignals::infrastructure::cache::redis_client::RedisClient;
use ownsignals::infrastructure::cache::KeyValueCache;
use ownsignals::infrastructure::database::connection;
use ownsignals::infrastructure::observability::metrics::init_metrics;
use ownsignals::infrastructure::repositories::event_log_repo_impl::EventLogRepositoryImpl;
use ownsignals::infrastructure::repositories::job_repo_impl::{JobRepositoryImpl, QueueOptions};
use ownsignals::infrastructure::repositories::result_store_impl::ResultStoreImpl;
use ownsignals::infrastructure::repositories::signal_config_repo_impl::SignalConfigurationRepositoryImpl;
use ownsignals::infrastructure::services::codeowners::CodeownersResolver;
use ownsignals::infrastructure::services::git_client::GitCliClient;
use ownsignals::infrastructure::services::permission_checker_impl::{
    CachedPermissionChecker, StaticPermissionChecker,
};
use ownsignals::queue::rate_limiter::RateLimiters;
use ownsignals::queue::scheduler::Scheduler;
use ownsignals::utils::retry_policy::RetryPolicy;
use ownsignals::utils::telemetry;
use ownsignals::workers::handlers::{Collaborators, HandlerRegistry};
use ownsignals::workers::janitor::Janitor;
use ownsignals::workers::manager::WorkerManager;
use ownsignals::workers::pool::WorkerPool;
use ownsignals::workers::reloader::RateLimitReloader;
use ownsignals::workers::resetter::Resetter;
use ownsignals::workers::signal_worker::{PoolOptions, SignalWorker};
use tracing::info;

/// 主函数
///
/// 初始化所有组件并启动后台调度、工作池与维护循环
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration and initialize logging
    let settings = Settings::new()?;
    telemetry::init_telemetry(settings.telemetry.json);
    info!("Starting ownsignals...");

    init_metrics(&settings.metrics.listen_addr);

    // 2. Connect to database
    let db = Arc::new(connection::create_pool(&settings.database).await?);
    info!("Database connection established");

    info!("Running database migrations...");
    Migrator::up(db.as_ref(), None).await?;
    info!("Database migrations applied");

    // 3. Stores
    let retry_policy = RetryPolicy::new(
        settings.worker.max_num_retries,
        Duration::from_secs(settings.worker.backoff_initial_secs),
        Duration::from_secs(settings.worker.backoff_max_secs),
    );
    let jobs = Arc::new(JobRepositoryImpl::new(
        db.clone(),
        QueueOptions {
            max_num_resets: i32::try_from(settings.resetter.max_num_resets).unwrap_or(i32::MAX),
            retry_policy,
        },
    ));
    let configs = Arc::new(SignalConfigurationRepositoryImpl::new(db.clone()));

    // 4. Collaborators
    let cache: Arc<dyn KeyValueCache> = match &settings.redis.url {
        Some(url) => {
            info!("Using Redis permission cache");
            Arc::new(RedisClient::new(url).await?)
        }
        None => Arc::new(MemoryCache::new()),
    };
    let vcs: Arc<dyn VersionControlClient> =
        Arc::new(GitCliClient::new(db.clone(), &settings.vcs.repos_root));
    let permissions = Arc::new(CachedPermissionChecker::new(
        Arc::new(StaticPermissionChecker::new(
            settings.permissions.sub_repo_enabled_repo_ids.iter().copied(),
        )),
        cache,
        Duration::from_secs(settings.permissions.cache_ttl_secs),
    ));
    let collaborators = Arc::new(Collaborators {
        ownership: Arc::new(CodeownersResolver::new(vcs.clone())),
        vcs,
        permissions,
        results: Arc::new(ResultStoreImpl::new(db.clone())),
        events: Arc::new(EventLogRepositoryImpl::new(db.clone())),
    });
    let registry = Arc::new(HandlerRegistry::standard(collaborators));
    let limiters = Arc::new(RateLimiters::new(
        settings.rate_limiting.limit,
        settings.rate_limiting.burst,
    ));

    // 5. Start background routines
    let mut worker_manager = WorkerManager::new();
    for kind in SignalKind::ALL {
        worker_manager.spawn(Arc::new(Scheduler::new(
            kind,
            jobs.clone(),
            configs.clone(),
            settings.scheduler.for_kind(kind),
        )));
    }

    let signal_worker = SignalWorker::new(
        jobs.clone(),
        registry,
        limiters.clone(),
        PoolOptions::from_settings(&settings.worker),
    );
    worker_manager.spawn(Arc::new(WorkerPool::new(Arc::new(signal_worker))));
    worker_manager.spawn(Arc::new(Resetter::new(jobs.clone(), &settings.resetter)));
    worker_manager.spawn(Arc::new(Janitor::new(jobs, &settings.janitor)));
    worker_manager.spawn(Arc::new(RateLimitReloader::from_settings(
        limiters,
        &settings.rate_limiting,
    )));
    info!("Started {} background routines", worker_manager.len());

    // 6. Graceful shutdown
    worker_manager.wait_for_shutdown().await;
    Ok(())
}
