use crate::config::settings::Settings;
use crate::domain::models::signal::SignalKind;
use std::time::Duration;

#[test]
fn test_defaults_loaded() {
    let settings = Settings::new().expect("defaults should deserialize");

    assert_eq!(settings.worker.num_handlers, 5);
    assert_eq!(settings.worker.heartbeat_interval_secs, 20);
    assert_eq!(settings.worker.max_num_retries, 3);
    assert_eq!(settings.rate_limiting.limit, 20);
    assert_eq!(settings.rate_limiting.burst, 5);
    assert_eq!(settings.resetter.interval_secs, 20);
    assert_eq!(settings.resetter.stalled_max_age_secs, 30);
    assert_eq!(settings.janitor.interval_secs, 300);
    assert_eq!(settings.janitor.retention_days, 7);
    assert_eq!(settings.permissions.cache_ttl_secs, 3600);
    assert!(settings.permissions.sub_repo_enabled_repo_ids.is_empty());
}

#[test]
fn test_redis_section_is_optional() {
    let settings = Settings::new().expect("defaults should deserialize");

    if std::env::var("OWNSIGNALS__REDIS__URL").is_err() {
        assert!(settings.redis.url.is_none());
    }
    assert!(!settings.telemetry.json);
    assert_eq!(settings.vcs.repos_root, "./repos");
}

#[test]
fn test_schedule_defaults_per_kind() {
    let settings = Settings::new().expect("defaults should deserialize");

    for kind in SignalKind::ALL {
        let schedule = settings.scheduler.for_kind(kind);
        assert_eq!(schedule.refresh_interval(), kind.default_refresh_interval());
        assert_eq!(schedule.index_interval(), Duration::from_secs(24 * 60 * 60));
    }
}
