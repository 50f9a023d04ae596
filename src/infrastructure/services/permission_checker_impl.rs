// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

use crate::domain::services::permissions::PermissionChecker;
use crate::domain::services::InternalActor;
use crate::infrastructure::cache::KeyValueCache;

/// 按配置的仓库ID列表判断子仓库权限
#[derive(Debug, Clone, Default)]
pub struct StaticPermissionChecker {
    repo_ids: HashSet<i32>,
}

impl StaticPermissionChecker {
    pub fn new(repo_ids: impl IntoIterator<Item = i32>) -> Self {
        Self {
            repo_ids: repo_ids.into_iter().collect(),
        }
    }
}

#[async_trait]
impl PermissionChecker for StaticPermissionChecker {
    async fn is_sub_repo_perms_enabled_for_repo(
        &self,
        _actor: &InternalActor,
        repo_id: i32,
    ) -> Result<bool> {
        Ok(self.repo_ids.contains(&repo_id))
    }
}

/// 带缓存的权限检查
///
/// 结果以 JSON 布尔值缓存在 `subrepo_perms:{repo_id}` 下，缓存读写失败时
/// 回退到内部检查器
pub struct CachedPermissionChecker {
    inner: Arc<dyn PermissionChecker>,
    cache: Arc<dyn KeyValueCache>,
    ttl: Duration,
}

impl CachedPermissionChecker {
    pub fn new(
        inner: Arc<dyn PermissionChecker>,
        cache: Arc<dyn KeyValueCache>,
        ttl: Duration,
    ) -> Self {
        Self { inner, cache, ttl }
    }

    fn cache_key(repo_id: i32) -> String {
        format!("subrepo_perms:{}", repo_id)
    }

    async fn cached(&self, key: &str) -> Option<bool> {
        match self.cache.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(enabled) => Some(enabled),
                Err(e) => {
                    warn!("Ignoring malformed cache entry {}: {}", key, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Permission cache read failed for {}: {}", key, e);
                None
            }
        }
    }
}

#[async_trait]
impl PermissionChecker for CachedPermissionChecker {
    async fn is_sub_repo_perms_enabled_for_repo(
        &self,
        actor: &InternalActor,
        repo_id: i32,
    ) -> Result<bool> {
        let key = Self::cache_key(repo_id);
        if let Some(enabled) = self.cached(&key).await {
            return Ok(enabled);
        }

        let enabled = self
            .inner
            .is_sub_repo_perms_enabled_for_repo(actor, repo_id)
            .await?;

        let value = serde_json::to_string(&enabled)?;
        if let Err(e) = self.cache.set(&key, &value, self.ttl).await {
            warn!("Permission cache write failed for {}: {}", key, e);
        }

        Ok(enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::cache::memory_cache::MemoryCache;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingChecker {
        calls: AtomicUsize,
        enabled: bool,
    }

    #[async_trait]
    impl PermissionChecker for CountingChecker {
        async fn is_sub_repo_perms_enabled_for_repo(
            &self,
            _actor: &InternalActor,
            _repo_id: i32,
        ) -> Result<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.enabled)
        }
    }

    struct BrokenCache;

    #[async_trait]
    impl KeyValueCache for BrokenCache {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            anyhow::bail!("connection refused")
        }

        async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<()> {
            anyhow::bail!("connection refused")
        }
    }

    #[tokio::test]
    async fn test_caches_result_as_json() {
        let inner = Arc::new(CountingChecker {
            calls: AtomicUsize::new(0),
            enabled: true,
        });
        let cache = Arc::new(MemoryCache::new());
        let checker =
            CachedPermissionChecker::new(inner.clone(), cache.clone(), Duration::from_secs(3600));
        let actor = InternalActor::background();

        assert!(checker.is_sub_repo_perms_enabled_for_repo(&actor, 5).await.unwrap());
        assert!(checker.is_sub_repo_perms_enabled_for_repo(&actor, 5).await.unwrap());

        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            cache.get("subrepo_perms:5").await.unwrap().as_deref(),
            Some("true")
        );
    }

    #[tokio::test]
    async fn test_falls_back_when_cache_fails() {
        let inner = Arc::new(CountingChecker {
            calls: AtomicUsize::new(0),
            enabled: false,
        });
        let checker =
            CachedPermissionChecker::new(inner.clone(), Arc::new(BrokenCache), Duration::from_secs(60));
        let actor = InternalActor::background();

        assert!(!checker.is_sub_repo_perms_enabled_for_repo(&actor, 1).await.unwrap());
        assert!(!checker.is_sub_repo_perms_enabled_for_repo(&actor, 1).await.unwrap());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_static_checker() {
        let checker = StaticPermissionChecker::new([3, 4]);
        let actor = InternalActor::background();

        assert!(checker.is_sub_repo_perms_enabled_for_repo(&actor, 3).await.unwrap());
        assert!(!checker.is_sub_repo_perms_enabled_for_repo(&actor, 1).await.unwrap());
    }
}
