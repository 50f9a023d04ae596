// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

/// 缓存模块
///
/// Redis 客户端与进程内缓存，统一实现 [`KeyValueCache`]
pub mod memory_cache;
pub mod redis_client;

/// 带过期时间的字符串键值缓存
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;
}
