// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::settings::{RateLimitingSettings, Settings};
use crate::queue::rate_limiter::RateLimiters;
use crate::utils::errors::WorkerError;
use crate::workers::worker::Worker;

/// 限流参数来源
pub type RateLimitSource = Box<dyn Fn() -> anyhow::Result<RateLimitingSettings> + Send + Sync>;

/// 限流配置热加载
///
/// 按固定间隔重新读取配置并更新所有任务类型的限流器
pub struct RateLimitReloader {
    limiters: Arc<RateLimiters>,
    source: RateLimitSource,
    interval: Duration,
}

impl RateLimitReloader {
    pub fn new(limiters: Arc<RateLimiters>, source: RateLimitSource, interval: Duration) -> Self {
        Self {
            limiters,
            source,
            interval: interval.max(Duration::from_secs(1)),
        }
    }

    /// 从配置文件与环境变量重新加载
    pub fn from_settings(limiters: Arc<RateLimiters>, settings: &RateLimitingSettings) -> Self {
        Self::new(
            limiters,
            Box::new(|| -> anyhow::Result<RateLimitingSettings> {
                Ok(Settings::new()?.rate_limiting)
            }),
            Duration::from_secs(settings.reload_interval_secs),
        )
    }

    pub fn reload(&self) -> anyhow::Result<()> {
        let settings = (self.source)()?;
        self.limiters.apply(settings.limit, settings.burst);
        Ok(())
    }
}

#[async_trait]
impl Worker for RateLimitReloader {
    async fn run(&self, cancel: CancellationToken) -> Result<(), WorkerError> {
        info!("Rate limit reloader started, every {:?}", self.interval);
        let mut interval = tokio::time::interval(self.interval);
        interval.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }

            if let Err(e) = self.reload() {
                warn!("Failed to reload rate limit settings: {}", e);
            }
        }

        info!("Rate limit reloader stopped");
        Ok(())
    }

    fn name(&self) -> &str {
        "rate-limit-reloader"
    }
}
