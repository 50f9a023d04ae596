// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Instant;

use governor::clock::Clock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as TokenBucket};
use metrics::counter;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::domain::models::signal::SignalKind;
use crate::infrastructure::observability::metrics::RATE_LIMITER_WAITS_TOTAL;
use crate::utils::errors::JobError;

/// 跟随 tokio 时间的时钟，暂停时钟的测试中同样生效
#[derive(Debug, Clone, Copy, Default)]
struct TokioClock;

impl Clock for TokioClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}

type Bucket = TokenBucket<NotKeyed, InMemoryState, TokioClock, NoOpMiddleware<Instant>>;

struct LimiterState {
    limit: NonZeroU32,
    burst: NonZeroU32,
    bucket: Arc<Bucket>,
}

impl LimiterState {
    fn new(limit: NonZeroU32, burst: NonZeroU32) -> Self {
        let quota = Quota::per_second(limit).allow_burst(burst);
        Self {
            limit,
            burst,
            bucket: Arc::new(TokenBucket::direct_with_clock(quota, TokioClock)),
        }
    }
}

fn clamp(value: u32) -> NonZeroU32 {
    NonZeroU32::new(value).unwrap_or(NonZeroU32::MIN)
}

/// 单个任务类型共享的令牌桶限流器
///
/// 所有处理槽共享同一个实例，`set_rate` 可与 `wait` 并发调用，
/// 参数变化时替换令牌桶，正在等待的调用仍按旧桶完成
pub struct RateLimiter {
    job_type: &'static str,
    state: RwLock<LimiterState>,
}

impl RateLimiter {
    pub fn new(job_type: &'static str, limit: u32, burst: u32) -> Self {
        Self {
            job_type,
            state: RwLock::new(LimiterState::new(clamp(limit), clamp(burst))),
        }
    }

    pub fn limit(&self) -> u32 {
        self.state.read().limit.get()
    }

    pub fn burst(&self) -> u32 {
        self.state.read().burst.get()
    }

    /// 同时调整每秒令牌数与突发容量，0 按 1 处理
    ///
    /// 参数未变化时保留现有令牌桶
    pub fn set_rate(&self, limit: u32, burst: u32) {
        let (limit, burst) = (clamp(limit), clamp(burst));
        let mut state = self.state.write();
        if state.limit == limit && state.burst == burst {
            return;
        }
        *state = LimiterState::new(limit, burst);
        info!(
            "Rate limit for {} set to {}/s (burst {})",
            self.job_type, limit, burst
        );
    }

    /// 等待一个令牌
    ///
    /// 取消令牌触发时返回可重试的 `RateLimiterCancelled`
    pub async fn wait(&self, cancel: &CancellationToken) -> Result<(), JobError> {
        let bucket = self.state.read().bucket.clone();

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                counter!(RATE_LIMITER_WAITS_TOTAL, "job_type" => self.job_type, "outcome" => "cancelled")
                    .increment(1);
                debug!("Rate limiter wait for {} cancelled", self.job_type);
                Err(JobError::RateLimiterCancelled)
            }
            _ = acquire(&bucket) => {
                counter!(RATE_LIMITER_WAITS_TOTAL, "job_type" => self.job_type, "outcome" => "acquired")
                    .increment(1);
                Ok(())
            }
        }
    }
}

async fn acquire(bucket: &Bucket) {
    while let Err(not_until) = bucket.check() {
        let wait = not_until.wait_time_from(TokioClock.now());
        tokio::time::sleep(wait).await;
    }
}

/// 每个任务类型一个限流器，按 `SignalKind::ALL` 的顺序存放
pub struct RateLimiters {
    limiters: [RateLimiter; SignalKind::ALL.len()],
}

impl RateLimiters {
    pub fn new(limit: u32, burst: u32) -> Self {
        Self {
            limiters: SignalKind::ALL.map(|kind| RateLimiter::new(kind.name(), limit, burst)),
        }
    }

    pub fn for_kind(&self, kind: SignalKind) -> &RateLimiter {
        &self.limiters[kind as usize]
    }

    /// 将新的限流参数应用到所有任务类型
    pub fn apply(&self, limit: u32, burst: u32) {
        for limiter in &self.limiters {
            limiter.set_rate(limit, burst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_zero_values_are_clamped() {
        let limiter = RateLimiter::new("analytics", 0, 0);
        assert_eq!(limiter.limit(), 1);
        assert_eq!(limiter.burst(), 1);

        limiter.set_rate(20, 5);
        assert_eq!((limiter.limit(), limiter.burst()), (20, 5));

        limiter.set_rate(20, 0);
        assert_eq!((limiter.limit(), limiter.burst()), (20, 1));
        limiter.set_rate(0, 0);
        assert_eq!((limiter.limit(), limiter.burst()), (1, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_bucket_waits_for_refill() {
        let limiter = RateLimiter::new("recent-views", 20, 5);
        let cancel = CancellationToken::new();
        for _ in 0..5 {
            limiter.wait(&cancel).await.unwrap();
        }

        let sixth = limiter.wait(&cancel);
        tokio::pin!(sixth);
        assert!(
            tokio::time::timeout(Duration::from_millis(10), &mut sixth)
                .await
                .is_err(),
            "sixth token should not be available yet"
        );

        tokio::time::advance(Duration::from_millis(50)).await;
        tokio::time::timeout(Duration::from_millis(1), &mut sixth)
            .await
            .expect("token refilled after 50ms")
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_pending_wait() {
        let limiter = Arc::new(RateLimiter::new("recent-views", 1, 1));
        let cancel = CancellationToken::new();
        limiter.wait(&cancel).await.unwrap();

        let waiter = {
            let limiter = limiter.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { limiter.wait(&cancel).await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!waiter.is_finished());

        cancel.cancel();
        let err = waiter.await.unwrap().unwrap_err();
        assert!(matches!(err, JobError::RateLimiterCancelled));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_cancelled_token_wins_over_available_token() {
        let limiter = RateLimiter::new("recent-views", 1, 1);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = limiter.wait(&cancel).await.unwrap_err();
        assert!(matches!(err, JobError::RateLimiterCancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_rate_keeps_drained_bucket() {
        let limiter = RateLimiter::new("analytics", 1, 1);
        let cancel = CancellationToken::new();
        limiter.wait(&cancel).await.unwrap();

        limiter.set_rate(1, 1);
        let next = limiter.wait(&cancel);
        tokio::pin!(next);
        assert!(tokio::time::timeout(Duration::from_millis(100), &mut next)
            .await
            .is_err());
    }

    #[test]
    fn test_apply_updates_every_kind() {
        let limiters = RateLimiters::new(20, 5);
        limiters.apply(7, 2);
        for kind in SignalKind::ALL {
            let limiter = limiters.for_kind(kind);
            assert_eq!((limiter.limit(), limiter.burst()), (7, 2));
            assert_eq!(limiter.job_type, kind.name());
        }
    }
}
