// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::net::SocketAddr;

use metrics::describe_counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{info, warn};

pub const JOBS_QUEUED_TOTAL: &str = "own_signal_jobs_queued_total";
pub const JOBS_PROCESSED_TOTAL: &str = "own_signal_jobs_processed_total";
pub const JOBS_RESET_TOTAL: &str = "own_signal_jobs_reset_total";
pub const JANITOR_DELETED_TOTAL: &str = "own_signal_jobs_janitor_deleted_total";
pub const RATE_LIMITER_WAITS_TOTAL: &str = "own_signal_rate_limiter_waits_total";
pub const FILES_INDEXED_TOTAL: &str = "own_signal_files_indexed_total";
pub const COMMITS_INDEXED_TOTAL: &str = "own_signal_commits_indexed_total";
pub const EVENTS_INDEXED_TOTAL: &str = "own_signal_events_indexed_total";

/// 初始化指标系统
///
/// 安装 Prometheus 导出器并注册各计数器的说明
pub fn init_metrics(listen_addr: &str) {
    match listen_addr.parse::<SocketAddr>() {
        Ok(addr) => {
            // 端口被占用时只记录告警，不影响任务处理
            if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
                warn!("Failed to install Prometheus recorder: {}", e);
            } else {
                info!("Metrics exporter listening on {}", addr);
            }
        }
        Err(e) => warn!("Invalid metrics listen address {}: {}", listen_addr, e),
    }

    describe_counter!(
        JOBS_QUEUED_TOTAL,
        "Number of signal jobs enqueued by the scheduler"
    );
    describe_counter!(
        JOBS_PROCESSED_TOTAL,
        "Number of signal job attempts finished, by outcome"
    );
    describe_counter!(
        JOBS_RESET_TOTAL,
        "Number of stalled jobs requeued or failed by the resetter"
    );
    describe_counter!(
        JANITOR_DELETED_TOTAL,
        "Number of job rows removed by the janitor"
    );
    describe_counter!(
        RATE_LIMITER_WAITS_TOTAL,
        "Number of rate limiter waits, by outcome"
    );
    describe_counter!(FILES_INDEXED_TOTAL, "Number of files counted by analytics");
    describe_counter!(COMMITS_INDEXED_TOTAL, "Number of commits indexed");
    describe_counter!(EVENTS_INDEXED_TOTAL, "Number of view events indexed");
}
