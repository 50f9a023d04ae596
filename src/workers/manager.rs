// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::utils::errors::WorkerError;
use crate::workers::worker::Worker;

/// 工作管理器
///
/// 启动后台工作器并在关闭时统一取消、等待其退出
pub struct WorkerManager {
    cancel: CancellationToken,
    handles: Vec<(String, JoinHandle<Result<(), WorkerError>>)>,
}

impl Default for WorkerManager {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerManager {
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            handles: Vec::new(),
        }
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 在独立任务中运行工作器
    pub fn spawn(&mut self, worker: Arc<dyn Worker>) {
        let name = worker.name().to_string();
        let cancel = self.cancel.child_token();
        info!("Starting {}", name);
        let handle = tokio::spawn(async move { worker.run(cancel).await });
        self.handles.push((name, handle));
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// 取消所有工作器并等待退出
    pub async fn shutdown(&mut self) {
        self.cancel.cancel();

        for (name, handle) in self.handles.drain(..) {
            match handle.await {
                Ok(Ok(())) => info!("{} stopped", name),
                Ok(Err(e)) => error!("{} exited with error: {}", name, e),
                Err(e) => error!("{} panicked: {}", name, e),
            }
        }
    }

    /// 等待关闭信号并关闭工作进程
    pub async fn wait_for_shutdown(&mut self) {
        match signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(err) => error!("Unable to listen for shutdown signal: {}", err),
        }

        info!("Shutting down workers...");
        self.shutdown().await;
        info!("Workers shut down successfully");
    }
}
