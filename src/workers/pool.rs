// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::domain::repositories::job_repository::JobQueueStore;
use crate::utils::errors::WorkerError;
use crate::workers::signal_worker::SignalWorker;
use crate::workers::worker::Worker;

/// 固定并发的工作池
///
/// 各处理槽独立轮询，互斥完全依赖任务队列的原子领取
pub struct WorkerPool<J>
where
    J: JobQueueStore + ?Sized,
{
    worker: Arc<SignalWorker<J>>,
}

impl<J> WorkerPool<J>
where
    J: JobQueueStore + ?Sized,
{
    pub fn new(worker: Arc<SignalWorker<J>>) -> Self {
        Self { worker }
    }
}

#[async_trait]
impl<J> Worker for WorkerPool<J>
where
    J: JobQueueStore + ?Sized + 'static,
{
    async fn run(&self, cancel: CancellationToken) -> Result<(), WorkerError> {
        let options = self.worker.options();
        info!(
            "Starting worker pool with {} handlers on {}",
            options.num_handlers, options.hostname
        );

        let slots = (0..options.num_handlers).map(|slot| {
            let worker = self.worker.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { worker.run_slot(slot, cancel).await })
        });

        for result in join_all(slots).await {
            if let Err(e) = result {
                error!("Worker slot terminated abnormally: {}", e);
            }
        }

        info!("Worker pool stopped");
        Ok(())
    }

    fn name(&self) -> &str {
        "worker-pool"
    }
}
