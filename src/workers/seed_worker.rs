// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::crawl_result::CrawlResult;
use crate::domain::models::seed::{Seed, SeedStatus};
use crate::domain::repositories::seed_store::SeedStore;
use crate::domain::services::pipeline::Pipeline;
use crate::domain::services::seed_processor::SeedProcessor;
use crate::net::session::Session;
use crate::pool::session_pool::SessionPool;
use futures::FutureExt;
use metrics::counter;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// 种子处理工作者
///
/// 执行单个种子的一次处理尝试：借用会话、调用处理器、
/// 回馈会话、上报种子存储并分发结果。处理错误不会逃出工作者。
#[derive(Clone)]
pub struct SeedWorker {
    store: Arc<dyn SeedStore>,
    pool: SessionPool,
    processor: Arc<dyn SeedProcessor>,
    pipelines: Arc<Vec<Arc<dyn Pipeline>>>,
    borrow_max_wait: Duration,
    borrow_retry_interval: Duration,
    cancel: CancellationToken,
}

impl SeedWorker {
    /// 创建新的种子处理工作者
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn SeedStore>,
        pool: SessionPool,
        processor: Arc<dyn SeedProcessor>,
        pipelines: Vec<Arc<dyn Pipeline>>,
        borrow_max_wait: Duration,
        borrow_retry_interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            store,
            pool,
            processor,
            pipelines: Arc::new(pipelines),
            borrow_max_wait,
            borrow_retry_interval,
            cancel,
        }
    }

    /// 处理一个种子
    #[instrument(skip(self, seed), fields(seed_id = %seed.id, seed = %seed.data, retry = seed.retry))]
    pub async fn process(&self, mut seed: Seed) {
        let Some(mut session) = self.borrow_session().await else {
            // Attempt never started, the store keeps the seed for the next run
            warn!("Crawl stopped before a session was available");
            self.finish(&seed).await;
            return;
        };

        if let Err(e) = seed.start() {
            error!("Cannot start seed: {}", e);
            self.pool.recycle(session);
            self.finish(&seed).await;
            return;
        }

        let origin_retry = seed.retry;
        let mut result = CrawlResult::new();
        let outcome = AssertUnwindSafe(self.processor.process(&mut seed, &mut session, &mut result))
            .catch_unwind()
            .await;

        let success = match outcome {
            Ok(Ok(())) => {
                if seed.status == SeedStatus::Running {
                    seed.status = SeedStatus::Success;
                }
                true
            }
            Ok(Err(e)) => {
                error!("process seed {} error: {:#}", seed_json(&seed), e);
                force_retry(&mut seed, origin_retry);
                false
            }
            Err(panic) => {
                error!(
                    "process seed {} panicked: {}",
                    seed_json(&seed),
                    panic_message(panic.as_ref())
                );
                force_retry(&mut seed, origin_retry);
                false
            }
        };

        self.pool.feedback(session, success);
        self.finish(&seed).await;
        record_outcome(&seed);

        self.emit(&seed, result).await;
    }

    /// 借用会话，直到成功或爬虫停止
    async fn borrow_session(&self) -> Option<Session> {
        loop {
            match self.pool.borrow(self.borrow_max_wait).await {
                Ok(Some(session)) => return Some(session),
                Ok(None) => debug!("No session available, retrying"),
                Err(e) => error!("Session pool error: {}", e),
            }

            tokio::select! {
                _ = self.cancel.cancelled() => return None,
                _ = tokio::time::sleep(self.borrow_retry_interval) => {}
            }
        }
    }

    async fn finish(&self, seed: &Seed) {
        if let Err(e) = self.store.finish(seed).await {
            error!("Failed to report seed {} to store: {}", seed.id, e);
        }
    }

    /// 派生种子回到存储，条目按注册顺序交给各管道
    async fn emit(&self, origin: &Seed, result: CrawlResult) {
        let (items, seeds) = result.into_parts();

        if !seeds.is_empty() {
            let total = seeds.len();
            match self.store.add_new_seeds(seeds).await {
                Ok(added) => debug!("Added {} of {} derived seeds", added, total),
                Err(e) => error!("Failed to add derived seeds: {}", e),
            }
        }

        if items.is_empty() {
            return;
        }
        for pipeline in self.pipelines.iter() {
            if let Err(e) = pipeline.save_item(&items, origin).await {
                error!("Pipeline {} failed to save items: {:#}", pipeline.name(), e);
            }
        }
    }
}

/// 处理器失败且没有自行做出重试决定时，强制重试
fn force_retry(seed: &mut Seed, origin_retry: u32) {
    if seed.retry == origin_retry && seed.status == SeedStatus::Running {
        seed.retry();
    }
}

fn record_outcome(seed: &Seed) {
    match seed.status {
        SeedStatus::Success => counter!("seeds_succeeded_total").increment(1),
        SeedStatus::Retrying => counter!("seeds_retried_total").increment(1),
        SeedStatus::Fail => {
            info!("Seed {} failed after {} retries", seed.data, seed.retry);
            counter!("seeds_failed_total").increment(1)
        }
        SeedStatus::Init | SeedStatus::Running => {}
    }
}

fn seed_json(seed: &Seed) -> String {
    serde_json::to_string(seed).unwrap_or_else(|_| seed.data.clone())
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
