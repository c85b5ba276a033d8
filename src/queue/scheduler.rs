// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::crawler_config::ConfigHandle;
use crate::config::settings::SchedulerSettings;
use crate::domain::models::seed::Seed;
use crate::domain::repositories::seed_store::SeedStore;
use crate::domain::services::pipeline::Pipeline;
use crate::domain::services::seed_processor::SeedProcessor;
use crate::events::EventBus;
use crate::pool::session_pool::SessionPool;
use crate::utils::errors::CrawlError;
use crate::workers::pool::WorkerPool;
use crate::workers::seed_worker::SeedWorker;
use metrics::counter;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// 调度器状态
///
/// INIT → RUNNING → STOPPED，STOPPED 为终态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SchedulerState {
    Init = 0,
    Running = 1,
    Stopped = 2,
}

impl SchedulerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => SchedulerState::Init,
            1 => SchedulerState::Running,
            _ => SchedulerState::Stopped,
        }
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SchedulerState::Init => write!(f, "init"),
            SchedulerState::Running => write!(f, "running"),
            SchedulerState::Stopped => write!(f, "stopped"),
        }
    }
}

/// 爬虫任务调度器
///
/// 独立的派发循环从种子存储拉取种子，提交到有界工作池，
/// 工作池满时挂起等待任务完成（背压），并按配置执行慢启动。
#[derive(Clone)]
pub struct CrawlScheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    state: AtomicU8,
    store: Arc<dyn SeedStore>,
    pool: SessionPool,
    worker: SeedWorker,
    workers: WorkerPool,
    config: ConfigHandle,
    events: Arc<EventBus>,
    dispatch: Arc<Notify>,
    cancel: CancellationToken,
    pull_wait: Duration,
}

impl CrawlScheduler {
    /// 创建新的调度器
    ///
    /// # 参数
    ///
    /// * `store` - 种子存储
    /// * `pool` - 会话池
    /// * `processor` - 种子处理器
    /// * `pipelines` - 结果管道，按注册顺序调用
    /// * `settings` - 调度器配置
    /// * `config` - 运行时配置快照句柄
    /// * `events` - 事件总线
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn SeedStore>,
        pool: SessionPool,
        processor: Arc<dyn SeedProcessor>,
        pipelines: Vec<Arc<dyn Pipeline>>,
        settings: &SchedulerSettings,
        config: ConfigHandle,
        events: Arc<EventBus>,
    ) -> Self {
        let dispatch = Arc::new(Notify::new());
        let cancel = CancellationToken::new();
        let workers = WorkerPool::new(config.clone(), dispatch.clone());
        let worker = SeedWorker::new(
            store.clone(),
            pool.clone(),
            processor,
            pipelines,
            Duration::from_millis(settings.borrow_max_wait_ms),
            Duration::from_millis(settings.borrow_retry_interval_ms),
            cancel.child_token(),
        );

        let notifier = dispatch.clone();
        events.on_config_changed(move |old, new| {
            if old.thread_number != new.thread_number {
                info!(
                    "Worker thread number changed from {} to {}",
                    old.thread_number, new.thread_number
                );
            }
            notifier.notify_one();
        });

        Self {
            inner: Arc::new(SchedulerInner {
                state: AtomicU8::new(SchedulerState::Init as u8),
                store,
                pool,
                worker,
                workers,
                config,
                events,
                dispatch,
                cancel,
                pull_wait: Duration::from_millis(settings.pull_wait_ms),
            }),
        }
    }

    /// 启动调度器
    ///
    /// 初始化种子存储和会话池，发布启动信号，并在独立任务上运行派发循环
    ///
    /// # 返回值
    ///
    /// * `Ok(JoinHandle)` - 派发循环的句柄
    /// * `Err(CrawlError::IllegalState)` - 调度器不处于INIT状态
    /// * `Err(CrawlError)` - 组件初始化失败，调度器进入STOPPED
    pub async fn start(&self) -> Result<JoinHandle<()>, CrawlError> {
        if let Err(current) = self.transition(SchedulerState::Init, SchedulerState::Running) {
            return Err(CrawlError::IllegalState(format!(
                "Crawler is already {}",
                current
            )));
        }

        if let Err(e) = self.init_components().await {
            error!("Crawler startup aborted: {}", e);
            self.inner
                .state
                .store(SchedulerState::Stopped as u8, Ordering::Release);
            self.inner.cancel.cancel();
            return Err(e);
        }

        info!(
            "Crawler started with {} worker threads",
            self.inner.workers.max_concurrency()
        );
        self.inner.events.publish_crawl_start();

        let scheduler = self.clone();
        Ok(tokio::spawn(async move { scheduler.dispatch_loop().await }))
    }

    async fn init_components(&self) -> Result<(), CrawlError> {
        self.inner.store.init().await?;
        self.inner.pool.init().await?;
        Ok(())
    }

    /// 停止调度器
    ///
    /// 可在任意任务中多次调用，结束信号只发布一次
    pub fn stop(&self) {
        self.inner.cancel.cancel();

        match self.transition(SchedulerState::Running, SchedulerState::Stopped) {
            Ok(()) => {
                info!("Crawler stopped");
                self.inner.events.publish_crawl_end();
            }
            Err(SchedulerState::Init) => {
                if self
                    .transition(SchedulerState::Init, SchedulerState::Stopped)
                    .is_ok()
                {
                    info!("Crawler stopped before it was started");
                }
            }
            Err(_) => info!("Crawler is already stopped"),
        }
    }

    /// 加入一个种子并唤醒派发循环
    pub async fn push_seed(&self, seed: Seed) -> Result<usize, CrawlError> {
        self.push_seeds(vec![seed]).await
    }

    /// 批量加入种子并唤醒派发循环
    ///
    /// # 返回值
    ///
    /// 实际入队的种子数量
    pub async fn push_seeds(&self, seeds: Vec<Seed>) -> Result<usize, CrawlError> {
        let added = self.inner.store.add_new_seeds(seeds).await?;
        self.inner.dispatch.notify_one();
        Ok(added)
    }

    pub fn state(&self) -> SchedulerState {
        SchedulerState::from_u8(self.inner.state.load(Ordering::Acquire))
    }

    /// 正在执行的任务数
    pub fn active_tasks(&self) -> usize {
        self.inner.workers.active_count()
    }

    pub fn workers(&self) -> &WorkerPool {
        &self.inner.workers
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.inner.cancel.clone()
    }

    fn transition(&self, from: SchedulerState, to: SchedulerState) -> Result<(), SchedulerState> {
        self.inner
            .state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(SchedulerState::from_u8)
    }

    async fn dispatch_loop(self) {
        let inner = &self.inner;
        let mut submitted: usize = 0;

        'dispatch: loop {
            let pulled = tokio::select! {
                _ = inner.cancel.cancelled() => break 'dispatch,
                pulled = inner.store.pull(inner.pull_wait) => pulled,
            };

            let seed = match pulled {
                Ok(Some(seed)) => seed,
                Ok(None) => {
                    inner.events.publish_seed_empty();
                    if inner.config.current().exit_when_complete
                        && inner.workers.is_idle()
                        && inner.store.is_empty().await
                    {
                        info!("All seeds processed, crawler exiting");
                        break 'dispatch;
                    }
                    if !self.wait_dispatch(Some(inner.pull_wait)).await {
                        break 'dispatch;
                    }
                    continue;
                }
                Err(e) => {
                    error!("Failed to pull seed: {}", e);
                    if !self.wait_dispatch(Some(inner.pull_wait)).await {
                        break 'dispatch;
                    }
                    continue;
                }
            };

            debug!("Dispatching seed {}", seed.data);
            let worker = inner.worker.clone();
            if !inner.workers.submit(async move { worker.process(seed).await }) {
                break 'dispatch;
            }
            submitted += 1;
            counter!("seeds_dispatched_total").increment(1);

            // Backpressure: the limit is re-read on every check so a resize applies at once
            while inner.workers.in_flight() >= inner.workers.max_concurrency() {
                if !self.wait_dispatch(None).await {
                    break 'dispatch;
                }
            }

            let config = inner.config.current();
            if config.slow_start && submitted < config.thread_number {
                let step = config.slow_start_duration / config.thread_number as u32;
                debug!(
                    "Slow start {}/{}, sleeping {:?}",
                    submitted, config.thread_number, step
                );
                tokio::select! {
                    _ = inner.cancel.cancelled() => break 'dispatch,
                    _ = tokio::time::sleep(step) => {}
                }
            }
        }

        inner.workers.shutdown().await;
        self.stop();
    }

    /// 挂起派发循环直到被唤醒
    ///
    /// # 返回值
    ///
    /// 被取消时返回false
    async fn wait_dispatch(&self, timeout: Option<Duration>) -> bool {
        let inner = &self.inner;
        let notified = inner.dispatch.notified();
        match timeout {
            Some(timeout) => tokio::select! {
                _ = inner.cancel.cancelled() => {
                    warn!("Dispatch wait interrupted");
                    false
                }
                _ = notified => true,
                _ = tokio::time::sleep(timeout) => true,
            },
            None => tokio::select! {
                _ = inner.cancel.cancelled() => {
                    warn!("Dispatch wait interrupted");
                    false
                }
                _ = notified => true,
            },
        }
    }
}
