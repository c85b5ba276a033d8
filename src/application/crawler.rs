// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::crawler_config::ConfigHandle;
use crate::config::settings::Settings;
use crate::config::watcher::ConfigWatcher;
use crate::domain::models::seed::Seed;
use crate::domain::repositories::seed_store::SeedStore;
use crate::domain::services::pipeline::Pipeline;
use crate::domain::services::seed_processor::SeedProcessor;
use crate::events::EventBus;
use crate::infrastructure::pipeline::ConsolePipeline;
use crate::infrastructure::seed_store::memory::InMemorySeedStore;
use crate::net::factory::{ProxySessionFactory, SessionFactory};
use crate::pool::session_pool::SessionPool;
use crate::queue::scheduler::{CrawlScheduler, SchedulerState};
use crate::utils::errors::CrawlError;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};
use validator::Validate;

/// 爬虫构建器
///
/// 除种子处理器外的组件都有默认实现：内存种子存储、控制台管道、
/// 按配置生成的代理会话工厂。
pub struct CrawlerBuilder {
    settings: Settings,
    store: Option<Arc<dyn SeedStore>>,
    processor: Option<Arc<dyn SeedProcessor>>,
    pipelines: Vec<Arc<dyn Pipeline>>,
    factory: Option<Arc<dyn SessionFactory>>,
    events: Arc<EventBus>,
    config_file: Option<(PathBuf, Duration)>,
}

impl CrawlerBuilder {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            store: None,
            processor: None,
            pipelines: Vec::new(),
            factory: None,
            events: Arc::new(EventBus::new()),
            config_file: None,
        }
    }

    pub fn seed_store(mut self, store: Arc<dyn SeedStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn processor(mut self, processor: Arc<dyn SeedProcessor>) -> Self {
        self.processor = Some(processor);
        self
    }

    /// 追加一个结果管道，调用顺序与注册顺序一致
    pub fn pipeline(mut self, pipeline: Arc<dyn Pipeline>) -> Self {
        self.pipelines.push(pipeline);
        self
    }

    pub fn session_factory(mut self, factory: Arc<dyn SessionFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// 启动后按`interval`轮询配置文件，变化时热更新运行时配置
    pub fn watch_config_file(mut self, path: impl Into<PathBuf>, interval: Duration) -> Self {
        self.config_file = Some((path.into(), interval));
        self
    }

    /// 构建前注册事件回调
    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// 构建爬虫
    ///
    /// # 返回值
    ///
    /// * `Ok(Crawler)` - 构建成功
    /// * `Err(CrawlError)` - 配置非法或缺少种子处理器
    pub fn build(self) -> Result<Crawler, CrawlError> {
        self.settings.validate()?;

        let processor = self
            .processor
            .ok_or(CrawlError::MissingComponent("seed processor"))?;
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemorySeedStore::new()));
        let factory = match self.factory {
            Some(factory) => factory,
            None => Arc::new(ProxySessionFactory::from_settings(&self.settings)?),
        };
        let mut pipelines = self.pipelines;
        if pipelines.is_empty() {
            pipelines.push(Arc::new(ConsolePipeline));
        }

        let events = self.events;
        let config = ConfigHandle::new(self.settings.crawler_config(), events.clone());
        let pool = SessionPool::new(self.settings.session_pool_config(), factory, events.clone());

        let pool_token = pool.shutdown_token();
        events.on_crawl_end(move || {
            info!("Crawl ended, stopping session replenishment");
            pool_token.cancel();
        });

        let scheduler = CrawlScheduler::new(
            store.clone(),
            pool.clone(),
            processor,
            pipelines,
            &self.settings.scheduler,
            config.clone(),
            events.clone(),
        );

        let watcher = self
            .config_file
            .map(|(path, interval)| ConfigWatcher::new(path, interval, config.clone()));

        Ok(Crawler {
            scheduler,
            pool,
            store,
            config,
            events,
            watcher: Mutex::new(watcher),
            dispatch: Mutex::new(None),
        })
    }
}

/// 爬虫门面
///
/// 持有调度器、会话池和种子存储，对外提供生命周期操作
pub struct Crawler {
    scheduler: CrawlScheduler,
    pool: SessionPool,
    store: Arc<dyn SeedStore>,
    config: ConfigHandle,
    events: Arc<EventBus>,
    watcher: Mutex<Option<ConfigWatcher>>,
    dispatch: Mutex<Option<JoinHandle<()>>>,
}

impl Crawler {
    pub fn builder(settings: Settings) -> CrawlerBuilder {
        CrawlerBuilder::new(settings)
    }

    /// 启动爬虫
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 派发循环已启动
    /// * `Err(CrawlError)` - 重复启动或组件初始化失败
    pub async fn start(&self) -> Result<(), CrawlError> {
        let handle = self.scheduler.start().await?;
        *self.dispatch.lock() = Some(handle);

        if let Some(watcher) = self.watcher.lock().take() {
            watcher.start(self.scheduler.cancellation_token());
        }
        Ok(())
    }

    /// 停止爬虫，可多次调用
    pub fn stop(&self) {
        self.scheduler.stop();
    }

    /// 等待派发循环结束
    pub async fn wait(&self) {
        let handle = self.dispatch.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("Dispatch loop terminated abnormally: {}", e);
            }
        }
    }

    /// 启动并等待爬虫结束
    pub async fn run_until_stopped(&self) -> Result<(), CrawlError> {
        self.start().await?;
        self.wait().await;
        Ok(())
    }

    pub async fn push_seed(&self, seed: Seed) -> Result<usize, CrawlError> {
        self.scheduler.push_seed(seed).await
    }

    pub async fn push_seeds(&self, seeds: Vec<Seed>) -> Result<usize, CrawlError> {
        self.scheduler.push_seeds(seeds).await
    }

    pub fn state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    pub fn scheduler(&self) -> &CrawlScheduler {
        &self.scheduler
    }

    pub fn config(&self) -> &ConfigHandle {
        &self.config
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn session_pool(&self) -> &SessionPool {
        &self.pool
    }

    pub fn seed_store(&self) -> &Arc<dyn SeedStore> {
        &self.store
    }
}
