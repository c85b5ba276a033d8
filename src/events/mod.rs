// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 事件总线模块
//!
//! 按信号类型分别维护回调注册表，发布时按注册顺序同步调用

use crate::config::crawler_config::CrawlerConfig;
use crate::net::session::Session;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

type SignalHandler = Arc<dyn Fn() + Send + Sync>;
type SessionCreatedHandler = Arc<dyn Fn(&mut Session) + Send + Sync>;
type SessionBorrowedHandler = Arc<dyn Fn(&Session) + Send + Sync>;
type ConfigChangedHandler = Arc<dyn Fn(&CrawlerConfig, &CrawlerConfig) + Send + Sync>;

/// 单一信号的回调注册表
struct Registry<H> {
    handlers: RwLock<Vec<H>>,
}

impl<H: Clone> Registry<H> {
    fn new() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
        }
    }

    fn register(&self, handler: H) {
        self.handlers.write().push(handler);
    }

    // Handlers run outside the lock so they may register further handlers
    fn snapshot(&self) -> Vec<H> {
        self.handlers.read().clone()
    }

    fn len(&self) -> usize {
        self.handlers.read().len()
    }
}

/// 类型化事件总线
///
/// 调度器和会话池在生命周期节点上发布信号，
/// 协作方通过 `on_*` 注册回调。
pub struct EventBus {
    crawl_start: Registry<SignalHandler>,
    crawl_end: Registry<SignalHandler>,
    seed_empty: Registry<SignalHandler>,
    session_created: Registry<SessionCreatedHandler>,
    session_borrowed: Registry<SessionBorrowedHandler>,
    config_changed: Registry<ConfigChangedHandler>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            crawl_start: Registry::new(),
            crawl_end: Registry::new(),
            seed_empty: Registry::new(),
            session_created: Registry::new(),
            session_borrowed: Registry::new(),
            config_changed: Registry::new(),
        }
    }

    /// 注册爬虫启动回调
    pub fn on_crawl_start<F>(&self, handler: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.crawl_start.register(Arc::new(handler));
    }

    /// 注册爬虫结束回调
    pub fn on_crawl_end<F>(&self, handler: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.crawl_end.register(Arc::new(handler));
    }

    /// 注册种子耗尽回调
    pub fn on_seed_empty<F>(&self, handler: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.seed_empty.register(Arc::new(handler));
    }

    /// 注册会话创建回调
    ///
    /// 回调可以修改会话，或调用 `invalidate` 拒绝它进入会话池
    pub fn on_session_created<F>(&self, handler: F)
    where
        F: Fn(&mut Session) + Send + Sync + 'static,
    {
        self.session_created.register(Arc::new(handler));
    }

    /// 注册会话借出回调
    pub fn on_session_borrowed<F>(&self, handler: F)
    where
        F: Fn(&Session) + Send + Sync + 'static,
    {
        self.session_borrowed.register(Arc::new(handler));
    }

    /// 注册配置变更回调
    ///
    /// # 参数
    ///
    /// * `handler` - 接收 (旧配置, 新配置)
    pub fn on_config_changed<F>(&self, handler: F)
    where
        F: Fn(&CrawlerConfig, &CrawlerConfig) + Send + Sync + 'static,
    {
        self.config_changed.register(Arc::new(handler));
    }

    pub fn publish_crawl_start(&self) {
        for handler in self.crawl_start.snapshot() {
            handler();
        }
    }

    pub fn publish_crawl_end(&self) {
        for handler in self.crawl_end.snapshot() {
            handler();
        }
    }

    pub fn publish_seed_empty(&self) {
        for handler in self.seed_empty.snapshot() {
            handler();
        }
    }

    pub fn publish_session_created(&self, session: &mut Session) {
        for handler in self.session_created.snapshot() {
            handler(session);
        }
    }

    pub fn publish_session_borrowed(&self, session: &Session) {
        for handler in self.session_borrowed.snapshot() {
            handler(session);
        }
    }

    pub fn publish_config_changed(&self, old: &CrawlerConfig, new: &CrawlerConfig) {
        for handler in self.config_changed.snapshot() {
            handler(old, new);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("crawl_start", &self.crawl_start.len())
            .field("crawl_end", &self.crawl_end.len())
            .field("seed_empty", &self.seed_empty.len())
            .field("session_created", &self.session_created.len())
            .field("session_borrowed", &self.session_borrowed.len())
            .field("config_changed", &self.config_changed.len())
            .finish()
    }
}
