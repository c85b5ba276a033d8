// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::SchedulerSettings;
use crate::events::EventBus;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

/// 可热更新的运行时配置快照
///
/// 快照不可变，变更时整体替换
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlerConfig {
    /// 工作池最大并发
    pub thread_number: usize,
    /// 种子耗尽且工作池空闲时退出
    pub exit_when_complete: bool,
    /// 是否启用慢启动
    pub slow_start: bool,
    /// 慢启动总时长
    pub slow_start_duration: Duration,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        CrawlerConfig::from(&SchedulerSettings::default())
    }
}

impl From<&SchedulerSettings> for CrawlerConfig {
    fn from(settings: &SchedulerSettings) -> Self {
        Self {
            thread_number: settings.thread_number,
            exit_when_complete: settings.exit_when_complete,
            slow_start: settings.slow_start,
            slow_start_duration: Duration::from_millis(settings.slow_start_duration_ms),
        }
    }
}

/// 配置快照句柄
///
/// 读取方每次取当前快照，不缓存字段；更新时原子替换快照
/// 并在事件总线上发布配置变更信号。
#[derive(Clone)]
pub struct ConfigHandle {
    tx: Arc<watch::Sender<Arc<CrawlerConfig>>>,
    events: Arc<EventBus>,
}

impl ConfigHandle {
    pub fn new(config: CrawlerConfig, events: Arc<EventBus>) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(config));
        Self {
            tx: Arc::new(tx),
            events,
        }
    }

    /// 当前配置快照
    pub fn current(&self) -> Arc<CrawlerConfig> {
        self.tx.borrow().clone()
    }

    /// 替换配置快照
    ///
    /// 新旧配置相同时不发布变更信号
    ///
    /// # 返回值
    ///
    /// 是否发生了变更
    pub fn update(&self, config: CrawlerConfig) -> bool {
        let new = Arc::new(config);
        let old = self.tx.send_replace(new.clone());
        if *old == *new {
            return false;
        }

        info!(
            "Crawler config updated: thread_number {} -> {}",
            old.thread_number, new.thread_number
        );
        self.events.publish_config_changed(&old, &new);
        true
    }

    /// 订阅配置变更
    pub fn subscribe(&self) -> watch::Receiver<Arc<CrawlerConfig>> {
        self.tx.subscribe()
    }
}
