// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::crawler_config::CrawlerConfig;
use crate::net::proxy::ProxyStrategy;
use crate::pool::session_pool::SessionPoolConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use validator::Validate;

/// 应用程序配置设置
///
/// 包含调度器、会话池、HTTP、代理和遥测等所有配置项
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct Settings {
    /// 调度器配置
    #[validate(nested)]
    pub scheduler: SchedulerSettings,
    /// 会话池配置
    #[validate(nested)]
    pub session_pool: SessionPoolSettings,
    /// HTTP客户端配置
    pub http: HttpSettings,
    /// 代理配置
    pub proxy: ProxySettings,
    /// 遥测配置
    pub telemetry: TelemetrySettings,
}

/// 调度器配置设置
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SchedulerSettings {
    /// 工作线程数（最大并发）
    #[validate(range(min = 1))]
    pub thread_number: usize,
    /// 种子耗尽且工作池空闲时退出
    pub exit_when_complete: bool,
    /// 是否启用慢启动
    pub slow_start: bool,
    /// 慢启动总时长（毫秒）
    pub slow_start_duration_ms: u64,
    /// 单次借用会话的最长等待（毫秒）
    pub borrow_max_wait_ms: u64,
    /// 借用失败后的重试间隔（毫秒）
    pub borrow_retry_interval_ms: u64,
    /// 拉取种子的最长等待（毫秒）
    pub pull_wait_ms: u64,
}

/// 会话池配置设置
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SessionPoolSettings {
    /// 会话总数上限（空闲 + 借出）
    #[validate(range(min = 1))]
    pub max_size: usize,
    /// 后台补充维持的空闲会话数
    pub core_size: usize,
    /// 初始化时创建的会话数
    pub initial_size: usize,
    /// 同一会话两次使用的最小间隔（毫秒）
    pub reuse_duration_ms: u64,
    /// 会话最长在线时间（毫秒），0 表示不限制
    pub max_online_duration_ms: u64,
}

/// HTTP客户端配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct HttpSettings {
    /// User-Agent
    pub user_agent: String,
    /// 请求超时（毫秒）
    pub timeout_ms: u64,
}

/// 代理配置设置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProxySettings {
    /// 代理URL列表
    #[serde(default)]
    pub urls: Vec<String>,
    /// 代理切换策略
    #[serde(default)]
    pub strategy: ProxyStrategy,
}

/// 遥测配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    /// 日志过滤表达式
    pub log_filter: String,
    /// Prometheus 导出地址，未设置时不启动
    pub metrics_addr: Option<String>,
}

/// 单次运行时会话的最大复用间隔（毫秒）
pub const ONE_SHOT_REUSE_MS: u64 = 1000;

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次加载内置默认值、`config/default`、`config/{APP_ENVIRONMENT}`
    /// 和 `SEEDCRAWL__` 前缀的环境变量
    ///
    /// # 返回值
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("SEEDCRAWL").separator("__"));

        builder.build()?.try_deserialize()
    }

    /// 从指定文件加载配置（缺省项使用内置默认值）
    ///
    /// 配置热加载使用此入口
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            // Scheduler
            .set_default("scheduler.thread_number", 10)?
            .set_default("scheduler.exit_when_complete", false)?
            .set_default("scheduler.slow_start", false)?
            .set_default("scheduler.slow_start_duration_ms", 5 * 60 * 1000)?
            .set_default("scheduler.borrow_max_wait_ms", 1000)?
            .set_default("scheduler.borrow_retry_interval_ms", 500)?
            .set_default("scheduler.pull_wait_ms", 1000)?
            // Session pool
            .set_default("session_pool.max_size", 10)?
            .set_default("session_pool.core_size", 0)?
            .set_default("session_pool.initial_size", 0)?
            .set_default("session_pool.reuse_duration_ms", 60 * 60 * 1000)?
            .set_default("session_pool.max_online_duration_ms", 0)?
            // HTTP
            .set_default("http.user_agent", concat!("seedcrawl/", env!("CARGO_PKG_VERSION")))?
            .set_default("http.timeout_ms", 30_000)?
            // Proxy
            .set_default("proxy.strategy", "direct")?
            // Telemetry
            .set_default("telemetry.log_filter", "info,seedcrawl=debug")
    }

    /// 当前配置对应的运行时快照
    pub fn crawler_config(&self) -> CrawlerConfig {
        CrawlerConfig::from(&self.scheduler)
    }

    /// 当前配置对应的会话池配置
    pub fn session_pool_config(&self) -> SessionPoolConfig {
        SessionPoolConfig::from(&self.session_pool)
    }

    /// 单次运行配置：处理完全部种子后退出
    ///
    /// 复用间隔收紧到 `ONE_SHOT_REUSE_MS` 以内，池满后借用方
    /// 不会因为长复用间隔而长时间等待
    pub fn one_shot(mut self) -> Self {
        self.scheduler.exit_when_complete = true;
        self.session_pool.reuse_duration_ms = self.session_pool.reuse_duration_ms.min(ONE_SHOT_REUSE_MS);
        self
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            thread_number: 10,
            exit_when_complete: false,
            slow_start: false,
            slow_start_duration_ms: 5 * 60 * 1000,
            borrow_max_wait_ms: 1000,
            borrow_retry_interval_ms: 500,
            pull_wait_ms: 1000,
        }
    }
}

impl Default for SessionPoolSettings {
    fn default() -> Self {
        Self {
            max_size: 10,
            core_size: 0,
            initial_size: 0,
            reuse_duration_ms: 60 * 60 * 1000,
            max_online_duration_ms: 0,
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: concat!("seedcrawl/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_filter: "info,seedcrawl=debug".to_string(),
            metrics_addr: None,
        }
    }
}

impl From<&SessionPoolSettings> for SessionPoolConfig {
    fn from(settings: &SessionPoolSettings) -> Self {
        let max_online_duration = match settings.max_online_duration_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };

        SessionPoolConfig {
            max_size: settings.max_size,
            core_size: settings.core_size,
            initial_size: settings.initial_size,
            reuse_duration: Duration::from_millis(settings.reuse_duration_ms),
            max_online_duration,
        }
    }
}
