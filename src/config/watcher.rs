// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::crawler_config::ConfigHandle;
use crate::config::settings::Settings;
use crate::utils::errors::CrawlError;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use validator::Validate;

/// 配置文件监视器
///
/// 定期检查配置文件的修改时间，文件变化时重新加载
/// 并通过 `ConfigHandle` 替换运行时快照。
pub struct ConfigWatcher {
    path: PathBuf,
    interval: Duration,
    handle: ConfigHandle,
}

impl ConfigWatcher {
    /// 创建新的配置文件监视器
    ///
    /// # 参数
    ///
    /// * `path` - 配置文件路径
    /// * `interval` - 轮询间隔
    /// * `handle` - 配置快照句柄
    pub fn new(path: impl Into<PathBuf>, interval: Duration, handle: ConfigHandle) -> Self {
        Self {
            path: path.into(),
            interval,
            handle,
        }
    }

    /// 启动监视任务，令牌取消时退出
    pub fn start(self, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("Watching config file {}", self.path.display());
            let mut last_modified = modified_time(&self.path).await;
            let mut ticker = tokio::time::interval(self.interval);
            // First tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!("Config watcher stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let modified = modified_time(&self.path).await;
                        if modified.is_none() || modified == last_modified {
                            continue;
                        }
                        last_modified = modified;

                        match self.reload() {
                            Ok(true) => info!("Config reloaded from {}", self.path.display()),
                            Ok(false) => debug!("Config file touched without runtime changes"),
                            Err(e) => error!("Failed to reload config from {}: {}", self.path.display(), e),
                        }
                    }
                }
            }
        })
    }

    /// 重新加载配置文件
    ///
    /// # 返回值
    ///
    /// * `Ok(true)` - 运行时快照已更新
    /// * `Ok(false)` - 运行时相关配置没有变化
    /// * `Err(CrawlError)` - 加载或校验失败，旧快照继续生效
    pub fn reload(&self) -> Result<bool, CrawlError> {
        let settings = Settings::from_file(&self.path)?;
        settings.validate()?;
        Ok(self.handle.update(settings.crawler_config()))
    }
}

async fn modified_time(path: &Path) -> Option<SystemTime> {
    match tokio::fs::metadata(path).await.and_then(|m| m.modified()) {
        Ok(time) => Some(time),
        Err(e) => {
            warn!("Cannot stat config file {}: {}", path.display(), e);
            None
        }
    }
}
