// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::queue::scheduler::CrawlScheduler;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// 安装进程退出钩子
///
/// 收到 Ctrl+C 时尽力停止调度器，进程被强制终止时不保证完成清理
pub fn install_shutdown_hook(scheduler: CrawlScheduler) -> JoinHandle<()> {
    let token = scheduler.cancellation_token();
    tokio::spawn(async move {
        tokio::select! {
            result = signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!("Failed to listen for shutdown signal: {}", e);
                    return;
                }
                info!("Shutdown signal received, stopping crawler");
                scheduler.stop();
            }
            _ = token.cancelled() => {}
        }
    })
}
