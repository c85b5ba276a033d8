// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

/// 安装Prometheus导出器并注册指标描述
///
/// # 参数
///
/// * `addr` - 监听地址，例如 `0.0.0.0:9000`
pub fn init_metrics(addr: &str) {
    let addr: SocketAddr = match addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Invalid metrics address {}: {}", addr, e);
            return;
        }
    };

    // Ignore error if address is already in use (for development/testing)
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!("Failed to install Prometheus recorder: {}. This might happen if the port is already in use.", e);
        return;
    }

    describe_metrics();
    info!("Metrics exporter listening on {}", addr);
}

fn describe_metrics() {
    describe_counter!("seeds_dispatched_total", "Seeds submitted to the worker pool");
    describe_counter!("seeds_succeeded_total", "Seeds processed successfully");
    describe_counter!("seeds_retried_total", "Processing attempts that ended in a retry");
    describe_counter!("seeds_failed_total", "Seeds that exhausted their retries");
    describe_gauge!("scheduler_active_tasks", "Seed processing tasks currently executing");
    describe_counter!("sessions_created_total", "Sessions admitted by the session pool");
    describe_counter!("sessions_destroyed_total", "Sessions evicted or invalidated");
    describe_counter!("session_create_failures_total", "Failed or rejected session creations");
    describe_gauge!("session_pool_idle", "Idle sessions in the pool");
}
