// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::net::proxy::{IpPool, Proxy};
use crate::pool::session_pool::PoolSlot;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

/// 连续失败达到此次数后会话失效
pub const MAX_CONSECUTIVE_FAILURES: u32 = 3;

/// 会话：一个可租借的网络身份
///
/// 由HTTP客户端和绑定的代理组成。会话要么空闲在池中，
/// 要么被恰好一个处理任务持有。
pub struct Session {
    id: Uuid,
    client: reqwest::Client,
    proxy: Option<Proxy>,
    ip_pool: Option<Arc<dyn IpPool>>,
    created_at: Instant,
    last_active: Option<Instant>,
    valid: bool,
    consecutive_failures: u32,
    slot: Option<PoolSlot>,
}

impl Session {
    /// 创建一个新会话
    ///
    /// # 参数
    ///
    /// * `client` - 会话专属的HTTP客户端
    /// * `proxy` - 绑定的代理，直连时为None
    /// * `ip_pool` - 代理来源，会话销毁时代理归还给它
    pub fn new(
        client: reqwest::Client,
        proxy: Option<Proxy>,
        ip_pool: Option<Arc<dyn IpPool>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            client,
            proxy,
            ip_pool,
            created_at: Instant::now(),
            last_active: None,
            valid: true,
            consecutive_failures: 0,
            slot: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn proxy(&self) -> Option<&Proxy> {
        self.proxy.as_ref()
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// 标记会话失效，失效会话不会再回到会话池
    pub fn invalidate(&mut self) {
        if self.valid {
            debug!("Session {} invalidated", self.id);
        }
        self.valid = false;
    }

    /// 记录一次使用
    pub fn touch(&mut self) {
        self.last_active = Some(Instant::now());
    }

    pub fn last_active(&self) -> Option<Instant> {
        self.last_active
    }

    /// 记录一次成功使用
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        if let (Some(pool), Some(proxy)) = (&self.ip_pool, &self.proxy) {
            pool.feedback(proxy, true);
        }
    }

    /// 记录一次失败使用，连续失败过多时会话失效
    pub fn record_failure(&mut self) {
        self.consecutive_failures += 1;
        if let (Some(pool), Some(proxy)) = (&self.ip_pool, &self.proxy) {
            pool.feedback(proxy, false);
        }
        if self.consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
            warn!(
                "Session {} failed {} times in a row, invalidating",
                self.id, self.consecutive_failures
            );
            self.invalidate();
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// 自创建以来的在线时长
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// 距上次使用的时长，从未使用过时为None
    pub fn idle_for(&self) -> Option<Duration> {
        self.last_active.map(|t| t.elapsed())
    }

    /// 销毁会话，释放代理并归还容量
    pub fn destroy(self) {
        debug!("Session {} destroyed", self.id);
        drop(self);
    }

    pub(crate) fn attach_slot(&mut self, slot: PoolSlot) {
        self.slot = Some(slot);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let (Some(pool), Some(proxy)) = (&self.ip_pool, &self.proxy) {
            pool.release(proxy);
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("proxy", &self.proxy.as_ref().map(ToString::to_string))
            .field("valid", &self.valid)
            .field("consecutive_failures", &self.consecutive_failures)
            .field("age", &self.age())
            .finish()
    }
}
