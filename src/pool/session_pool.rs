// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::events::EventBus;
use crate::net::factory::SessionFactory;
use crate::net::session::Session;
use crate::utils::errors::PoolError;
use metrics::{counter, gauge};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{Notify, OnceCell};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// 会话池配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPoolConfig {
    /// 会话总数上限（空闲 + 借出）
    pub max_size: usize,
    /// 后台补充维持的空闲会话数
    pub core_size: usize,
    /// 初始化时创建的会话数
    pub initial_size: usize,
    /// 同一会话两次使用的最小间隔
    pub reuse_duration: Duration,
    /// 会话最长在线时间，None 表示不限制
    pub max_online_duration: Option<Duration>,
}

impl SessionPoolConfig {
    /// 校验池大小关系
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 配置合法
    /// * `Err(PoolError::InvalidConfig)` - 大小关系不成立
    pub fn check(&self) -> Result<(), PoolError> {
        if self.max_size == 0 {
            return Err(PoolError::InvalidConfig("max_size must be positive".into()));
        }
        if self.initial_size > self.max_size {
            return Err(PoolError::InvalidConfig(format!(
                "initial_size {} exceeds max_size {}",
                self.initial_size, self.max_size
            )));
        }
        if self.core_size > self.max_size {
            return Err(PoolError::InvalidConfig(format!(
                "core_size {} exceeds max_size {}",
                self.core_size, self.max_size
            )));
        }
        Ok(())
    }
}

impl Default for SessionPoolConfig {
    fn default() -> Self {
        Self {
            max_size: 10,
            core_size: 0,
            initial_size: 0,
            reuse_duration: Duration::from_secs(3600),
            max_online_duration: None,
        }
    }
}

/// 会话池容量占位
///
/// 每个存活会话持有一个占位，会话销毁时占位释放并唤醒等待的借用方
pub struct PoolSlot {
    live: Arc<AtomicUsize>,
    available: Arc<Notify>,
}

impl PoolSlot {
    fn reserve(live: &Arc<AtomicUsize>, available: &Arc<Notify>, max_size: usize) -> Option<Self> {
        live.fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
            (n < max_size).then_some(n + 1)
        })
        .ok()
        .map(|_| PoolSlot {
            live: live.clone(),
            available: available.clone(),
        })
    }
}

impl Drop for PoolSlot {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::AcqRel);
        self.available.notify_one();
    }
}

struct PoolInner {
    config: SessionPoolConfig,
    factory: Arc<dyn SessionFactory>,
    events: Arc<EventBus>,
    idle: Mutex<VecDeque<Session>>,
    live: Arc<AtomicUsize>,
    available: Arc<Notify>,
    depleted: Arc<Notify>,
    inited: OnceCell<()>,
    shutdown: CancellationToken,
}

impl Drop for PoolInner {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// 会话资源池
///
/// 负责会话的创建、校验、淘汰和租借，并在后台
/// 把空闲会话数补充到 `core_size`。
#[derive(Clone)]
pub struct SessionPool {
    inner: Arc<PoolInner>,
}

impl SessionPool {
    /// 创建新的会话池
    ///
    /// 会话池在第一次借用或显式调用 `init` 时初始化
    ///
    /// # 参数
    ///
    /// * `config` - 会话池配置
    /// * `factory` - 会话工厂
    /// * `events` - 事件总线
    pub fn new(
        config: SessionPoolConfig,
        factory: Arc<dyn SessionFactory>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                config,
                factory,
                events,
                idle: Mutex::new(VecDeque::new()),
                live: Arc::new(AtomicUsize::new(0)),
                available: Arc::new(Notify::new()),
                depleted: Arc::new(Notify::new()),
                inited: OnceCell::new(),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    pub fn config(&self) -> &SessionPoolConfig {
        &self.inner.config
    }

    /// 初始化会话池
    ///
    /// 多次调用只初始化一次；并发调用方等待同一次初始化完成。
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 初始化完成
    /// * `Err(PoolError)` - 配置非法或无法创建足够的初始会话
    pub async fn init(&self) -> Result<(), PoolError> {
        self.inner
            .inited
            .get_or_try_init(|| self.initialize())
            .await
            .map(|_| ())
    }

    async fn initialize(&self) -> Result<(), PoolError> {
        let config = &self.inner.config;
        config.check()?;

        let target = config.initial_size;
        let max_attempts = target * 3;
        let mut attempts = 0;
        while self.idle_count() < target && attempts < max_attempts {
            attempts += 1;
            if let Some(session) = self.create_session().await {
                self.inner.idle.lock().push_back(session);
            }
        }

        let created = self.idle_count();
        if created < target {
            self.inner.idle.lock().clear();
            return Err(PoolError::InitFailed(format!(
                "created {} of {} initial sessions after {} attempts",
                created, target, attempts
            )));
        }

        self.spawn_replenisher();
        if created < config.core_size {
            self.inner.depleted.notify_one();
        }

        gauge!("session_pool_idle").set(created as f64);
        info!(
            "Session pool initialized: idle={}, core_size={}, max_size={}",
            created, config.core_size, config.max_size
        );
        Ok(())
    }

    /// 借用一个会话
    ///
    /// 优先取空闲会话，没有空闲会话时同步创建；都不可得时在
    /// `max_wait` 内等待归还。借出前依次检查有效性、复用间隔和在线时长。
    ///
    /// # 参数
    ///
    /// * `max_wait` - 最长等待时间
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(Session))` - 借到的会话
    /// * `Ok(None)` - 等待超时
    /// * `Err(PoolError)` - 会话池初始化失败
    pub async fn borrow(&self, max_wait: Duration) -> Result<Option<Session>, PoolError> {
        self.init().await?;

        let config = &self.inner.config;
        let deadline = Instant::now().checked_add(max_wait);
        let mut set_aside = Vec::new();

        let borrowed = loop {
            let candidate = match self.try_take_idle() {
                Some(session) => Some(session),
                None => self.create_session().await,
            };

            let session = match candidate {
                Some(session) => session,
                None => {
                    if self.wait_available(deadline).await {
                        continue;
                    }
                    break None;
                }
            };

            if !session.is_valid() {
                self.discard(session, "invalid");
                continue;
            }

            if let Some(idle) = session.idle_for() {
                if idle < config.reuse_duration {
                    debug!(
                        "Session {} used {:?} ago, keeping it aside",
                        session.id(),
                        idle
                    );
                    set_aside.push(session);
                    continue;
                }
            }

            if let Some(max_online) = config.max_online_duration {
                if session.age() > max_online {
                    self.discard(session, "max online duration exceeded");
                    continue;
                }
            }

            self.inner.events.publish_session_borrowed(&session);
            break Some(session);
        };

        for session in set_aside {
            self.admit(session);
        }

        Ok(borrowed)
    }

    /// 归还会话
    ///
    /// 失效会话或池已满时销毁，否则放回空闲队列
    pub fn recycle(&self, session: Session) {
        if !session.is_valid() {
            self.discard(session, "invalid");
            return;
        }

        let mut idle = self.inner.idle.lock();
        if idle.len() >= self.inner.config.max_size {
            drop(idle);
            self.discard(session, "pool full");
            return;
        }
        idle.push_back(session);
        let len = idle.len();
        drop(idle);

        gauge!("session_pool_idle").set(len as f64);
        self.inner.available.notify_one();
    }

    /// 上报会话的使用结果并归还
    ///
    /// # 参数
    ///
    /// * `session` - 借出的会话
    /// * `success` - 本次使用是否成功
    pub fn feedback(&self, mut session: Session, success: bool) {
        if success {
            session.record_success();
        } else {
            session.record_failure();
        }
        session.touch();
        self.recycle(session);
    }

    /// 空闲会话数
    pub fn idle_count(&self) -> usize {
        self.inner.idle.lock().len()
    }

    /// 存活会话数（空闲 + 借出）
    pub fn live_count(&self) -> usize {
        self.inner.live.load(Ordering::Acquire)
    }

    /// 停止后台补充，借出的会话不受影响
    pub fn shutdown(&self) {
        if !self.inner.shutdown.is_cancelled() {
            info!("Session pool shutting down");
        }
        self.inner.shutdown.cancel();
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.inner.shutdown.clone()
    }

    async fn create_session(&self) -> Option<Session> {
        let slot = match PoolSlot::reserve(
            &self.inner.live,
            &self.inner.available,
            self.inner.config.max_size,
        ) {
            Some(slot) => slot,
            None => {
                debug!("Session pool at capacity, cannot create session");
                return None;
            }
        };

        match self.inner.factory.create().await {
            Ok(mut session) => {
                session.attach_slot(slot);
                self.inner.events.publish_session_created(&mut session);
                if !session.is_valid() {
                    warn!("Session {} rejected after creation", session.id());
                    counter!("session_create_failures_total").increment(1);
                    return None;
                }
                counter!("sessions_created_total").increment(1);
                Some(session)
            }
            Err(e) => {
                warn!("Failed to create session: {}", e);
                counter!("session_create_failures_total").increment(1);
                None
            }
        }
    }

    fn try_take_idle(&self) -> Option<Session> {
        let (session, remaining) = {
            let mut idle = self.inner.idle.lock();
            let session = idle.pop_front();
            (session, idle.len())
        };

        if session.is_some() {
            gauge!("session_pool_idle").set(remaining as f64);
        }
        if remaining < self.inner.config.core_size {
            self.inner.depleted.notify_one();
        }
        session
    }

    async fn wait_available(&self, deadline: Option<Instant>) -> bool {
        let notified = self.inner.available.notified();
        match deadline {
            Some(deadline) => {
                if Instant::now() >= deadline {
                    return false;
                }
                tokio::time::timeout_at(deadline, notified).await.is_ok()
            }
            None => {
                notified.await;
                true
            }
        }
    }

    fn admit(&self, session: Session) {
        let len = {
            let mut idle = self.inner.idle.lock();
            idle.push_back(session);
            idle.len()
        };
        gauge!("session_pool_idle").set(len as f64);
        self.inner.available.notify_one();
    }

    fn discard(&self, session: Session, reason: &str) {
        debug!("Destroying session {}: {}", session.id(), reason);
        counter!("sessions_destroyed_total").increment(1);
        session.destroy();
    }

    fn spawn_replenisher(&self) {
        let weak: Weak<PoolInner> = Arc::downgrade(&self.inner);
        let depleted = self.inner.depleted.clone();
        let token = self.inner.shutdown.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = depleted.notified() => {}
                }
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                SessionPool { inner }.replenish().await;
            }
            debug!("Session replenisher stopped");
        });
    }

    async fn replenish(&self) {
        let config = &self.inner.config;
        let idle = self.idle_count();
        if idle >= config.core_size {
            return;
        }

        let headroom = config.max_size.saturating_sub(self.live_count());
        let deficit = (config.core_size - idle).min(headroom);
        if deficit == 0 {
            debug!("Session pool at capacity, skipping replenishment");
            return;
        }

        let mut attempts = 0;
        while attempts < deficit * 2 && self.idle_count() < config.core_size {
            if self.inner.shutdown.is_cancelled() {
                return;
            }
            attempts += 1;
            if let Some(session) = self.create_session().await {
                self.admit(session);
            }
        }

        let idle = self.idle_count();
        if idle < config.core_size {
            warn!(
                "Session replenishment fell short: idle={}, core_size={}, attempts={}",
                idle, config.core_size, attempts
            );
        } else {
            debug!("Session pool replenished to {}", idle);
        }
    }
}
