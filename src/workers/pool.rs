// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::crawler_config::ConfigHandle;
use metrics::gauge;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// 有界工作池
///
/// 每个提交的任务运行在独立的tokio任务上。最大并发从配置快照实时读取，
/// 线程数变更后下一次背压检查立即生效。
#[derive(Clone)]
pub struct WorkerPool {
    inner: Arc<WorkerInner>,
}

struct WorkerInner {
    config: ConfigHandle,
    /// 正在执行的任务数
    active: AtomicUsize,
    /// 已提交但尚未结束的任务数
    in_flight: AtomicUsize,
    dispatch: Arc<Notify>,
    tasks: Mutex<JoinSet<()>>,
    closed: AtomicBool,
}

/// 任务执行期间持有，结束时（包括panic展开）递减计数并唤醒调度线程
struct TaskGuard {
    inner: Arc<WorkerInner>,
}

impl TaskGuard {
    fn begin(inner: Arc<WorkerInner>) -> Self {
        let active = inner.active.fetch_add(1, Ordering::AcqRel) + 1;
        gauge!("scheduler_active_tasks").set(active as f64);
        Self { inner }
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        let active = self.inner.active.fetch_sub(1, Ordering::AcqRel) - 1;
        let in_flight = self.inner.in_flight.fetch_sub(1, Ordering::AcqRel) - 1;
        gauge!("scheduler_active_tasks").set(active as f64);

        if in_flight < self.inner.config.current().thread_number {
            self.inner.dispatch.notify_one();
        }
    }
}

impl WorkerPool {
    /// 创建新的工作池
    ///
    /// # 参数
    ///
    /// * `config` - 配置快照句柄，提供最大并发
    /// * `dispatch` - 任务结束时唤醒调度线程的通知器
    pub fn new(config: ConfigHandle, dispatch: Arc<Notify>) -> Self {
        Self {
            inner: Arc::new(WorkerInner {
                config,
                active: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                dispatch,
                tasks: Mutex::new(JoinSet::new()),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// 提交一个任务
    ///
    /// # 返回值
    ///
    /// 工作池已关闭时返回false，任务不会执行
    pub fn submit<F>(&self, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.inner.tasks.lock();
        if self.inner.closed.load(Ordering::Acquire) {
            warn!("Worker pool is shut down, rejecting task");
            return false;
        }

        // Reap finished tasks so the set does not grow unbounded
        while let Some(result) = tasks.try_join_next() {
            log_join_result(result);
        }

        self.inner.in_flight.fetch_add(1, Ordering::AcqRel);
        let inner = self.inner.clone();
        tasks.spawn(async move {
            let _guard = TaskGuard::begin(inner);
            task.await;
        });
        true
    }

    /// 当前最大并发
    pub fn max_concurrency(&self) -> usize {
        self.inner.config.current().thread_number
    }

    /// 正在执行的任务数
    pub fn active_count(&self) -> usize {
        self.inner.active.load(Ordering::Acquire)
    }

    /// 已提交但尚未结束的任务数
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    /// 没有任何未结束的任务
    pub fn is_idle(&self) -> bool {
        self.in_flight() == 0
    }

    pub fn is_shutdown(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// 关闭工作池
    ///
    /// 拒绝新任务，等待已提交的任务全部结束
    pub async fn shutdown(&self) {
        let mut tasks = {
            let mut guard = self.inner.tasks.lock();
            self.inner.closed.store(true, Ordering::Release);
            std::mem::take(&mut *guard)
        };

        let pending = tasks.len();
        if pending > 0 {
            info!("Waiting for {} in-flight tasks to finish", pending);
        }
        while let Some(result) = tasks.join_next().await {
            log_join_result(result);
        }
        debug!("Worker pool shut down");
    }
}

fn log_join_result(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        if e.is_panic() {
            error!("Worker task panicked: {}", e);
        } else {
            debug!("Worker task cancelled: {}", e);
        }
    }
}
