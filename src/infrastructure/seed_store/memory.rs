// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::seed::{Seed, SeedStatus};
use crate::domain::repositories::seed_store::{SeedStore, StoreError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, warn};

#[derive(Default)]
struct StoreState {
    pending: VecDeque<Seed>,
    seen: HashSet<String>,
    archived: Vec<Seed>,
    succeeded: usize,
    failed: usize,
}

/// 内存种子存储
///
/// FIFO队列，按种子内容去重。重试中的种子回到队尾，终态种子归档。
#[derive(Default)]
pub struct InMemorySeedStore {
    state: Mutex<StoreState>,
    available: Notify,
}

impl InMemorySeedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用初始种子创建存储
    pub fn with_seeds(seeds: Vec<Seed>) -> Self {
        let store = Self::new();
        {
            let mut state = store.state.lock();
            for seed in seeds {
                if state.seen.insert(seed.data.clone()) {
                    state.pending.push_back(seed);
                }
            }
        }
        store
    }

    /// 成功归档的种子数
    pub fn succeeded(&self) -> usize {
        self.state.lock().succeeded
    }

    /// 最终失败的种子数
    pub fn failed(&self) -> usize {
        self.state.lock().failed
    }

    /// 已归档的种子
    pub fn archived(&self) -> Vec<Seed> {
        self.state.lock().archived.clone()
    }

    fn try_pop(&self) -> Option<Seed> {
        self.state.lock().pending.pop_front()
    }
}

#[async_trait]
impl SeedStore for InMemorySeedStore {
    async fn pull(&self, wait: Duration) -> Result<Option<Seed>, StoreError> {
        if let Some(seed) = self.try_pop() {
            return Ok(Some(seed));
        }

        let notified = self.available.notified();
        if let Some(seed) = self.try_pop() {
            return Ok(Some(seed));
        }
        if tokio::time::timeout(wait, notified).await.is_err() {
            return Ok(None);
        }
        Ok(self.try_pop())
    }

    async fn add_new_seeds(&self, seeds: Vec<Seed>) -> Result<usize, StoreError> {
        let added = {
            let mut state = self.state.lock();
            let mut added = 0;
            for seed in seeds {
                if seed.status != SeedStatus::Retrying && !state.seen.insert(seed.data.clone()) {
                    debug!("Ignoring duplicate seed {}", seed.data);
                    continue;
                }
                state.pending.push_back(seed);
                added += 1;
            }
            added
        };

        for _ in 0..added {
            self.available.notify_one();
        }
        Ok(added)
    }

    async fn finish(&self, seed: &Seed) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        match seed.status {
            // Init: the attempt never started
            SeedStatus::Retrying | SeedStatus::Init => {
                state.pending.push_back(seed.clone());
                drop(state);
                self.available.notify_one();
            }
            SeedStatus::Success | SeedStatus::Running => {
                state.succeeded += 1;
                state.archived.push(seed.clone());
            }
            SeedStatus::Fail => {
                warn!("Seed {} archived as failed", seed.data);
                state.failed += 1;
                state.archived.push(seed.clone());
            }
        }
        Ok(())
    }

    async fn len(&self) -> usize {
        self.state.lock().pending.len()
    }
}
