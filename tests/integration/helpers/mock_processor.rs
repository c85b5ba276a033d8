// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::bail;
use async_trait::async_trait;
use parking_lot::Mutex;
use seedcrawl::domain::models::crawl_result::CrawlResult;
use seedcrawl::domain::models::seed::Seed;
use seedcrawl::domain::services::pipeline::Pipeline;
use seedcrawl::domain::services::seed_processor::SeedProcessor;
use seedcrawl::net::session::Session;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// 记录并发度和开始时间的处理器
#[derive(Default)]
pub struct RecordingProcessor {
    delay: Duration,
    current: AtomicUsize,
    peak: AtomicUsize,
    processed: AtomicUsize,
    starts: Mutex<Vec<Instant>>,
    sessions: Mutex<Vec<uuid::Uuid>>,
    /// 每个初始种子派生的子种子数
    fan_out: usize,
}

impl RecordingProcessor {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn with_fan_out(mut self, fan_out: usize) -> Self {
        self.fan_out = fan_out;
        self
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::SeqCst)
    }

    pub fn starts(&self) -> Vec<Instant> {
        self.starts.lock().clone()
    }

    pub fn sessions(&self) -> Vec<uuid::Uuid> {
        self.sessions.lock().clone()
    }
}

#[async_trait]
impl SeedProcessor for RecordingProcessor {
    async fn process(
        &self,
        seed: &mut Seed,
        session: &mut Session,
        result: &mut CrawlResult,
    ) -> anyhow::Result<()> {
        self.starts.lock().push(Instant::now());
        self.sessions.lock().push(session.id());
        let current = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(current, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;

        result.add_item(format!("item:{}", seed.data));
        if seed.depth == 0 {
            for i in 0..self.fan_out {
                result.add_seed(seed.derive(format!("{}/child{}", seed.data, i)));
            }
        }

        self.current.fetch_sub(1, Ordering::SeqCst);
        self.processed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// 总是返回错误的处理器
#[derive(Default)]
pub struct FailingProcessor {
    attempts: Mutex<HashMap<String, usize>>,
}

impl FailingProcessor {
    pub fn attempts(&self, data: &str) -> usize {
        self.attempts.lock().get(data).copied().unwrap_or(0)
    }
}

#[async_trait]
impl SeedProcessor for FailingProcessor {
    async fn process(
        &self,
        seed: &mut Seed,
        _session: &mut Session,
        _result: &mut CrawlResult,
    ) -> anyhow::Result<()> {
        *self.attempts.lock().entry(seed.data.clone()).or_default() += 1;
        bail!("always failing on {}", seed.data)
    }
}

/// 第一次处理时panic，之后成功
#[derive(Default)]
pub struct PanicOnceProcessor {
    calls: AtomicUsize,
}

impl PanicOnceProcessor {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SeedProcessor for PanicOnceProcessor {
    async fn process(
        &self,
        seed: &mut Seed,
        _session: &mut Session,
        result: &mut CrawlResult,
    ) -> anyhow::Result<()> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("processor blew up on {}", seed.data);
        }
        result.add_item("recovered");
        Ok(())
    }
}

/// 共享调用日志：(来源种子, 管道名)
pub type PipelineLog = Arc<Mutex<Vec<(String, String)>>>;

/// 把调用顺序写入共享日志的管道
pub struct OrderedPipeline {
    name: String,
    log: PipelineLog,
}

impl OrderedPipeline {
    pub fn new(name: &str, log: PipelineLog) -> Self {
        Self {
            name: name.to_string(),
            log,
        }
    }
}

#[async_trait]
impl Pipeline for OrderedPipeline {
    async fn save_item(&self, _items: &[String], origin: &Seed) -> anyhow::Result<()> {
        self.log.lock().push((origin.data.clone(), self.name.clone()));
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
