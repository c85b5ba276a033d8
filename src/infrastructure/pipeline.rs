// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::seed::Seed;
use crate::domain::services::pipeline::Pipeline;
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::info;

/// 控制台管道，把条目写入日志
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsolePipeline;

#[async_trait]
impl Pipeline for ConsolePipeline {
    async fn save_item(&self, items: &[String], origin: &Seed) -> anyhow::Result<()> {
        for item in items {
            info!(seed = %origin.data, "{}", item);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}

/// 内存收集管道
#[derive(Debug, Default)]
pub struct CollectingPipeline {
    items: Mutex<Vec<(String, String)>>,
}

impl CollectingPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// 收集到的 (种子内容, 条目)
    pub fn items(&self) -> Vec<(String, String)> {
        self.items.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

#[async_trait]
impl Pipeline for CollectingPipeline {
    async fn save_item(&self, items: &[String], origin: &Seed) -> anyhow::Result<()> {
        let mut collected = self.items.lock();
        collected.extend(items.iter().map(|item| (origin.data.clone(), item.clone())));
        Ok(())
    }

    fn name(&self) -> &str {
        "collecting"
    }
}
