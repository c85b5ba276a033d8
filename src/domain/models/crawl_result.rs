// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::seed::Seed;

/// 抓取结果
///
/// 一次处理尝试的输出：抽取出的条目和新发现的种子。
/// 处理结束后所有权立即转交调度器，处理器不得保留。
#[derive(Debug, Default, Clone)]
pub struct CrawlResult {
    items: Vec<String>,
    seeds: Vec<Seed>,
}

impl CrawlResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加一个抽取条目
    pub fn add_item(&mut self, item: impl Into<String>) {
        self.items.push(item.into());
    }

    /// 批量添加抽取条目
    pub fn add_items<I, S>(&mut self, items: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items.extend(items.into_iter().map(Into::into));
    }

    /// 添加一个派生种子
    pub fn add_seed(&mut self, seed: Seed) {
        self.seeds.push(seed);
    }

    /// 以URL添加一个派生种子
    pub fn add_seed_url(&mut self, url: impl Into<String>) {
        self.seeds.push(Seed::new(url));
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn seeds(&self) -> &[Seed] {
        &self.seeds
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.seeds.is_empty()
    }

    /// 拆分为条目和派生种子
    pub fn into_parts(self) -> (Vec<String>, Vec<Seed>) {
        (self.items, self.seeds)
    }
}
