// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::seed::Seed;
use async_trait::async_trait;

/// 结果输出管道特质
///
/// 每批非空结果按注册顺序依次交给所有管道
#[async_trait]
pub trait Pipeline: Send + Sync {
    /// 保存一批条目
    ///
    /// # 参数
    ///
    /// * `items` - 抽取出的条目
    /// * `origin` - 产生这些条目的种子
    async fn save_item(&self, items: &[String], origin: &Seed) -> anyhow::Result<()>;

    /// 管道名称
    fn name(&self) -> &str;
}
