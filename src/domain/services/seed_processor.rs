// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::crawl_result::CrawlResult;
use crate::domain::models::seed::Seed;
use crate::net::session::Session;
use async_trait::async_trait;

/// 种子处理器特质
///
/// 承载业务逻辑：使用借出的会话处理一个种子，把条目和派生种子写入结果。
///
/// 返回错误时，如果处理器没有主动做出重试决定（重试计数未变且状态仍为Running），
/// 调度器会强制重试该种子。处理器若要自行决定，应调用`Seed::retry`或`Seed::fail`。
#[async_trait]
pub trait SeedProcessor: Send + Sync {
    async fn process(
        &self,
        seed: &mut Seed,
        session: &mut Session,
        result: &mut CrawlResult,
    ) -> anyhow::Result<()>;
}
