// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::seed::Seed;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// 种子存储错误类型
#[derive(Error, Debug)]
pub enum StoreError {
    /// 存储后端错误
    #[error("Store backend error: {0}")]
    Backend(String),

    /// 存储已关闭
    #[error("Store closed")]
    Closed,
}

/// 种子存储特质
///
/// 持久化的种子队列。FIFO或优先级语义由实现决定，
/// 调度器按存储给出的顺序派发。
#[async_trait]
pub trait SeedStore: Send + Sync {
    /// 初始化存储
    async fn init(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// 拉取一个种子，最多等待`wait`
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(Seed))` - 拉取到的种子
    /// * `Ok(None)` - 等待期内没有可用种子
    /// * `Err(StoreError)` - 拉取失败
    async fn pull(&self, wait: Duration) -> Result<Option<Seed>, StoreError>;

    /// 批量加入新种子
    ///
    /// # 返回值
    ///
    /// 实际入队的种子数量（实现可以丢弃重复种子）
    async fn add_new_seeds(&self, seeds: Vec<Seed>) -> Result<usize, StoreError>;

    /// 上报一次处理尝试的结果
    ///
    /// 实现据此重新入队Retrying的种子或归档终态种子
    async fn finish(&self, seed: &Seed) -> Result<(), StoreError>;

    /// 待处理种子数量
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
