// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::seed_store::StoreError;
use thiserror::Error;

/// 爬虫生命周期错误类型
#[derive(Error, Debug)]
pub enum CrawlError {
    /// 非法状态，例如重复启动
    #[error("非法状态: {0}")]
    IllegalState(String),

    #[error("会话池错误: {0}")]
    Pool(#[from] PoolError),

    #[error("种子存储错误: {0}")]
    Store(#[from] StoreError),

    #[error("网络组件错误: {0}")]
    Net(#[from] NetError),

    #[error("配置错误: {0}")]
    Config(#[from] config::ConfigError),

    #[error("配置校验失败: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// 构建爬虫时缺少必要组件
    #[error("缺少组件: {0}")]
    MissingComponent(&'static str),
}

/// 会话池错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// 池大小配置不合法
    #[error("无效的会话池配置: {0}")]
    InvalidConfig(String),

    /// 无法创建足够的初始会话
    #[error("会话池初始化失败: {0}")]
    InitFailed(String),
}

/// 网络组件错误类型
///
/// 会话创建链路（代理选择、HTTP客户端构建）上的失败
#[derive(Error, Debug)]
pub enum NetError {
    #[error("HTTP客户端构建失败: {0}")]
    Client(#[from] reqwest::Error),

    #[error("无效代理: {0}")]
    InvalidProxy(String),

    #[error("没有可用代理")]
    NoProxyAvailable,

    #[error("会话创建被拒绝: {0}")]
    Rejected(String),
}
