// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 爬虫构建器、门面和演示处理器
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置、运行时快照和热加载
pub mod config;

/// 领域模块
///
/// 包含种子实体和协作方契约
pub mod domain;

/// 事件模块
///
/// 生命周期信号的类型化事件总线
pub mod events;

/// 基础设施模块
///
/// 提供种子存储、结果管道和指标导出的参考实现
pub mod infrastructure;

/// 网络模块
///
/// 会话、代理和HTTP客户端生成
pub mod net;

/// 会话池模块
pub mod pool;

/// 队列模块
///
/// 实现任务调度和派发循环
pub mod queue;

/// 工具模块
///
/// 提供错误类型、日志和退出钩子
pub mod utils;

/// 工作器模块
///
/// 实现有界工作池和种子处理
pub mod workers;
