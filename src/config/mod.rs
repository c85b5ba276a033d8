// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 运行时配置快照模块
pub mod crawler_config;

/// 配置模块
///
/// 处理应用程序的配置设置，包括调度器、会话池、代理等配置
pub mod settings;

/// 配置文件热加载模块
pub mod watcher;
