// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// HTTP客户端生成模块
pub mod client;

/// 会话工厂模块
pub mod factory;

/// 代理与IP池模块
pub mod proxy;

/// 会话实体模块
pub mod session;
