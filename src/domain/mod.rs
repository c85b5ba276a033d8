// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含爬虫的核心实体和协作方契约，包括：
/// - 领域模型（models）：种子和抓取结果
/// - 仓库接口（repositories）：种子存储抽象接口
/// - 服务（services）：种子处理器和结果管道
///
/// 领域层不依赖于任何外部实现。
pub mod models;
pub mod repositories;
pub mod services;
