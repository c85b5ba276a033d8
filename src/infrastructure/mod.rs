// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 指标导出模块
pub mod metrics;

/// 结果管道实现
pub mod pipeline;

/// 种子存储实现
pub mod seed_store;
