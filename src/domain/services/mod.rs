// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 结果管道契约
pub mod pipeline;

/// 种子处理器契约
pub mod seed_processor;
