// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 有界工作池模块
pub mod pool;

/// 种子处理工作者模块
pub mod seed_worker;
