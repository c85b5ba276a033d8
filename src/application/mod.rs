// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 爬虫构建器与门面
pub mod crawler;

/// 演示用抓取处理器
pub mod fetch_processor;
