// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 后台工作器模块
///
/// 工作池、处理器、卡住任务回收、过期任务清理与限流配置热加载
pub mod handlers;
pub mod janitor;
pub mod manager;
pub mod pool;
pub mod reloader;
pub mod resetter;
pub mod signal_worker;
pub mod worker;
