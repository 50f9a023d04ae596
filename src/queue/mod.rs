// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 队列模块
///
/// 按任务类型的周期调度器与共享令牌桶限流器
pub mod rate_limiter;
pub mod scheduler;
