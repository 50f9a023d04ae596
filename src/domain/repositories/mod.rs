// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口
///
/// 任务队列、信号配置与信号结果的数据访问接口
pub mod job_repository;
pub mod result_store;
pub mod signal_config_repository;
