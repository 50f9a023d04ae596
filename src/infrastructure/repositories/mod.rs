// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库实现模块
///
/// 基于SeaORM的任务队列、信号配置、信号结果与事件日志数据访问
pub mod event_log_repo_impl;
pub mod job_repo_impl;
pub mod result_store_impl;
pub mod signal_config_repo_impl;
