// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 数据库实体模块
///
/// 定义数据库表对应的实体结构
pub mod commit_signal;
pub mod event_log;
pub mod event_log_bookmark;
pub mod recent_view_signal;
pub mod repo;
pub mod repo_file_stats;
pub mod signal_configuration;
pub mod signal_job;
pub mod signal_job_config_aware;
