// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 外部协作者接口
///
/// 任务处理器依赖的版本控制、归属解析、权限检查与事件日志
pub mod actor;
pub mod event_log;
pub mod ownership;
pub mod permissions;
pub mod version_control;

pub use actor::InternalActor;
