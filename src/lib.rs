// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 任务与信号模型、存储接口和外部协作者接口
pub mod domain;

/// 基础设施模块
///
/// 数据库、缓存、git 与指标等外部系统的实现
pub mod infrastructure;

/// 队列模块
///
/// 周期调度器与共享限流器
pub mod queue;

/// 工具模块
///
/// 错误类型、重试策略与日志初始化
pub mod utils;

/// 工作器模块
///
/// 工作池、任务处理器与维护循环
pub mod workers;
