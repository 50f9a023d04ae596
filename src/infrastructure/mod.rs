// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 领域层抽象接口的具体实现，负责与数据库、缓存、git 等外部系统交互。
///
/// 包含的子模块：
/// - 缓存（cache）：Redis 与内存键值缓存
/// - 数据库（database）：连接池与实体映射
/// - 可观测性（observability）：指标注册与导出
/// - 仓库实现（repositories）：任务队列、信号配置、结果与事件日志存储
/// - 服务（services）：版本控制、归属解析与权限检查
pub mod cache;
pub mod database;
pub mod observability;
pub mod repositories;
pub mod services;
