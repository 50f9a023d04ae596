// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层
///
/// 模型、仓库接口与外部协作者接口
pub mod models;
pub mod repositories;
pub mod services;
