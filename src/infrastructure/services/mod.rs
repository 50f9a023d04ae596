// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 协作者服务实现
///
/// 版本控制、CODEOWNERS 归属解析与子仓库权限检查
pub mod codeowners;
pub mod git_client;
pub mod permission_checker_impl;
