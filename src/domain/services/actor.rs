// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 后台内部执行者
///
/// 持有该值即表示调用方以绕过用户权限的内部身份访问协作者。
/// 只能通过 [`InternalActor::background`] 构造，调用点因此可见。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InternalActor {
    _private: (),
}

impl InternalActor {
    pub fn background() -> Self {
        Self { _private: () }
    }
}
