//! # `blackgem-core` - 领域核心
//!
//! 只包含实体、错误枚举与端口 (Trait) 定义，不依赖任何具体实现。
//! 上层 crate (feed / forecast / manager / api) 通过这里的 Trait 互相解耦。

pub mod common;
pub mod config;

pub mod market {
    pub mod entity;
    pub mod error;
    pub mod port;
}

pub mod forecast {
    pub mod entity;
    pub mod error;
    pub mod port;
}

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
