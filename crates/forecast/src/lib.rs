//! # `blackgem-forecast` - 预测引擎
//!
//! 进程内的加法时间序列模型：分段线性趋势 + 傅里叶季节项，岭回归求解。
//! 对外只暴露 `AdditiveEngine`，通过 `blackgem_core::forecast::port::ForecastEngine` 使用。

// 数值代码中 usize/i64 与 f64 的互转不可避免
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap
)]

pub mod additive;
mod features;
mod linalg;

pub use additive::{AdditiveEngine, EngineSettings};
