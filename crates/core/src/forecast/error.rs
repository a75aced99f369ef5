use thiserror::Error;

/// # Summary
/// 预测引擎错误枚举，覆盖输入不足与数值求解失败。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    // 输入序列为空
    #[error("Cannot fit a model on an empty series")]
    EmptySeries,
    // 不同时间戳的观测点太少
    #[error("Insufficient history: need at least {required} observations, got {actual}")]
    InsufficientHistory { required: usize, actual: usize },
    // 输入或中间结果出现 NaN / Inf
    #[error("Non-finite value encountered: {0}")]
    NonFinite(String),
    // 线性方程组无法求解
    #[error("Numerical failure: {0}")]
    Numerical(String),
}
