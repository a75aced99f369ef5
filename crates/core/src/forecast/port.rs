use crate::forecast::entity::ForecastSeries;
use crate::forecast::error::ModelError;
use crate::market::entity::PriceSeries;
use chrono::NaiveDateTime;

/// # Summary
/// 已拟合的预测模型。
///
/// # Invariants
/// - 模型只依赖拟合时的历史序列，可以在多个线程间共享。
pub trait FittedModel: Send + Sync {
    /// 历史序列的最后一个时间戳
    fn history_end(&self) -> NaiveDateTime;

    /// # Summary
    /// 生成历史之后的未来日期。
    ///
    /// # Arguments
    /// * `periods`: 向后延伸的天数。
    ///
    /// # Returns
    /// 返回 `history_end + 1 天` 到 `history_end + periods 天` 的日期。
    fn future_dates(&self, periods: usize) -> Vec<NaiveDateTime>;

    /// # Summary
    /// 对全部历史日期与 `periods` 个未来日期给出预测值与不确定区间。
    ///
    /// # Returns
    /// 成功返回 `ForecastSeries`，其 `horizon()` 等于 `periods`。
    fn predict(&self, periods: usize) -> Result<ForecastSeries, ModelError>;
}

/// # Summary
/// 预测引擎接口。拟合是 CPU 密集的同步操作，调用方负责把它放到阻塞线程池。
pub trait ForecastEngine: Send + Sync {
    /// 引擎名称，用于日志
    fn name(&self) -> &str;

    /// # Summary
    /// 在 (ds, y) 序列上拟合模型。
    ///
    /// # Arguments
    /// * `series`: 不带时区的收盘价序列。
    ///
    /// # Returns
    /// 成功返回拟合好的模型，失败返回 `ModelError`。
    fn fit(&self, series: &PriceSeries) -> Result<Box<dyn FittedModel>, ModelError>;
}
