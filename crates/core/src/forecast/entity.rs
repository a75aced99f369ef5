use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// # Summary
/// 单个日期上的预测结果。
///
/// # Invariants
/// - `yhat_lower <= yhat <= yhat_upper`。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub ds: NaiveDateTime,
    // 预测均值
    pub yhat: f64,
    // 不确定区间下界
    pub yhat_lower: f64,
    // 不确定区间上界
    pub yhat_upper: f64,
}

/// # Summary
/// 预测序列：先覆盖全部历史日期，再向后延伸 `horizon` 个日期。
///
/// # Invariants
/// - `points` 按 `ds` 严格递增。
/// - `points.len() == history_len + horizon`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    points: Vec<ForecastPoint>,
    history_len: usize,
}

impl ForecastSeries {
    pub fn new(points: Vec<ForecastPoint>, history_len: usize) -> Self {
        let history_len = history_len.min(points.len());
        Self {
            points,
            history_len,
        }
    }

    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    /// 对历史日期的拟合值
    pub fn history(&self) -> &[ForecastPoint] {
        &self.points[..self.history_len]
    }

    /// 历史之后的纯预测部分
    pub fn future(&self) -> &[ForecastPoint] {
        &self.points[self.history_len..]
    }

    pub fn horizon(&self) -> usize {
        self.points.len() - self.history_len
    }

    /// # Summary
    /// 截取时间戳不早于 `now` 的后缀。
    ///
    /// # Arguments
    /// * `now`: 截断时刻 (naive，与序列同一挂钟)。
    ///
    /// # Returns
    /// 返回满足 `ds >= now` 的连续后缀，可能为空。
    pub fn since(&self, now: NaiveDateTime) -> &[ForecastPoint] {
        let start = self.points.partition_point(|p| p.ds < now);
        &self.points[start..]
    }
}
