use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// # Summary
/// 单根 K 线数据实体，记录特定时段内的行情波动。
///
/// # Invariants
/// - `time` 带有交易所的 UTC 偏移，保留数据源的时区信息。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    // K 线开始时间 (交易所本地时区)
    pub time: DateTime<FixedOffset>,
    // 开盘价
    pub open: f64,
    // 最高价
    pub high: f64,
    // 最低价
    pub low: f64,
    // 收盘价
    pub close: f64,
    // 调整后收盘价 (用于处理分红、拆股等复权情况)
    pub adj_close: Option<f64>,
    // 成交量
    pub volume: f64,
}

/// # Summary
/// 预测引擎输入的一个观测点 (ds, y)。
///
/// # Invariants
/// - `ds` 不带时区，取交易所本地的挂钟时间。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub ds: NaiveDateTime,
    pub y: f64,
}

/// # Summary
/// 收盘价时间序列，每个交易日一个点。
///
/// # Invariants
/// - 按 `ds` 严格递增，不存在重复时间戳。
/// - 所有 `y` 均为有限值。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// # Summary
    /// 由 K 线列表构建收盘价序列。
    ///
    /// # Logic
    /// 1. 去掉时区，保留交易所本地挂钟时间。
    /// 2. 丢弃非有限收盘价。
    /// 3. 按时间排序，同一时间戳保留最后出现的一根。
    ///
    /// # Arguments
    /// * `candles`: 数据源返回的 K 线。
    ///
    /// # Returns
    /// 返回满足不变量的序列，可能为空。
    pub fn from_candles(candles: &[Candle]) -> Self {
        let points = candles
            .iter()
            .filter(|c| c.close.is_finite())
            .map(|c| PricePoint {
                ds: c.time.naive_local(),
                y: c.close,
            })
            .collect();
        Self::from_points(points)
    }

    /// 由任意顺序的观测点构建序列
    pub fn from_points(mut points: Vec<PricePoint>) -> Self {
        points.retain(|p| p.y.is_finite());
        // 稳定排序后，相同 ds 的最后一条保留下来
        points.sort_by_key(|p| p.ds);
        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.ds == point.ds => *last = point,
                _ => deduped.push(point),
            }
        }
        Self { points: deduped }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }
}
