//! 设计矩阵的列构造：截距、斜率、拐点项与傅里叶季节项。

use std::f64::consts::PI;

/// 一个周期性成分
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Seasonality {
    pub name: &'static str,
    pub period_days: f64,
    pub order: usize,
}

pub(crate) const YEARLY: Seasonality = Seasonality {
    name: "yearly",
    period_days: 365.25,
    order: 10,
};

pub(crate) const WEEKLY: Seasonality = Seasonality {
    name: "weekly",
    period_days: 7.0,
    order: 3,
};

/// # Summary
/// 设计矩阵的列布局。
///
/// 列顺序固定为: `[1, t, (t - s_1)+ .. (t - s_c)+, sin/cos(季节 1) .., sin/cos(季节 2) ..]`。
///
/// # Invariants
/// - `changepoints` 在 [0, 1) 内升序。
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Design {
    pub changepoints: Vec<f64>,
    pub seasonalities: Vec<Seasonality>,
}

impl Design {
    pub fn width(&self) -> usize {
        self.trend_width()
            + self
                .seasonalities
                .iter()
                .map(|s| 2 * s.order)
                .sum::<usize>()
    }

    /// 趋势部分的列数 (截距 + 斜率 + 拐点)
    pub fn trend_width(&self) -> usize {
        2 + self.changepoints.len()
    }

    /// # Summary
    /// 填充一行特征。
    ///
    /// # Arguments
    /// * `t`: 缩放到历史区间 [0, 1] 的时间，未来日期大于 1。
    /// * `epoch_days`: 距 1970-01-01 的天数，季节项按绝对日期计算。
    /// * `row`: 长度为 `width()` 的输出缓冲。
    pub fn fill_row(&self, t: f64, epoch_days: f64, row: &mut [f64]) {
        row[0] = 1.0;
        row[1] = t;
        for (j, &s) in self.changepoints.iter().enumerate() {
            row[2 + j] = (t - s).max(0.0);
        }

        let mut col = self.trend_width();
        for season in &self.seasonalities {
            for k in 1..=season.order {
                let angle = 2.0 * PI * k as f64 * epoch_days / season.period_days;
                row[col] = angle.sin();
                row[col + 1] = angle.cos();
                col += 2;
            }
        }
    }
}

/// # Summary
/// 在历史前 80% 的观测点上均匀放置潜在拐点。
///
/// # Logic
/// 1. 候选区间为前 `floor(0.8 n)` 个观测。
/// 2. 拐点数不超过候选区间长度减一。
/// 3. 按 `linspace(0, hist - 1, c + 1)` 取下标并去掉第一个 (即起点本身)。
///
/// # Arguments
/// * `t`: 升序的缩放时间。
/// * `requested`: 期望的拐点数量。
pub(crate) fn changepoint_locations(t: &[f64], requested: usize) -> Vec<f64> {
    let hist = (t.len() as f64 * 0.8).floor() as usize;
    let count = requested.min(hist.saturating_sub(1));
    if count == 0 {
        return Vec::new();
    }

    let mut locations: Vec<f64> = (1..=count)
        .map(|i| {
            let idx = ((hist - 1) as f64 * i as f64 / count as f64).round() as usize;
            t[idx.min(t.len() - 1)]
        })
        .collect();
    locations.dedup();
    locations
}
