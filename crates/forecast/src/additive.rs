use crate::features::{Design, Seasonality, WEEKLY, YEARLY, changepoint_locations};
use crate::linalg::ridge_solve;
use blackgem_core::config::ForecastConfig;
use blackgem_core::forecast::entity::{ForecastPoint, ForecastSeries};
use blackgem_core::forecast::error::ModelError;
use blackgem_core::forecast::port::{FittedModel, ForecastEngine};
use blackgem_core::market::entity::PriceSeries;
use chrono::{Duration, NaiveDateTime};
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::debug;

const SECONDS_PER_DAY: f64 = 86_400.0;
// 所有列共享的最小惩罚，保证法方程正定
const RIDGE_FLOOR: f64 = 1e-8;

/// # Summary
/// 加法模型的超参数。
///
/// # Invariants
/// - `0 < interval_width < 1`。
/// - 两个 prior scale 均为正数。
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    // 不确定区间覆盖率
    pub interval_width: f64,
    // 潜在拐点数量
    pub changepoints: usize,
    // 拐点斜率变化的先验尺度，越小趋势越平滑
    pub changepoint_prior_scale: f64,
    // 季节项系数的先验尺度
    pub seasonality_prior_scale: f64,
    // None 表示按历史跨度自动判断
    pub yearly_seasonality: Option<bool>,
    pub weekly_seasonality: Option<bool>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            interval_width: 0.8,
            changepoints: 25,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            yearly_seasonality: None,
            weekly_seasonality: None,
        }
    }
}

impl From<&ForecastConfig> for EngineSettings {
    fn from(config: &ForecastConfig) -> Self {
        Self {
            interval_width: config.interval_width,
            changepoints: config.changepoints,
            yearly_seasonality: config.yearly_seasonality,
            weekly_seasonality: config.weekly_seasonality,
            ..Self::default()
        }
    }
}

/// # Summary
/// 分段线性趋势 + 年/周季节项的加法预测引擎。
///
/// # Invariants
/// - 引擎本身无状态，每次 `fit` 都产生独立的模型。
#[derive(Debug, Clone, Default)]
pub struct AdditiveEngine {
    settings: EngineSettings,
}

impl AdditiveEngine {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    /// 根据历史跨度决定启用哪些季节项
    fn seasonalities(&self, span_days: f64, min_spacing_days: f64) -> Vec<Seasonality> {
        let mut seasons = Vec::new();
        if self
            .settings
            .yearly_seasonality
            .unwrap_or(span_days >= 730.0)
        {
            seasons.push(YEARLY);
        }
        if self
            .settings
            .weekly_seasonality
            .unwrap_or(span_days >= 14.0 && min_spacing_days < 7.0)
        {
            seasons.push(WEEKLY);
        }
        seasons
    }

    fn validate(&self) -> Result<(), ModelError> {
        let s = &self.settings;
        if !(s.interval_width > 0.0 && s.interval_width < 1.0) {
            return Err(ModelError::Numerical(format!(
                "interval_width must be in (0, 1), got {}",
                s.interval_width
            )));
        }
        if !(s.changepoint_prior_scale > 0.0 && s.seasonality_prior_scale > 0.0) {
            return Err(ModelError::Numerical(
                "prior scales must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn epoch_days(ds: NaiveDateTime) -> f64 {
    ds.and_utc().timestamp() as f64 / SECONDS_PER_DAY
}

/// 一阶差分的标准差 / sqrt(2)，作为观测噪声的粗略估计
fn noise_proxy(y: &[f64]) -> f64 {
    if y.len() < 3 {
        return 0.0;
    }
    let diffs: Vec<f64> = y.windows(2).map(|w| w[1] - w[0]).collect();
    let mean = diffs.iter().sum::<f64>() / diffs.len() as f64;
    let var = diffs.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / (diffs.len() - 1) as f64;
    (var / 2.0).sqrt()
}

impl ForecastEngine for AdditiveEngine {
    fn name(&self) -> &str {
        "additive"
    }

    /// # Summary
    /// 在收盘价序列上拟合加法模型。
    ///
    /// # Logic
    /// 1. 校验输入：非空、至少两个不同时间戳、全部为有限值。
    /// 2. y 按最大绝对值缩放，t 缩放到 [0, 1]。
    /// 3. 放置拐点并按历史跨度选择季节项，构造设计矩阵。
    /// 4. 以噪声估计 / 先验尺度作为各列惩罚，岭回归求解系数。
    /// 5. 由残差估计观测噪声，由拐点幅度估计未来趋势的不确定性。
    fn fit(&self, series: &PriceSeries) -> Result<Box<dyn FittedModel>, ModelError> {
        self.validate()?;

        let points = series.points();
        let (first, last) = match (points.first(), points.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Err(ModelError::EmptySeries),
        };
        if points.len() < 2 {
            return Err(ModelError::InsufficientHistory {
                required: 2,
                actual: points.len(),
            });
        }
        if let Some(bad) = points.iter().find(|p| !p.y.is_finite()) {
            return Err(ModelError::NonFinite(format!("y at {}", bad.ds)));
        }

        let n = points.len();
        let t0 = first.ds;
        let span_secs = (last.ds - first.ds).num_seconds() as f64;
        if span_secs <= 0.0 {
            return Err(ModelError::InsufficientHistory {
                required: 2,
                actual: 1,
            });
        }
        let span_days = span_secs / SECONDS_PER_DAY;
        let min_spacing_days = points
            .windows(2)
            .map(|w| (w[1].ds - w[0].ds).num_seconds() as f64 / SECONDS_PER_DAY)
            .fold(f64::INFINITY, f64::min);

        let y_scale = points
            .iter()
            .map(|p| p.y.abs())
            .fold(0.0_f64, f64::max);
        let y_scale = if y_scale > 0.0 { y_scale } else { 1.0 };
        let ys: Vec<f64> = points.iter().map(|p| p.y / y_scale).collect();
        let ts: Vec<f64> = points
            .iter()
            .map(|p| (p.ds - t0).num_seconds() as f64 / span_secs)
            .collect();

        let design = Design {
            changepoints: changepoint_locations(&ts, self.settings.changepoints),
            seasonalities: self.seasonalities(span_days, min_spacing_days),
        };
        let width = design.width();

        let mut x = vec![0.0; n * width];
        for (i, (point, &t)) in points.iter().zip(&ts).enumerate() {
            design.fill_row(t, epoch_days(point.ds), &mut x[i * width..(i + 1) * width]);
        }

        // 高斯先验下的 MAP: 惩罚 = sigma^2 / prior^2
        let sigma0 = noise_proxy(&ys).max(1e-4);
        let cp_penalty = (sigma0 / self.settings.changepoint_prior_scale).powi(2);
        let season_penalty = (sigma0 / self.settings.seasonality_prior_scale).powi(2);
        let ridge = RIDGE_FLOOR * n as f64;
        let penalty: Vec<f64> = (0..width)
            .map(|col| {
                if col < 2 {
                    ridge
                } else if col < design.trend_width() {
                    cp_penalty + ridge
                } else {
                    season_penalty + ridge
                }
            })
            .collect();

        let beta = ridge_solve(&x, &ys, width, &penalty)?;
        if beta.iter().any(|b| !b.is_finite()) {
            return Err(ModelError::NonFinite("fitted coefficients".to_string()));
        }

        let sse: f64 = x
            .chunks_exact(width)
            .zip(&ys)
            .map(|(row, &y)| {
                let fitted: f64 = row.iter().zip(&beta).map(|(a, b)| a * b).sum();
                (y - fitted).powi(2)
            })
            .sum();
        let sigma_obs = (sse / n as f64).sqrt();

        // 未来拐点: 泊松到达、Laplace 幅度，斜率为随机游走，其积分的方差为 v * dt^3 / 3
        let deltas = &beta[2..design.trend_width()];
        let trend_var_rate = if deltas.is_empty() {
            0.0
        } else {
            let mean_abs = deltas.iter().map(|d| d.abs()).sum::<f64>() / deltas.len() as f64;
            deltas.len() as f64 * 2.0 * mean_abs * mean_abs
        };

        let normal = Normal::new(0.0, 1.0).map_err(|e| ModelError::Numerical(e.to_string()))?;
        let z = normal.inverse_cdf(0.5 + self.settings.interval_width / 2.0);

        debug!(
            observations = n,
            changepoints = design.changepoints.len(),
            seasonalities = ?design.seasonalities.iter().map(|s| s.name).collect::<Vec<_>>(),
            sigma_obs,
            "Additive model fitted"
        );

        Ok(Box::new(AdditiveModel {
            history: points.iter().map(|p| p.ds).collect(),
            t0,
            span_secs,
            y_scale,
            design,
            beta,
            sigma_obs,
            trend_var_rate,
            z,
        }))
    }
}

/// # Summary
/// 已拟合的加法模型。所有内部量都在缩放空间中。
struct AdditiveModel {
    history: Vec<NaiveDateTime>,
    t0: NaiveDateTime,
    span_secs: f64,
    y_scale: f64,
    design: Design,
    beta: Vec<f64>,
    sigma_obs: f64,
    trend_var_rate: f64,
    // 标准正态分位数
    z: f64,
}

impl AdditiveModel {
    /// 在任意日期上求 (yhat, sigma)，均为缩放空间的值
    fn evaluate(&self, ds: NaiveDateTime, row: &mut [f64]) -> (f64, f64) {
        let t = (ds - self.t0).num_seconds() as f64 / self.span_secs;
        self.design.fill_row(t, epoch_days(ds), row);
        let yhat: f64 = row.iter().zip(&self.beta).map(|(a, b)| a * b).sum();

        let ahead = (t - 1.0).max(0.0);
        let trend_var = self.trend_var_rate * ahead.powi(3) / 3.0;
        let sigma = (self.sigma_obs.powi(2) + trend_var).sqrt();
        (yhat, sigma)
    }
}

impl FittedModel for AdditiveModel {
    fn history_end(&self) -> NaiveDateTime {
        // 构造时保证非空
        self.history.last().copied().unwrap_or(self.t0)
    }

    fn future_dates(&self, periods: usize) -> Vec<NaiveDateTime> {
        let end = self.history_end();
        (1..=periods as i64)
            .map(|i| end + Duration::days(i))
            .collect()
    }

    /// # Summary
    /// 对历史日期与未来日期给出预测。
    ///
    /// # Logic
    /// 1. 拼接历史日期与 `periods` 个未来日期。
    /// 2. 逐日计算 yhat 与 sigma，区间为 `yhat ± z * sigma`。
    /// 3. 还原到原始价格尺度。
    fn predict(&self, periods: usize) -> Result<ForecastSeries, ModelError> {
        let mut row = vec![0.0; self.design.width()];
        let dates = self
            .history
            .iter()
            .copied()
            .chain(self.future_dates(periods));

        let mut points = Vec::with_capacity(self.history.len() + periods);
        for ds in dates {
            let (yhat, sigma) = self.evaluate(ds, &mut row);
            let half = self.z * sigma;
            let point = ForecastPoint {
                ds,
                yhat: yhat * self.y_scale,
                yhat_lower: (yhat - half) * self.y_scale,
                yhat_upper: (yhat + half) * self.y_scale,
            };
            if !(point.yhat.is_finite() && point.yhat_lower.is_finite() && point.yhat_upper.is_finite()) {
                return Err(ModelError::NonFinite(format!("prediction at {}", ds)));
            }
            points.push(point);
        }

        Ok(ForecastSeries::new(points, self.history.len()))
    }
}
