use crate::chart::build_chart;
use blackgem_core::common::time::TimeProvider;
use blackgem_core::common::{Stock, TimeFrame};
use blackgem_core::config::{AppConfig, ThemeConfig};
use blackgem_core::forecast::error::ModelError;
use blackgem_core::forecast::port::ForecastEngine;
use blackgem_core::market::entity::PriceSeries;
use blackgem_core::market::error::MarketError;
use blackgem_core::market::port::MarketDataProvider;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// # Summary
/// 预测流程的统一错误类型，每个变体对应页面上一种明确的错误状态。
#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("Invalid symbol: {0:?}")]
    InvalidSymbol(String),
    #[error("No price history for {0}")]
    NoData(String),
    #[error("Market data request for {symbol} timed out after {secs}s")]
    Timeout { symbol: String, secs: u64 },
    #[error("Market data provider error: {0}")]
    Upstream(#[source] MarketError),
    #[error("Forecast model error: {0}")]
    Model(#[from] ModelError),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// # Summary
/// 用户是否已经提交过代码。
///
/// # Invariants
/// - `Initial` 代表首屏渲染，始终使用默认代码。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Initial,
    Submitted(String),
}

impl Submission {
    /// # Summary
    /// 兼容页面按钮的点击计数：0 次视为首屏，否则视为已提交。
    pub fn from_clicks(n_clicks: u64, symbol: impl Into<String>) -> Self {
        if n_clicks == 0 {
            Submission::Initial
        } else {
            Submission::Submitted(symbol.into())
        }
    }
}

/// # Summary
/// 一次预测请求的结果。
#[derive(Debug, Clone)]
pub struct ForecastOutcome {
    // 实际使用的证券代码
    pub symbol: String,
    // Plotly figure JSON: `{data, layout, config}`
    pub figure: serde_json::Value,
    pub history_points: usize,
    // 截断后展示的预测点数量
    pub forecast_points: usize,
    pub horizon_days: usize,
    // 模型预测的最后一天 (历史最后一天 + horizon)
    pub forecast_end: Option<NaiveDateTime>,
    pub generated_at: DateTime<Utc>,
}

/// 管理器在构建时从 `AppConfig` 中截取的配置
#[derive(Debug, Clone)]
struct ManagerSettings {
    default_symbol: String,
    history_start: NaiveDate,
    horizon_days: usize,
    fetch_timeout: Duration,
    theme: ThemeConfig,
}

/// # Summary
/// 预测处理器：一次按钮点击对应一次 `handle` 调用。
/// 编译期只依赖 `blackgem-core` 中的 Trait，行情源、预测引擎与时钟均由构造函数注入。
///
/// # Invariants
/// - 不持有任何跨请求的可变状态。
pub struct ForecastManager {
    // 行情数据源
    provider: Arc<dyn MarketDataProvider>,
    // 预测引擎
    engine: Arc<dyn ForecastEngine>,
    // 时钟，用于确定历史区间终点与预测截断点
    clock: Arc<dyn TimeProvider>,
    settings: ManagerSettings,
}

impl ForecastManager {
    /// # Summary
    /// 创建 ForecastManager 实例。
    ///
    /// # Arguments
    /// * `provider` - 行情数据源的具体实现。
    /// * `engine` - 预测引擎的具体实现。
    /// * `clock` - 时钟。
    /// * `config` - 全局配置，读取 forecast / market / theme 三部分。
    ///
    /// # Returns
    /// * `Arc<Self>` - 可共享的管理器实例。
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        engine: Arc<dyn ForecastEngine>,
        clock: Arc<dyn TimeProvider>,
        config: &AppConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            provider,
            engine,
            clock,
            settings: ManagerSettings {
                default_symbol: config.forecast.default_symbol.clone(),
                history_start: config.market.history_start,
                horizon_days: config.forecast.horizon_days,
                fetch_timeout: Duration::from_secs(config.market.timeout_secs),
                theme: config.theme.clone(),
            },
        })
    }

    pub fn default_symbol(&self) -> &str {
        &self.settings.default_symbol
    }

    pub fn horizon_days(&self) -> usize {
        self.settings.horizon_days
    }

    /// # Summary
    /// 解析本次请求实际使用的证券代码。
    ///
    /// # Logic
    /// 1. 首屏直接返回默认代码，忽略输入框内容。
    /// 2. 已提交时拒绝空串与纯空白，其余原样返回 (不做 trim / 大小写转换)。
    pub fn resolve_symbol(&self, submission: &Submission) -> Result<String, ForecastError> {
        match submission {
            Submission::Initial => Ok(self.settings.default_symbol.clone()),
            Submission::Submitted(text) if text.trim().is_empty() => {
                Err(ForecastError::InvalidSymbol(text.clone()))
            }
            Submission::Submitted(text) => Ok(text.clone()),
        }
    }

    /// # Summary
    /// 拉取历史行情，带超时保护。
    ///
    /// # Logic
    /// 1. 区间为 `[history_start 00:00 UTC, now]`，日线周期。
    /// 2. 超时、未找到与其他数据源错误分别映射为不同的 ForecastError。
    async fn fetch_history(
        &self,
        symbol: &str,
        now: DateTime<Utc>,
    ) -> Result<PriceSeries, ForecastError> {
        let start = self
            .settings
            .history_start
            .and_hms_opt(0, 0, 0)
            .map(|naive| naive.and_utc())
            .ok_or_else(|| ForecastError::Internal("invalid history start".to_string()))?;

        let stock = Stock::new(symbol);
        let secs = self.settings.fetch_timeout.as_secs();
        let fetched = tokio::time::timeout(
            self.settings.fetch_timeout,
            self.provider
                .fetch_candles(&stock, TimeFrame::Day1, start, now),
        )
        .await
        .map_err(|_| ForecastError::Timeout {
            symbol: symbol.to_string(),
            secs,
        })?;

        let candles = match fetched {
            Ok(candles) => candles,
            Err(MarketError::NotFound) => return Err(ForecastError::NoData(symbol.to_string())),
            Err(MarketError::Timeout(secs)) => {
                return Err(ForecastError::Timeout {
                    symbol: symbol.to_string(),
                    secs,
                });
            }
            Err(e) => return Err(ForecastError::Upstream(e)),
        };

        let series = PriceSeries::from_candles(&candles);
        if series.is_empty() {
            return Err(ForecastError::NoData(symbol.to_string()));
        }
        Ok(series)
    }

    /// # Summary
    /// 处理一次预测请求。
    ///
    /// # Logic
    /// 1. 解析证券代码。
    /// 2. 拉取历史收盘价，去掉时区得到 (ds, y) 序列。
    /// 3. 在阻塞线程池中拟合模型并预测 `horizon_days` 天。
    /// 4. 只保留时间不早于当前时刻的预测点。
    /// 5. 组装四条折线的图表。
    ///
    /// # Arguments
    /// * `submission` - 首屏或用户提交的代码。
    ///
    /// # Returns
    /// 成功返回 `ForecastOutcome`，任一步失败返回对应的 `ForecastError`，不产生部分结果。
    pub async fn handle(&self, submission: Submission) -> Result<ForecastOutcome, ForecastError> {
        let symbol = self.resolve_symbol(&submission)?;
        let now = self.clock.now();
        let started = Instant::now();
        info!(%symbol, initial = submission == Submission::Initial, "Forecast requested");

        let series = self.fetch_history(&symbol, now).await.inspect_err(|e| {
            warn!(%symbol, error = %e, "Fetching price history failed");
        })?;
        debug!(%symbol, points = series.len(), elapsed_ms = started.elapsed().as_millis(), "History fetched");

        let engine = Arc::clone(&self.engine);
        let horizon = self.settings.horizon_days;
        let (series, forecast) = tokio::task::spawn_blocking(move || {
            let model = engine.fit(&series)?;
            let forecast = model.predict(horizon)?;
            Ok::<_, ModelError>((series, forecast))
        })
        .await
        .map_err(|e| ForecastError::Internal(format!("forecast task failed: {}", e)))?
        .inspect_err(|e| warn!(%symbol, error = %e, "Model fit failed"))?;

        let visible = forecast.since(now.naive_utc());
        let plot = build_chart(&symbol, &series, visible, &self.settings.theme);
        let figure: serde_json::Value = serde_json::from_str(&plot.to_json())
            .map_err(|e| ForecastError::Internal(format!("chart serialization failed: {}", e)))?;

        info!(
            %symbol,
            history = series.len(),
            forecast = visible.len(),
            elapsed_ms = started.elapsed().as_millis(),
            engine = self.engine.name(),
            "Forecast ready"
        );

        Ok(ForecastOutcome {
            symbol,
            figure,
            history_points: series.len(),
            forecast_points: visible.len(),
            horizon_days: forecast.horizon(),
            forecast_end: forecast.points().last().map(|p| p.ds),
            generated_at: now,
        })
    }
}
