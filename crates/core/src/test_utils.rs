//! 测试辅助：可编程的行情提供者与 K 线生成器。

use crate::common::{Stock, TimeFrame};
use crate::market::entity::Candle;
use crate::market::error::MarketError;
use crate::market::port::MarketDataProvider;
use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, TimeZone, Utc};
use std::sync::Mutex;

/// 一次 `fetch_candles` 调用的记录
#[derive(Debug, Clone, PartialEq)]
pub struct FetchCall {
    pub symbol: String,
    pub timeframe: TimeFrame,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// 预设响应
pub enum Scripted {
    Candles(Vec<Candle>),
    Fail(fn() -> MarketError),
    // 永不返回，用于超时测试
    Hang,
}

/// # Summary
/// 返回预设数据并记录所有请求的模拟行情源。
pub struct ScriptedProvider {
    response: Scripted,
    calls: Mutex<Vec<FetchCall>>,
}

impl ScriptedProvider {
    pub fn new(response: Scripted) -> Self {
        Self {
            response,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_candles(candles: Vec<Candle>) -> Self {
        Self::new(Scripted::Candles(candles))
    }

    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl MarketDataProvider for ScriptedProvider {
    async fn fetch_candles(
        &self,
        stock: &Stock,
        timeframe: TimeFrame,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Candle>, MarketError> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(FetchCall {
                symbol: stock.symbol.clone(),
                timeframe,
                start,
                end,
            });

        match &self.response {
            Scripted::Candles(candles) => Ok(candles.clone()),
            Scripted::Fail(make) => Err(make()),
            Scripted::Hang => {
                std::future::pending::<()>().await;
                Err(MarketError::Unknown("unreachable".into()))
            }
        }
    }
}

/// # Summary
/// 生成从 `start` 开始的连续日线，时间为纽约 (UTC-5) 本地零点。
///
/// # Arguments
/// * `start`: 第一根 K 线的日期。
/// * `days`: 数量。
/// * `close`: 第 i 天的收盘价。
pub fn daily_candles(start: NaiveDate, days: usize, close: impl Fn(usize) -> f64) -> Vec<Candle> {
    let tz = FixedOffset::west_opt(5 * 3600).unwrap_or_else(|| Utc.fix());
    (0..days)
        .filter_map(|i| {
            let date = start + Duration::days(i as i64);
            let naive = date.and_hms_opt(0, 0, 0)?;
            let time = tz.from_local_datetime(&naive).single()?;
            let c = close(i);
            Some(Candle {
                time,
                open: c,
                high: c,
                low: c,
                close: c,
                adj_close: Some(c),
                volume: 1_000.0,
            })
        })
        .collect()
}
