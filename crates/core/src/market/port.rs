use crate::common::{Stock, TimeFrame};
use crate::market::entity::Candle;
use crate::market::error::MarketError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// # Summary
/// 市场行情数据提供者接口（原始数据源）。
///
/// # Invariants
/// - 返回的 K 线按时间升序排列。
/// - 未知代码应返回 `MarketError::NotFound` 或空列表，由调用方统一视为无数据。
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// # Summary
    /// 获取特定证券在指定时间范围内的 K 线数据。
    ///
    /// # Logic
    /// 1. 构建数据源请求。
    /// 2. 执行网络请求并解析响应数据。
    ///
    /// # Arguments
    /// * `stock`: 证券身份。
    /// * `timeframe`: K 线周期。
    /// * `start`: 开始时间。
    /// * `end`: 结束时间。
    ///
    /// # Returns
    /// 成功返回 K 线列表。
    async fn fetch_candles(
        &self,
        stock: &Stock,
        timeframe: TimeFrame,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Candle>, MarketError>;
}
