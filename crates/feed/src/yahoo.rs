use async_trait::async_trait;
use blackgem_core::common::{Stock, TimeFrame};
use blackgem_core::config::MarketConfig;
use blackgem_core::market::entity::Candle;
use blackgem_core::market::error::MarketError;
use blackgem_core::market::port::MarketDataProvider;
use chrono::{DateTime, FixedOffset, Offset, TimeZone, Utc};
use reqwest::{Client, Url};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// # Summary
/// Yahoo Finance 行情提供者实现。
///
/// # Invariants
/// - 使用 `reqwest` 异步客户端进行通讯。
/// - `base_url` 是可以追加路径段的绝对地址。
#[derive(Clone)]
pub struct YahooProvider {
    /// 内部使用的 HTTP 客户端
    client: Client,
    /// 接口根地址
    base_url: Url,
    /// 客户端超时 (秒)，用于错误信息
    timeout_secs: u64,
}

impl YahooProvider {
    /// # Summary
    /// 创建一个新的 YahooProvider 实例。
    ///
    /// # Logic
    /// 1. 安装 rustls 的 ring 加密后端 (已安装则跳过)。
    /// 2. 设置伪装浏览器 Header (User-Agent) 以减少被拦截风险。
    /// 3. 按给定超时初始化 reqwest 客户端。
    ///
    /// # Arguments
    /// * `base_url`: 接口根地址，如 `https://query1.finance.yahoo.com`。
    /// * `timeout`: 单次请求超时。
    ///
    /// # Returns
    /// 成功返回 YahooProvider，地址非法或客户端构建失败返回 `MarketError::Network`。
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, MarketError> {
        let raw = base_url.into();
        let base_url = Url::parse(&raw)
            .map_err(|e| MarketError::Network(format!("Invalid base URL {}: {}", raw, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(MarketError::Network(format!("Invalid base URL {}", raw)));
        }

        if rustls::crypto::ring::default_provider()
            .install_default()
            .is_err()
        {
            debug!("rustls crypto provider already installed");
        }

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| MarketError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            timeout_secs: timeout.as_secs(),
        })
    }

    /// # Summary
    /// 拼接 chart 接口地址。
    ///
    /// # Logic
    /// 代码作为单个路径段追加并做百分号编码，`/`、`?`、`#` 不会改变请求的资源。
    fn chart_url(&self, symbol: &str) -> Result<Url, MarketError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| MarketError::Network(format!("Invalid base URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart"])
            .push(symbol);
        Ok(url)
    }

    /// 从行情配置构建
    pub fn from_config(config: &MarketConfig) -> Result<Self, MarketError> {
        Self::new(
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }
}

/// # Summary
/// Yahoo API 响应顶层结构。
///
/// # Invariants
/// - 映射自 Yahoo v8 chart 接口。
#[derive(Deserialize, Debug)]
struct YahooResponse {
    chart: YahooChart,
}

/// # Summary
/// Yahoo API 图表数据部分。
#[derive(Deserialize, Debug)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

/// # Summary
/// Yahoo API 错误详情。
#[derive(Deserialize, Debug)]
struct YahooError {
    code: Option<String>,
    description: String,
}

/// # Summary
/// Yahoo API 单个时间序列结果。
///
/// 请求区间内没有交易日时 Yahoo 会省略 `timestamp` 字段。
#[derive(Deserialize, Debug)]
struct YahooResult {
    meta: Option<YahooMeta>,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: YahooIndicators,
}

/// 交易所元数据，只关心 UTC 偏移
#[derive(Deserialize, Debug)]
struct YahooMeta {
    gmtoffset: Option<i32>,
}

/// # Summary
/// Yahoo API 指标容器。
#[derive(Deserialize, Debug)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
    // 调整后的价格数据
    adjclose: Option<Vec<YahooAdjClose>>,
}

#[derive(Deserialize, Debug)]
struct YahooAdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// # Summary
/// Yahoo API 原始报价数据。
#[derive(Deserialize, Debug)]
struct YahooQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

fn interval_of(timeframe: TimeFrame) -> &'static str {
    match timeframe {
        TimeFrame::Minute1 => "1m",
        TimeFrame::Minute5 => "5m",
        TimeFrame::Hour1 => "60m",
        TimeFrame::Day1 => "1d",
    }
}

/// # Summary
/// 把 Unix 时间戳转换为交易所本地时区时间。
///
/// # Logic
/// 1. 按 `offset` 得到带时区的时间。
/// 2. 日线统一对齐到本地零点，与常见数据表的日期索引一致。
fn local_time(ts: i64, offset: FixedOffset, timeframe: TimeFrame) -> Option<DateTime<FixedOffset>> {
    let time = offset.timestamp_opt(ts, 0).single()?;
    if timeframe != TimeFrame::Day1 {
        return Some(time);
    }
    let midnight = time.date_naive().and_hms_opt(0, 0, 0)?;
    offset.from_local_datetime(&midnight).single()
}

/// # Summary
/// 把 Yahoo 的 chart 结果解析为 K 线列表。
///
/// # Logic
/// 1. 读取交易所 UTC 偏移，缺失时按 UTC 处理。
/// 2. 逐个时间戳对齐 OHLCV，任一字段缺失的行直接跳过。
/// 3. 合并 adjclose。
fn parse_candles(result: YahooResult, timeframe: TimeFrame) -> Result<Vec<Candle>, MarketError> {
    let offset = result
        .meta
        .as_ref()
        .and_then(|m| m.gmtoffset)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix());

    if result.timestamp.is_empty() {
        return Ok(Vec::new());
    }

    let quote = result
        .indicators
        .quote
        .first()
        .ok_or(MarketError::Parse("No quote data".into()))?;

    let adj_close_list = result
        .indicators
        .adjclose
        .as_ref()
        .and_then(|v| v.first())
        .map(|v| &v.adjclose);

    let mut candles = Vec::with_capacity(result.timestamp.len());
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let Some(time) = local_time(ts, offset, timeframe) else {
            warn!("Skipping out-of-range timestamp {}", ts);
            continue;
        };
        if let (Some(o), Some(h), Some(l), Some(c), Some(v)) = (
            quote.open.get(i).and_then(|x| *x),
            quote.high.get(i).and_then(|x| *x),
            quote.low.get(i).and_then(|x| *x),
            quote.close.get(i).and_then(|x| *x),
            quote.volume.get(i).and_then(|x| *x),
        ) {
            let adj_c = adj_close_list.and_then(|list| list.get(i)).and_then(|x| *x);

            candles.push(Candle {
                time,
                open: o,
                high: h,
                low: l,
                close: c,
                adj_close: adj_c,
                volume: v,
            });
        }
    }

    Ok(candles)
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    /// # Summary
    /// 从 Yahoo Finance 抓取 K 线历史数据。
    ///
    /// # Logic
    /// 1. 映射 TimeFrame 周期为 Yahoo 识别的 interval。
    /// 2. 构建包含 period1, period2 的 API URL。
    /// 3. 发起异步请求并解析嵌套的 JSON 数据。
    /// 4. 区分 404 / 未知代码 (NotFound)、超时与其他网络错误。
    ///
    /// # Arguments
    /// * `stock`: 证券实体。
    /// * `timeframe`: 周期。
    /// * `start`: 开始时间。
    /// * `end`: 结束时间。
    ///
    /// # Returns
    /// 成功返回 K 线列表，失败返回 MarketError。
    async fn fetch_candles(
        &self,
        stock: &Stock,
        timeframe: TimeFrame,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Candle>, MarketError> {
        let symbol = &stock.symbol;
        let url = self.chart_url(symbol)?;
        debug!(%symbol, %timeframe, %start, %end, "Requesting Yahoo chart");

        let resp = self
            .client
            .get(url)
            .query(&[
                ("symbol", symbol.as_str()),
                ("period1", &start.timestamp().to_string()),
                ("period2", &end.timestamp().to_string()),
                ("interval", interval_of(timeframe)),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MarketError::Timeout(self.timeout_secs)
                } else {
                    MarketError::Network(e.to_string())
                }
            })?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(MarketError::NotFound);
        }
        if !resp.status().is_success() {
            return Err(MarketError::Network(format!("HTTP {}", resp.status())));
        }

        let json: YahooResponse = resp
            .json()
            .await
            .map_err(|e| MarketError::Parse(e.to_string()))?;

        if let Some(err) = json.chart.error {
            return match err.code.as_deref() {
                Some("Not Found") => Err(MarketError::NotFound),
                _ => Err(MarketError::Unknown(err.description)),
            };
        }

        let result = json
            .chart
            .result
            .ok_or(MarketError::NotFound)?
            .pop()
            .ok_or(MarketError::NotFound)?;

        let candles = parse_candles(result, timeframe)?;
        debug!(%symbol, count = candles.len(), "Yahoo chart parsed");
        Ok(candles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_time_aligns_daily_bars_to_local_midnight() {
        let ny = FixedOffset::west_opt(4 * 3600).unwrap();
        // 2024-03-15 13:30 UTC = 09:30 纽约
        let t = local_time(1_710_509_400, ny, TimeFrame::Day1).unwrap();
        assert_eq!(t.naive_local().to_string(), "2024-03-15 00:00:00");
        assert_eq!(t.offset(), &ny);

        let intraday = local_time(1_710_509_400, ny, TimeFrame::Hour1).unwrap();
        assert_eq!(intraday.naive_local().to_string(), "2024-03-15 09:30:00");
    }

    #[test]
    fn test_interval_mapping() {
        assert_eq!(interval_of(TimeFrame::Day1), "1d");
        assert_eq!(interval_of(TimeFrame::Hour1), "60m");
    }

    #[test]
    fn test_chart_url_keeps_symbol_in_one_segment() {
        let p = YahooProvider::new("http://127.0.0.1:9/proxy/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            p.chart_url("BRK-B").unwrap().as_str(),
            "http://127.0.0.1:9/proxy/v8/finance/chart/BRK-B"
        );
        assert_eq!(
            p.chart_url("ZZZ/../AAPL").unwrap().path(),
            "/proxy/v8/finance/chart/ZZZ%2F..%2FAAPL"
        );
        let url = p.chart_url("AAPL?x=1#junk").unwrap();
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        assert!(matches!(
            YahooProvider::new("not a url", Duration::from_secs(1)),
            Err(MarketError::Network(_))
        ));
    }
}
