use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use blackgem_core::common::{Stock, TimeFrame};
use blackgem_core::market::error::MarketError;
use blackgem_core::market::port::MarketDataProvider;
use blackgem_feed::yahoo::YahooProvider;
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// 桩服务记录到的请求
#[derive(Clone, Default)]
struct Recorded {
    requests: Arc<Mutex<Vec<(String, HashMap<String, String>)>>>,
}

fn chart_body() -> serde_json::Value {
    // 三个交易日，第二天 close 缺失应被跳过; 纽约夏令时偏移 -4h
    serde_json::json!({
        "chart": {
            "result": [{
                "meta": { "symbol": "AAPL", "gmtoffset": -14400 },
                "timestamp": [1710250200, 1710336600, 1710423000],
                "indicators": {
                    "quote": [{
                        "open":   [170.0, 171.0, 172.0],
                        "high":   [173.0, 174.0, 175.0],
                        "low":    [169.0, 170.0, 171.0],
                        "close":  [172.5, null,  174.5],
                        "volume": [1000.0, 2000.0, 3000.0]
                    }],
                    "adjclose": [{ "adjclose": [172.4, null, 174.4] }]
                }
            }],
            "error": null
        }
    })
}

async fn chart(
    State(recorded): State<Recorded>,
    Path(symbol): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    recorded
        .requests
        .lock()
        .unwrap()
        .push((symbol.clone(), params));

    match symbol.as_str() {
        "AAPL" => axum::Json(chart_body()).into_response(),
        "EMPTY" => axum::Json(serde_json::json!({
            "chart": {
                "result": [{
                    "meta": { "gmtoffset": -18000 },
                    "indicators": { "quote": [{}] }
                }],
                "error": null
            }
        }))
        .into_response(),
        "DELISTED" => axum::Json(serde_json::json!({
            "chart": {
                "result": null,
                "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
            }
        }))
        .into_response(),
        "BROKEN" => (StatusCode::OK, "not json").into_response(),
        "DOWN" => StatusCode::SERVICE_UNAVAILABLE.into_response(),
        "SLOW" => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            axum::Json(chart_body()).into_response()
        }
        _ => (
            StatusCode::NOT_FOUND,
            axum::Json(serde_json::json!({
                "chart": { "result": null, "error": { "code": "Not Found", "description": "No data found" } }
            })),
        )
            .into_response(),
    }
}

/// 在随机端口启动 Yahoo 桩服务，返回 base_url
async fn spawn_stub() -> (String, Recorded) {
    let recorded = Recorded::default();
    let app = Router::new()
        .route("/v8/finance/chart/{symbol}", get(chart))
        .with_state(recorded.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, recorded)
}

fn provider(base_url: &str, timeout: Duration) -> YahooProvider {
    YahooProvider::new(base_url, timeout).unwrap()
}

async fn fetch(p: &YahooProvider, symbol: &str) -> Result<Vec<blackgem_core::market::entity::Candle>, MarketError> {
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2024, 3, 20, 0, 0, 0).unwrap();
    p.fetch_candles(&Stock::new(symbol), TimeFrame::Day1, start, end)
        .await
}

/// # Summary
/// 解析日线并保留交易所时区。
///
/// # Logic
/// 1. 请求桩服务的 AAPL。
/// 2. 缺失 close 的那一天被跳过。
/// 3. 时间对齐到纽约本地零点，偏移为 -4h。
#[tokio::test]
async fn test_fetch_parses_daily_bars() -> anyhow::Result<()> {
    let (base, recorded) = spawn_stub().await;
    let p = provider(&base, Duration::from_secs(5));

    let candles = fetch(&p, "AAPL").await?;
    assert_eq!(candles.len(), 2);
    assert_eq!(candles[0].close, 172.5);
    assert_eq!(candles[0].adj_close, Some(172.4));
    assert_eq!(candles[1].close, 174.5);
    assert_eq!(candles[0].time.offset().local_minus_utc(), -14400);
    assert_eq!(
        candles[0].time.naive_local().to_string(),
        "2024-03-12 00:00:00"
    );

    let requests = recorded.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    let (symbol, params) = &requests[0];
    assert_eq!(symbol, "AAPL");
    assert_eq!(params.get("interval").map(String::as_str), Some("1d"));
    assert_eq!(params.get("period1").map(String::as_str), Some("1709251200"));
    assert_eq!(params.get("period2").map(String::as_str), Some("1710892800"));
    Ok(())
}

#[tokio::test]
async fn test_fetch_without_timestamps_is_empty() {
    let (base, _) = spawn_stub().await;
    let p = provider(&base, Duration::from_secs(5));
    let candles = fetch(&p, "EMPTY").await.unwrap();
    assert!(candles.is_empty());
}

#[tokio::test]
async fn test_unknown_symbol_maps_to_not_found() {
    let (base, _) = spawn_stub().await;
    let p = provider(&base, Duration::from_secs(5));

    assert!(matches!(fetch(&p, "ZZZZ").await, Err(MarketError::NotFound)));
    assert!(matches!(fetch(&p, "DELISTED").await, Err(MarketError::NotFound)));
}

#[tokio::test]
async fn test_upstream_failures() {
    let (base, _) = spawn_stub().await;
    let p = provider(&base, Duration::from_secs(5));

    match fetch(&p, "DOWN").await {
        Err(MarketError::Network(msg)) => assert!(msg.contains("503")),
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(matches!(fetch(&p, "BROKEN").await, Err(MarketError::Parse(_))));
}

#[tokio::test]
async fn test_client_timeout() {
    let (base, _) = spawn_stub().await;
    let p = provider(&base, Duration::from_millis(200));
    assert!(matches!(fetch(&p, "SLOW").await, Err(MarketError::Timeout(_))));
}

#[tokio::test]
async fn test_unreachable_host_is_network_error() {
    // 绑定后立即释放端口，确保连接被拒绝
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let p = provider(&addr, Duration::from_secs(2));
    assert!(matches!(fetch(&p, "AAPL").await, Err(MarketError::Network(_))));
}

/// # Summary
/// 代码中的 `/`、`..`、`#`、`?` 不会把请求改写到其他代码。
///
/// # Logic
/// 1. 每个代码都只作为一个路径段送达桩服务，解码后与输入一致。
/// 2. 桩服务不认识这些代码，统一得到 NotFound，而不是 AAPL 的数据。
#[tokio::test]
async fn test_symbol_is_sent_as_single_path_segment() {
    let (base, recorded) = spawn_stub().await;
    let p = provider(&base, Duration::from_secs(5));

    let symbols = ["ZZZ/../AAPL", "AAPL#junk", "AAPL?x=1", "AAPL/"];
    for symbol in symbols {
        assert!(
            matches!(fetch(&p, symbol).await, Err(MarketError::NotFound)),
            "symbol {:?} should not resolve to AAPL",
            symbol
        );
    }

    let seen: Vec<String> = recorded
        .requests
        .lock()
        .unwrap()
        .iter()
        .map(|(symbol, _)| symbol.clone())
        .collect();
    assert_eq!(seen, symbols.to_vec());
}
