use blackgem_core::common::TimeFrame;
use blackgem_core::common::time::FakeClockProvider;
use blackgem_core::config::AppConfig;
use blackgem_core::forecast::error::ModelError;
use blackgem_core::forecast::port::{FittedModel, ForecastEngine};
use blackgem_core::market::entity::PriceSeries;
use blackgem_core::market::error::MarketError;
use blackgem_core::test_utils::{Scripted, ScriptedProvider, daily_candles};
use blackgem_forecast::AdditiveEngine;
use blackgem_manager::chart::{FORECAST_TRACE, HISTORY_TRACE, LOWER_TRACE, UPPER_TRACE};
use blackgem_manager::forecast::{ForecastError, ForecastManager, Submission};
use chrono::{Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use std::sync::Arc;

/// 按名称查找 figure 中的折线
fn trace<'a>(figure: &'a Value, name: &str) -> &'a Value {
    figure["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["name"] == name)
        .unwrap_or_else(|| panic!("missing trace {}", name))
}

fn dates(trace: &Value) -> Vec<NaiveDateTime> {
    trace["x"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().parse().unwrap())
        .collect()
}

fn values(trace: &Value) -> Vec<f64> {
    trace["y"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_f64().unwrap())
        .collect()
}

/// 固定时钟: 2024-06-01 12:00 UTC
fn clock() -> Arc<FakeClockProvider> {
    Arc::new(FakeClockProvider::new(
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
    ))
}

/// 2024-01-01 至 2024-05-31 的日线，带轻微上升趋势
fn history() -> Vec<blackgem_core::market::entity::Candle> {
    daily_candles(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 152, |i| {
        100.0 + 0.3 * i as f64 + (i % 5) as f64
    })
}

fn manager_with(provider: Arc<ScriptedProvider>, config: &AppConfig) -> Arc<ForecastManager> {
    ForecastManager::new(
        provider,
        Arc::new(AdditiveEngine::default()),
        clock(),
        config,
    )
}

/// # Summary
/// 完整流程: 用户提交 AAPL。
///
/// # Logic
/// 1. 数据源收到 AAPL、日线、2015-01-01 至当前时刻的请求。
/// 2. 图表包含四条折线，标题为 "AAPL closing value"。
/// 3. 预测折线全部不早于当前时刻，且模型预测到历史最后一天 + 90 天。
#[tokio::test]
async fn test_submitted_symbol_full_flow() -> anyhow::Result<()> {
    let provider = Arc::new(ScriptedProvider::with_candles(history()));
    let manager = manager_with(provider.clone(), &AppConfig::default());

    let outcome = manager
        .handle(Submission::from_clicks(1, "AAPL"))
        .await?;

    let calls = provider.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].symbol, "AAPL");
    assert_eq!(calls[0].timeframe, TimeFrame::Day1);
    assert_eq!(calls[0].start, Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap());
    assert_eq!(calls[0].end, Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap());

    let figure = &outcome.figure;
    assert_eq!(figure["data"].as_array().unwrap().len(), 4);
    assert_eq!(figure["layout"]["title"]["text"], "AAPL closing value");

    let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap().naive_utc();
    let forecast = trace(figure, FORECAST_TRACE);
    let forecast_x = dates(forecast);
    assert!(!forecast_x.is_empty());
    assert!(forecast_x.iter().all(|ds| *ds >= now));

    let last_history = NaiveDate::from_ymd_opt(2024, 5, 31)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    assert_eq!(outcome.horizon_days, 90);
    assert_eq!(outcome.forecast_end, Some(last_history + Duration::days(90)));
    assert_eq!(forecast_x.last().copied(), outcome.forecast_end);
    // 6 月 1 日 00:00 早于当前时刻，被截掉
    assert_eq!(outcome.forecast_points, 89);
    assert_eq!(outcome.history_points, 152);
    assert_eq!(outcome.symbol, "AAPL");

    let upper = trace(figure, UPPER_TRACE);
    let lower = trace(figure, LOWER_TRACE);
    assert_eq!(dates(upper), forecast_x);
    assert!(
        values(upper)
            .iter()
            .zip(&values(lower))
            .zip(&values(forecast))
            .all(|((u, l), m)| l <= m && m <= u)
    );
    Ok(())
}

#[tokio::test]
async fn test_initial_view_ignores_text_field() {
    let provider = Arc::new(ScriptedProvider::with_candles(history()));
    let manager = manager_with(provider.clone(), &AppConfig::default());

    let outcome = manager
        .handle(Submission::from_clicks(0, "AAPL"))
        .await
        .unwrap();

    assert_eq!(outcome.symbol, "COIN");
    assert_eq!(outcome.figure["layout"]["title"]["text"], "COIN closing value");
    assert_eq!(provider.calls()[0].symbol, "COIN");
}

#[tokio::test]
async fn test_default_symbol_is_configurable() {
    let mut config = AppConfig::default();
    config.forecast.default_symbol = "MSFT".to_string();
    let provider = Arc::new(ScriptedProvider::with_candles(history()));
    let manager = manager_with(provider.clone(), &config);

    assert_eq!(manager.default_symbol(), "MSFT");
    let outcome = manager.handle(Submission::Initial).await.unwrap();
    assert_eq!(outcome.symbol, "MSFT");
}

#[tokio::test]
async fn test_submitted_symbol_is_used_verbatim() {
    let provider = Arc::new(ScriptedProvider::with_candles(history()));
    let manager = manager_with(provider.clone(), &AppConfig::default());

    let outcome = manager
        .handle(Submission::Submitted(" brk-b ".to_string()))
        .await
        .unwrap();
    assert_eq!(outcome.symbol, " brk-b ");
    assert_eq!(provider.calls()[0].symbol, " brk-b ");
}

#[tokio::test]
async fn test_history_timestamps_are_naive_local_dates() {
    let provider = Arc::new(ScriptedProvider::with_candles(history()));
    let manager = manager_with(provider, &AppConfig::default());

    let outcome = manager.handle(Submission::Initial).await.unwrap();
    let history = dates(trace(&outcome.figure, HISTORY_TRACE));

    // 数据源给的是纽约零点 (UTC 05:00)，去掉时区后仍是零点
    let first = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    assert_eq!(history[0], first);
    assert!(history.iter().all(|ds| ds.time() == first.time()));
}

#[tokio::test]
async fn test_blank_symbol_is_rejected_without_fetching() {
    let provider = Arc::new(ScriptedProvider::with_candles(history()));
    let manager = manager_with(provider.clone(), &AppConfig::default());

    for text in ["", "   ", "\t"] {
        let err = manager
            .handle(Submission::from_clicks(3, text))
            .await
            .unwrap_err();
        assert!(matches!(err, ForecastError::InvalidSymbol(_)));
    }
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_empty_provider_result_is_no_data() {
    let provider = Arc::new(ScriptedProvider::with_candles(Vec::new()));
    let manager = manager_with(provider, &AppConfig::default());

    let err = manager
        .handle(Submission::from_clicks(1, "NOPE"))
        .await
        .unwrap_err();
    match err {
        ForecastError::NoData(symbol) => assert_eq!(symbol, "NOPE"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_provider_errors_are_classified() {
    let cases: Vec<(fn() -> MarketError, fn(&ForecastError) -> bool)> = vec![
        (|| MarketError::NotFound, |e| matches!(e, ForecastError::NoData(_))),
        (
            || MarketError::Network("connection reset".into()),
            |e| matches!(e, ForecastError::Upstream(MarketError::Network(_))),
        ),
        (
            || MarketError::Parse("bad json".into()),
            |e| matches!(e, ForecastError::Upstream(MarketError::Parse(_))),
        ),
        (
            || MarketError::Timeout(10),
            |e| matches!(e, ForecastError::Timeout { secs: 10, .. }),
        ),
    ];

    for (make, check) in cases {
        let provider = Arc::new(ScriptedProvider::new(Scripted::Fail(make)));
        let manager = manager_with(provider, &AppConfig::default());
        let err = manager
            .handle(Submission::from_clicks(1, "AAPL"))
            .await
            .unwrap_err();
        assert!(check(&err), "unexpected error: {:?}", err);
    }
}

#[tokio::test(start_paused = true)]
async fn test_slow_provider_times_out() {
    let mut config = AppConfig::default();
    config.market.timeout_secs = 3;
    let provider = Arc::new(ScriptedProvider::new(Scripted::Hang));
    let manager = manager_with(provider, &config);

    let err = manager
        .handle(Submission::from_clicks(1, "AAPL"))
        .await
        .unwrap_err();
    match err {
        ForecastError::Timeout { symbol, secs } => {
            assert_eq!(symbol, "AAPL");
            assert_eq!(secs, 3);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_single_bar_fails_in_model() {
    let candles = daily_candles(NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(), 1, |_| 10.0);
    let provider = Arc::new(ScriptedProvider::with_candles(candles));
    let manager = manager_with(provider, &AppConfig::default());

    let err = manager
        .handle(Submission::Initial)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ForecastError::Model(ModelError::InsufficientHistory { .. })
    ));
}

/// 总是拟合失败的引擎
struct BrokenEngine;

impl ForecastEngine for BrokenEngine {
    fn name(&self) -> &str {
        "broken"
    }

    fn fit(&self, _: &PriceSeries) -> Result<Box<dyn FittedModel>, ModelError> {
        Err(ModelError::Numerical("singular".into()))
    }
}

#[tokio::test]
async fn test_engine_failure_produces_no_chart() {
    let provider = Arc::new(ScriptedProvider::with_candles(history()));
    let manager = ForecastManager::new(
        provider,
        Arc::new(BrokenEngine),
        clock(),
        &AppConfig::default(),
    );

    let err = manager.handle(Submission::Initial).await.unwrap_err();
    assert!(matches!(err, ForecastError::Model(ModelError::Numerical(_))));
}

#[tokio::test]
async fn test_custom_horizon() {
    let mut config = AppConfig::default();
    config.forecast.horizon_days = 30;
    let provider = Arc::new(ScriptedProvider::with_candles(history()));
    let manager = manager_with(provider, &config);

    let outcome = manager.handle(Submission::Initial).await.unwrap();
    assert_eq!(outcome.horizon_days, 30);
    assert_eq!(
        outcome.forecast_end,
        Some(
            NaiveDate::from_ymd_opt(2024, 6, 30)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        )
    );
}

#[tokio::test]
async fn test_visible_forecast_follows_the_clock() {
    let clock = clock();
    let provider = Arc::new(ScriptedProvider::with_candles(history()));
    let manager = ForecastManager::new(
        provider,
        Arc::new(AdditiveEngine::default()),
        clock.clone(),
        &AppConfig::default(),
    );

    let before = manager.handle(Submission::Initial).await.unwrap();
    clock.advance(Duration::days(10));
    let after = manager.handle(Submission::Initial).await.unwrap();

    // 历史不变，预测终点不变，可见的预测点随当前时刻后移而减少
    assert_eq!(after.forecast_end, before.forecast_end);
    assert_eq!(after.forecast_points, before.forecast_points - 10);
    let now = Utc.with_ymd_and_hms(2024, 6, 11, 12, 0, 0).unwrap().naive_utc();
    assert!(dates(trace(&after.figure, FORECAST_TRACE)).iter().all(|ds| *ds >= now));
}

#[tokio::test]
async fn test_upstream_error_keeps_its_source() {
    let provider = Arc::new(ScriptedProvider::new(Scripted::Fail(|| {
        MarketError::Network("connection reset".into())
    })));
    let manager = manager_with(provider, &AppConfig::default());

    let err = manager
        .handle(Submission::from_clicks(1, "AAPL"))
        .await
        .unwrap_err();
    let source = std::error::Error::source(&err).expect("upstream error should carry its cause");
    assert!(source.to_string().contains("connection reset"));
}
