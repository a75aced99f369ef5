mod settings;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use blackgem_api::server::{AppState, start_server};
use blackgem_core::common::time::RealTimeProvider;
use blackgem_feed::yahoo::YahooProvider;
use blackgem_forecast::{AdditiveEngine, EngineSettings};
use blackgem_manager::forecast::ForecastManager;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_LOG_FILTER: &str = "info,blackgem=debug,tower_http=info";

/// # Summary
/// 应用启动入口，纯粹的 DI 容器。
/// 负责实例化所有具体实现组件并通过 Arc<dyn Trait> 注入到 ForecastManager。
///
/// # Logic
/// 1. 初始化全局日志 (非阻塞 stdout)。
/// 2. 加载配置 (文件 + 环境变量)。
/// 3. 实例化基础设施层（Yahoo 行情源、时钟）。
/// 4. 实例化预测引擎。
/// 5. 构造应用服务层（ForecastManager）并启动 HTTP 服务，直到收到退出信号。
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 初始化日志，guard 必须存活到进程退出以刷新缓冲
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stdout());
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(writer))
        .init();
    info!("BlackGem forecast dashboard starting...");

    // 2. 加载配置
    let config = Arc::new(
        settings::load(Path::new("config")).context("failed to load configuration")?,
    );
    info!(
        bind = %config.server.bind_addr(),
        default_symbol = %config.forecast.default_symbol,
        horizon_days = config.forecast.horizon_days,
        "Configuration loaded"
    );

    // 3. 实例化基础设施层
    let provider = Arc::new(
        YahooProvider::from_config(&config.market).context("failed to build market data client")?,
    );
    let clock = Arc::new(RealTimeProvider);

    // 4. 实例化预测引擎（App 层知道具体实现，Manager 不知道）
    let engine = Arc::new(AdditiveEngine::new(EngineSettings::from(&config.forecast)));

    // 5. 构造应用服务层并启动
    let forecast_manager = ForecastManager::new(provider, engine, clock, &config);
    let state = AppState {
        forecast_manager,
        config: config.clone(),
    };

    let bind_addr = config.server.bind_addr();
    start_server(state, &bind_addr)
        .await
        .with_context(|| format!("server on {} stopped with an error", bind_addr))?;

    info!("Shutdown complete. Exiting...");
    Ok(())
}
