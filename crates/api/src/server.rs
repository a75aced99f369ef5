//! # API 服务启动器
//!
//! 组装 axum 路由、挂载 Swagger UI 与静态资源、配置 CORS 与请求追踪，并绑定 TCP 端口对外提供服务。
//! 本模块不直接启动 `main()`, 而是由 `crates/app` 的 DI 容器持有并调用。

use std::sync::Arc;

use axum::Router;
use blackgem_core::config::AppConfig;
use blackgem_manager::forecast::ForecastManager;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use utoipa_swagger_ui::SwaggerUi;

use crate::routes::{forecast, health, page};

// ============================================================
//  共享应用状态
// ============================================================

/// 全局应用状态，通过 axum 的 `State` 提取器注入到每个 Handler 中。
///
/// # Invariants
/// - `forecast_manager` 在服务启动前由 DI 容器注入，生命周期与进程等同。
#[derive(Clone)]
pub struct AppState {
    /// 预测处理器
    pub forecast_manager: Arc<ForecastManager>,
    /// 全局配置 (页面配色、静态资源目录)
    pub config: Arc<AppConfig>,
}

// ============================================================
//  OpenAPI 文档定义
// ============================================================

/// 全局 OpenAPI 文档结构
#[derive(OpenApi)]
#[openapi(
    info(
        title = "BlackGem 股价预测 API",
        version = "0.1.0",
        description = "BlackGem 股价预测看板的 HTTP 接口。提供历史收盘价拉取、90 天预测与图表描述。",
        contact(name = "BlackGem Team"),
        license(name = "MIT")
    ),
    tags(
        (name = "预测 (Forecast)", description = "收盘价历史与预测图表"),
        (name = "页面 (Page)", description = "看板 HTML 页面"),
        (name = "系统 (System)", description = "健康检查")
    )
)]
pub struct ApiDoc;

// ============================================================
//  服务构建与启动
// ============================================================

/// # Summary
/// 构建完整的 axum 应用路由树。
///
/// # Logic
/// 1. 通过 `OpenApiRouter` 注册页面、预测与健康检查路由，同时收集 OpenAPI 文档。
/// 2. 将 `/assets` 挂载到配置的静态资源目录。
/// 3. 合并 Swagger UI，应用请求追踪与 CORS 中间件。
///
/// # Arguments
/// * `state` - 由外部 DI 容器注入的共享状态
pub fn build_router(state: AppState) -> Router {
    let assets_dir = state.config.server.assets_dir.clone();

    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .routes(routes!(page::index))
        .routes(routes!(forecast::get_forecast))
        .routes(routes!(health::healthz))
        .with_state(state)
        .split_for_parts();

    router
        .nest_service("/assets", ServeDir::new(assets_dir))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// 构建路由并启动 HTTP 监听，收到 Ctrl-C 后优雅退出。
///
/// # Arguments
/// * `state` - 由外部 DI 容器注入的共享状态
/// * `bind_addr` - 监听的地址与端口，如 `"127.0.0.1:8050"`
///
/// # Errors
/// TCP 绑定失败或服务异常退出时返回错误。
pub async fn start_server(
    state: AppState,
    bind_addr: &str,
) -> std::io::Result<()> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    let local = listener.local_addr()?;
    tracing::info!("🚀 BlackGem dashboard listening on http://{}", local);
    tracing::info!("📖 Swagger UI: http://{}/swagger-ui/", local);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
