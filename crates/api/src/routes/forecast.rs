//! # 预测路由控制器
//!
//! 实现 `/api/v1/forecast` 接口。页面每次点击 Scan 按钮调用一次，
//! 首屏加载时以 `n_clicks=0` 调用一次。

use axum::Json;
use axum::extract::{Query, State};
use blackgem_manager::forecast::Submission;

use crate::error::ApiError;
use crate::server::AppState;
use crate::types::{ApiErrorResponse, ApiResponse, ForecastQuery, ForecastResponse};

/// 获取指定证券的收盘价走势与未来预测
///
/// `n_clicks` 为 0 时忽略 `symbol`，使用默认代码；否则原样使用 `symbol`。
/// 成功时返回可直接渲染的 Plotly figure，失败时返回明确的错误信息，不返回部分图表。
#[utoipa::path(
    get,
    path = "/api/v1/forecast",
    tag = "预测 (Forecast)",
    params(ForecastQuery),
    responses(
        (status = 200, description = "预测成功", body = ApiResponse<ForecastResponse>),
        (status = 400, description = "证券代码为空", body = ApiErrorResponse),
        (status = 404, description = "没有该代码的历史数据", body = ApiErrorResponse),
        (status = 422, description = "历史数据不足以拟合模型", body = ApiErrorResponse),
        (status = 502, description = "行情数据源异常", body = ApiErrorResponse),
        (status = 504, description = "行情数据源超时", body = ApiErrorResponse)
    )
)]
pub async fn get_forecast(
    State(state): State<AppState>,
    Query(query): Query<ForecastQuery>,
) -> Result<Json<ApiResponse<ForecastResponse>>, ApiError> {
    let submission =
        Submission::from_clicks(query.n_clicks.unwrap_or(0), query.symbol.unwrap_or_default());

    let outcome = state.forecast_manager.handle(submission).await?;

    // 利用 impl From<ForecastOutcome> for ForecastResponse 惯用转换
    Ok(Json(ApiResponse::ok(outcome.into())))
}
