//! # API 统一错误处理
//!
//! 将预测流程的错误统一映射到 HTTP 状态码与 JSON 响应体。
//! 页面根据 `error` 字段展示错误信息，不渲染任何部分图表。

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use blackgem_manager::forecast::ForecastError;
use thiserror::Error;

use crate::types::ApiErrorResponse;

/// API 层统一错误枚举
#[derive(Error, Debug)]
pub enum ApiError {
    /// 请求参数错误 (400)
    #[error("请求参数错误: {0}")]
    BadRequest(String),

    /// 资源未找到 (404)
    #[error("资源未找到: {0}")]
    NotFound(String),

    /// 数据不足以完成预测 (422)
    #[error("无法处理: {0}")]
    Unprocessable(String),

    /// 上游数据源异常 (502)
    #[error("上游服务错误: {0}")]
    BadGateway(String),

    /// 上游数据源超时 (504)
    #[error("上游服务超时: {0}")]
    GatewayTimeout(String),

    /// 下层业务错误 (500)
    #[error("内部服务错误: {0}")]
    Internal(String),
}

/// 将 `ApiError` 转换为 axum 的 HTTP 响应
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            ApiError::GatewayTimeout(msg) => (StatusCode::GATEWAY_TIMEOUT, msg.clone()),
            ApiError::Internal(msg) => {
                // 内部错误只记录日志，不向客户端透传细节
                tracing::error!("内部服务错误: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ApiErrorResponse::from_msg(message));
        (status, body).into_response()
    }
}

/// 从 `ForecastError` 转换，消息直接展示给页面用户
impl From<ForecastError> for ApiError {
    fn from(err: ForecastError) -> Self {
        match err {
            ForecastError::InvalidSymbol(_) => {
                ApiError::BadRequest("Please enter a stock symbol.".to_string())
            }
            ForecastError::NoData(symbol) => {
                ApiError::NotFound(format!("No price history found for \"{}\".", symbol))
            }
            ForecastError::Timeout { symbol, secs } => ApiError::GatewayTimeout(format!(
                "Market data for \"{}\" did not arrive within {}s.",
                symbol, secs
            )),
            ForecastError::Upstream(e) => {
                ApiError::BadGateway(format!("Market data provider is unavailable: {}", e))
            }
            ForecastError::Model(e) => {
                ApiError::Unprocessable(format!("Unable to build a forecast: {}", e))
            }
            ForecastError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}
