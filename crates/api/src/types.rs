//! # DTO (Data Transfer Object) 层
//!
//! 将内部领域模型转化为面向前端 JSON 输出的轻量结构体。
//! 所有 DTO 必须派生 `utoipa::ToSchema` 以自动进入 Swagger 文档。

use blackgem_manager::forecast::ForecastOutcome;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

// ============================================================
//  预测相关 DTO
// ============================================================

/// 预测请求参数
///
/// `n_clicks` 沿用页面按钮的点击计数：0 表示首屏，使用默认代码。
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ForecastQuery {
    /// 按钮点击次数，缺省为 0
    #[param(example = 1)]
    pub n_clicks: Option<u64>,
    /// 输入框中的证券代码，原样使用
    #[param(example = "AAPL")]
    pub symbol: Option<String>,
}

/// 预测结果 DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ForecastResponse {
    /// 实际使用的证券代码
    #[schema(example = "COIN")]
    pub symbol: String,
    /// Plotly figure (`data` 四条折线 + `layout`)，可直接传给 `Plotly.react`
    #[schema(value_type = Object)]
    pub figure: serde_json::Value,
    /// 历史收盘价数量
    #[schema(example = 2350)]
    pub history_points: usize,
    /// 展示的预测点数量 (不早于当前时刻)
    #[schema(example = 89)]
    pub forecast_points: usize,
    /// 预测天数
    #[schema(example = 90)]
    pub horizon_days: usize,
    /// 模型预测的最后一天
    #[schema(example = "2026-01-17T00:00:00")]
    pub forecast_end: Option<String>,
    /// 生成时间 (ISO 8601)
    #[schema(example = "2025-10-19T08:00:00Z")]
    pub generated_at: String,
}

impl From<ForecastOutcome> for ForecastResponse {
    fn from(o: ForecastOutcome) -> Self {
        Self {
            symbol: o.symbol,
            figure: o.figure,
            history_points: o.history_points,
            forecast_points: o.forecast_points,
            horizon_days: o.horizon_days,
            forecast_end: o
                .forecast_end
                .map(|d| d.format("%Y-%m-%dT%H:%M:%S").to_string()),
            generated_at: o.generated_at.to_rfc3339(),
        }
    }
}

// ============================================================
//  通用响应 DTO
// ============================================================

/// 统一 API 响应包装器
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T: Serialize + ToSchema> {
    /// 是否成功
    pub success: bool,
    /// 数据载荷 (成功时)
    pub data: Option<T>,
    /// 错误信息 (失败时)
    pub error: Option<String>,
}

impl<T: Serialize + ToSchema> ApiResponse<T> {
    /// 构建成功响应
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// 构建失败响应 (不含泛型载荷)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 固定为 false
    pub success: bool,
    /// 错误描述信息
    pub error: String,
}

impl ApiErrorResponse {
    /// 从错误信息构建
    pub fn from_msg(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: msg.into(),
        }
    }
}
