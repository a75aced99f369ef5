//! # `blackgem-api` - HTTP 网关
//!
//! 本 crate 是 BlackGem 股价预测看板的 HTTP 服务入口。
//! 使用 `axum` 构建路由与控制器，通过 `utoipa` 自动生成 OpenAPI 3.0 Swagger 文档。
//!
//! ## 架构职责
//! - 返回看板页面 (输入框、按钮、图表容器)
//! - 接收预测请求并调用下层 `ForecastManager`
//! - 将领域模型转换为 DTO 返回给前端
//! - 挂载静态资源目录

pub mod error;
pub mod routes;
pub mod server;
pub mod types;
