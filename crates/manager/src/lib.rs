//! # `blackgem-manager` - 应用服务层
//!
//! 预测处理器：解析代码 -> 拉取行情 -> 拟合 -> 截断 -> 出图。

pub mod chart;
pub mod forecast;
