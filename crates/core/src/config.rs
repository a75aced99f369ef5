use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 全局应用配置
///
/// 所有字段都带有默认值，配置文件或环境变量只需覆盖需要修改的部分。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub market: MarketConfig,
    pub forecast: ForecastConfig,
    pub theme: ThemeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    // `/assets/<path>` 直接映射到该目录
    pub assets_dir: String,
}

impl ServerConfig {
    /// 拼接监听地址，如 `127.0.0.1:8050`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8050,
            assets_dir: "assets".to_string(),
        }
    }
}

/// 行情数据源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    // Yahoo Finance 接口根地址，测试时可指向本地桩服务
    pub base_url: String,
    // 单次历史行情请求的超时 (秒)
    pub timeout_secs: u64,
    // 历史数据起始日期
    pub history_start: NaiveDate,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com".to_string(),
            timeout_secs: 10,
            history_start: NaiveDate::from_ymd_opt(2015, 1, 1).unwrap_or_default(),
        }
    }
}

/// 预测流程配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    // 用户尚未提交前 (首屏) 使用的证券代码
    pub default_symbol: String,
    // 预测天数
    pub horizon_days: usize,
    // 不确定区间覆盖率
    pub interval_width: f64,
    // 潜在趋势拐点数量
    pub changepoints: usize,
    // None 表示按历史跨度自动判断
    pub yearly_seasonality: Option<bool>,
    pub weekly_seasonality: Option<bool>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            default_symbol: "COIN".to_string(),
            horizon_days: 90,
            interval_width: 0.8,
            changepoints: 25,
            yearly_seasonality: None,
            weekly_seasonality: None,
        }
    }
}

/// 图表与页面配色
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub background: String,
    pub text: String,
    pub font_color: String,
    pub font_family: String,
    pub font_size: usize,
    pub history_color: String,
    pub forecast_color: String,
    pub band_color: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            background: "#191414".to_string(),
            text: "#466ec3".to_string(),
            font_color: "#ffffff".to_string(),
            font_family: "Sulphur Point, sans-serif".to_string(),
            font_size: 18,
            history_color: "#80ed99".to_string(),
            forecast_color: "#fb8500".to_string(),
            band_color: "#2f2f2f".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8050);
        assert_eq!(config.server.bind_addr(), "127.0.0.1:8050");
        assert_eq!(config.server.assets_dir, "assets");
        assert_eq!(config.forecast.default_symbol, "COIN");
        assert_eq!(config.forecast.horizon_days, 90);
        assert_eq!(
            config.market.history_start,
            NaiveDate::from_ymd_opt(2015, 1, 1).unwrap()
        );
        assert_eq!(config.theme.background, "#191414");
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let json = r#"{ "server": { "port": 9000 }, "forecast": { "default_symbol": "MSFT" } }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.forecast.default_symbol, "MSFT");
        assert_eq!(config.forecast.horizon_days, 90);
        assert_eq!(config.theme.font_size, 18);
    }
}
