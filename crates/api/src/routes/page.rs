//! # 看板页面
//!
//! 页面模板在编译期嵌入，请求时替换占位符。
//! 图表数据由页面脚本通过 `/api/v1/forecast` 异步获取。

use axum::extract::State;
use axum::response::Html;
use blackgem_core::config::ThemeConfig;

use crate::server::AppState;

const TEMPLATE: &str = include_str!("../../templates/dashboard.html");

pub const PAGE_TITLE: &str = "BlackGem AI Forecast";
pub const PAGE_HEADING: &str = "BlackGem AI Stock Forecast";

/// 转义 HTML 特殊字符，配置值可能来自环境变量
fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// # Summary
/// 用默认代码、预测天数与配色渲染页面。
///
/// # Arguments
/// * `default_symbol` - 输入框的初始值。
/// * `horizon_days` - 副标题中的预测天数。
/// * `theme` - 页面配色与字体。
pub fn render_dashboard(default_symbol: &str, horizon_days: usize, theme: &ThemeConfig) -> String {
    let subtitle = format!(
        "Stock price forecasting chart for the next {} days.",
        horizon_days
    );
    let replacements = [
        ("{{title}}", PAGE_TITLE.to_string()),
        ("{{heading}}", PAGE_HEADING.to_string()),
        ("{{subtitle}}", subtitle),
        ("{{default_symbol}}", default_symbol.to_string()),
        ("{{background}}", theme.background.clone()),
        ("{{text_color}}", theme.text.clone()),
        ("{{font_color}}", theme.font_color.clone()),
        ("{{font_family}}", theme.font_family.clone()),
    ];

    replacements
        .iter()
        .fold(TEMPLATE.to_string(), |page, (key, value)| {
            page.replace(key, &escape_html(value))
        })
}

/// 看板首页
#[utoipa::path(
    get,
    path = "/",
    tag = "页面 (Page)",
    responses(
        (status = 200, description = "看板 HTML", content_type = "text/html", body = String)
    )
)]
pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_dashboard(
        state.forecast_manager.default_symbol(),
        state.forecast_manager.horizon_days(),
        &state.config.theme,
    ))
}
