use blackgem_core::config::ThemeConfig;
use blackgem_core::forecast::entity::ForecastPoint;
use blackgem_core::market::entity::PriceSeries;
use chrono::NaiveDateTime;
use plotly::common::{Fill, Font, Line, Mode, Title};
use plotly::{Layout, Plot, Scatter};

pub const HISTORY_TRACE: &str = "Data values";
pub const FORECAST_TRACE: &str = "Forecast";
pub const UPPER_TRACE: &str = "Higher uncertainty interval";
pub const LOWER_TRACE: &str = "Lower uncertainty interval";

/// 不确定带：与上一条折线之间填充
fn band(
    name: &str,
    x: Vec<NaiveDateTime>,
    y: Vec<f64>,
    color: &str,
) -> Box<Scatter<NaiveDateTime, f64>> {
    Scatter::new(x, y)
        .name(name)
        .mode(Mode::Lines)
        .fill(Fill::ToNextY)
        .line(Line::new().color(color.to_string()))
}

/// # Summary
/// 组装历史 + 预测的四条折线图。
///
/// # Logic
/// 1. 历史收盘价一条。
/// 2. 预测均值一条。
/// 3. 上界、下界各一条，均以 `tonexty` 填充形成不确定带。
///
/// # Arguments
/// * `symbol`: 用于标题的证券代码。
/// * `history`: 历史收盘价。
/// * `forecast`: 已截断的预测点。
/// * `theme`: 配色。
///
/// # Returns
/// 返回固定包含 4 条折线的 Plotly 图。
pub fn build_chart(
    symbol: &str,
    history: &PriceSeries,
    forecast: &[ForecastPoint],
    theme: &ThemeConfig,
) -> Plot {
    let forecast_x: Vec<NaiveDateTime> = forecast.iter().map(|p| p.ds).collect();

    let history_trace = Scatter::new(
        history.points().iter().map(|p| p.ds).collect(),
        history.points().iter().map(|p| p.y).collect(),
    )
    .name(HISTORY_TRACE)
    .line(Line::new().color(theme.history_color.clone()));

    let forecast_trace = Scatter::new(
        forecast_x.clone(),
        forecast.iter().map(|p| p.yhat).collect(),
    )
    .name(FORECAST_TRACE)
    .mode(Mode::Lines)
    .line(Line::new().color(theme.forecast_color.clone()));

    let title = format!("{} closing value", symbol);
    let layout = Layout::new()
        .title(Title::with_text(title.as_str()))
        .plot_background_color(theme.background.clone())
        .paper_background_color(theme.background.clone())
        .font(
            Font::new()
                .color(theme.font_color.clone())
                .size(theme.font_size)
                .family(theme.font_family.as_str()),
        );

    let mut plot = Plot::new();
    plot.add_trace(history_trace);
    plot.add_trace(forecast_trace);
    plot.add_trace(band(
        UPPER_TRACE,
        forecast_x.clone(),
        forecast.iter().map(|p| p.yhat_upper).collect(),
        &theme.band_color,
    ));
    plot.add_trace(band(
        LOWER_TRACE,
        forecast_x,
        forecast.iter().map(|p| p.yhat_lower).collect(),
        &theme.band_color,
    ));
    plot.set_layout(layout);
    plot
}
