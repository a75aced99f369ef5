use serde::{Deserialize, Serialize};

pub mod time;

/// # Summary
/// 证券标的实体，代表用户请求预测的股票或资产。
///
/// # Invariants
/// - `symbol` 原样透传给行情提供者，由提供者负责校验其合法性。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    // 股票代码 (例如: COIN, AAPL)
    pub symbol: String,
}

impl Stock {
    /// 仅以代码构建证券实体
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
        }
    }
}

/// # Summary
/// 交易时间周期枚举，定义 K 线的时间跨度。
///
/// # Invariants
/// - 预测流程只使用 `Day1`，其余周期供行情接口复用。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TimeFrame {
    // 1分钟
    Minute1,
    // 5分钟
    Minute5,
    // 1小时
    Hour1,
    // 1日
    Day1,
}

impl std::fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeFrame::Minute1 => write!(f, "1m"),
            TimeFrame::Minute5 => write!(f, "5m"),
            TimeFrame::Hour1 => write!(f, "1h"),
            TimeFrame::Day1 => write!(f, "1d"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeframe_display() {
        assert_eq!(TimeFrame::Minute5.to_string(), "5m");
        assert_eq!(TimeFrame::Day1.to_string(), "1d");
    }
}
