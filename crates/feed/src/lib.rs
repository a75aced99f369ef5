//! # `blackgem-feed` - 行情数据源
//!
//! `MarketDataProvider` 的具体实现。目前只有 Yahoo Finance v8 chart 接口。

pub mod yahoo;
