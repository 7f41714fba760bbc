//! Price series, incremental technical indicators and the indicator
//! engine that maps them onto bounded category scores.

pub mod candle;
pub mod config;
pub mod indicators;

pub use candle::{Candle, PriceSeries, SeriesError};
pub use config::IndicatorConfig;
pub use indicators::{compute_indicators, IndicatorSet, RawIndicators};
