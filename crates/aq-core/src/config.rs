//! Indicator windows and score-mapping constants.

use serde::{Deserialize, Serialize};

/// Windows and scale factors for the indicator engine.
///
/// Every constant that shapes a category score lives here so the mappings
/// stay independently testable and tunable.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub ema_fast_window: usize,
    pub ema_slow_window: usize,
    pub rsi_window: usize,
    pub bb_window: usize,
    /// Rolling average window for the band-width baseline.
    pub bb_width_avg_window: usize,
    pub vol_short_window: usize,
    pub vol_long_window: usize,

    /// EMA separation (as a fraction of the slow EMA) that saturates the
    /// trend score at ±1.
    pub trend_full_scale: f64,
    /// Volume SMA ratio excess that saturates the volume-confirmation
    /// score at ±1.
    pub volume_full_scale: f64,
    /// RSI at or above this reads as overbought (bearish).
    pub rsi_overbought: f64,
    /// RSI at or below this reads as oversold (bullish).
    pub rsi_oversold: f64,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            ema_fast_window: 12,
            ema_slow_window: 26,
            rsi_window: 14,
            bb_window: 20,
            bb_width_avg_window: 20,
            vol_short_window: 5,
            vol_long_window: 20,
            trend_full_scale: 0.02,
            volume_full_scale: 0.5,
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
        }
    }
}

impl IndicatorConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.ema_fast_window == 0 || self.ema_slow_window == 0 {
            return Err("EMA windows must be positive".to_string());
        }
        if self.ema_fast_window >= self.ema_slow_window {
            return Err(format!(
                "ema_fast_window {} must be below ema_slow_window {}",
                self.ema_fast_window, self.ema_slow_window
            ));
        }
        if self.rsi_window == 0 || self.bb_window == 0 {
            return Err("RSI and Bollinger windows must be positive".to_string());
        }
        if self.vol_short_window == 0 || self.vol_short_window >= self.vol_long_window {
            return Err(format!(
                "vol_short_window {} must be positive and below vol_long_window {}",
                self.vol_short_window, self.vol_long_window
            ));
        }
        if self.trend_full_scale <= 0.0 || self.volume_full_scale <= 0.0 {
            return Err("score full-scale factors must be positive".to_string());
        }
        if !(self.rsi_oversold < 50.0 && self.rsi_overbought > 50.0
            && self.rsi_overbought < 100.0 && self.rsi_oversold > 0.0)
        {
            return Err(format!(
                "RSI bands ({}, {}) must straddle the midpoint inside (0, 100)",
                self.rsi_oversold, self.rsi_overbought
            ));
        }
        Ok(())
    }
}
