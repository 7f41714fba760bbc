//! Incremental indicators and the mapping onto bounded category scores.

pub mod bollinger;
pub mod ema;
pub mod rsi;
pub mod volume;

use serde::{Deserialize, Serialize};

use aq_signals::{Provenance, Score, TechnicalScores};

use crate::candle::PriceSeries;
use crate::config::IndicatorConfig;

/// Ring buffer for rolling-window statistics.
#[derive(Debug, Clone)]
pub struct RingBuf {
    buf: Vec<f64>,
    pos: usize,
    len: usize,
}

impl RingBuf {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0.0; capacity.max(1)],
            pos: 0,
            len: 0,
        }
    }

    pub fn push(&mut self, value: f64) {
        self.buf[self.pos] = value;
        self.pos = (self.pos + 1) % self.buf.len();
        if self.len < self.buf.len() {
            self.len += 1;
        }
    }

    pub fn full(&self) -> bool {
        self.len == self.buf.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn mean(&self) -> f64 {
        if self.len == 0 {
            return 0.0;
        }
        self.buf[..self.len].iter().sum::<f64>() / self.len as f64
    }

    /// Population standard deviation over the held values.
    pub fn std_pop(&self) -> f64 {
        if self.len == 0 {
            return 0.0;
        }
        let mean = self.mean();
        let var = self.buf[..self.len]
            .iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / self.len as f64;
        var.sqrt()
    }
}

/// Raw indicator values behind the category scores, for reporting and
/// stop sizing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawIndicators {
    pub rsi: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub bb_upper: f64,
    pub bb_middle: f64,
    pub bb_lower: f64,
    /// (upper − lower) / middle for the latest bar.
    pub band_width: f64,
    /// Rolling average of `band_width` since the bands warmed.
    pub band_width_avg: f64,
    /// Short volume SMA over long volume SMA.
    pub volume_ratio: f64,
    pub bar_count: usize,
}

/// Category scores plus the raw values they were derived from.
///
/// Every category is always present: a category whose lookback is not
/// satisfied carries the neutral sentinel instead of being absent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub scores: TechnicalScores,
    pub raw: RawIndicators,
}

impl IndicatorSet {
    /// All categories neutral; used when no series could be fetched.
    pub fn neutral() -> Self {
        Self {
            scores: TechnicalScores::neutral(),
            raw: RawIndicators {
                rsi: 50.0,
                ema_fast: 0.0,
                ema_slow: 0.0,
                bb_upper: 0.0,
                bb_middle: 0.0,
                bb_lower: 0.0,
                band_width: 0.0,
                band_width_avg: 0.0,
                volume_ratio: 1.0,
                bar_count: 0,
            },
        }
    }

    /// Band width for stop sizing, only when volatility was measured.
    pub fn measured_band_width(&self) -> Option<f64> {
        if self.scores.volatility.is_measured() {
            Some(self.raw.band_width)
        } else {
            None
        }
    }
}

/// Map an RSI value onto [-1, 1].
///
/// Inside the oversold/overbought band the map is linear around the 50
/// midpoint; beyond a band edge the reading turns contrarian, scaled by
/// the distance into the extreme: RSI 75 with a 70 band scores −5/30.
pub fn rsi_to_score(rsi: f64, cfg: &IndicatorConfig) -> f64 {
    let score = if rsi >= cfg.rsi_overbought {
        -((rsi - cfg.rsi_overbought) / (100.0 - cfg.rsi_overbought))
    } else if rsi <= cfg.rsi_oversold {
        (cfg.rsi_oversold - rsi) / cfg.rsi_oversold
    } else {
        (rsi - 50.0) / 50.0
    };
    score.clamp(-1.0, 1.0)
}

/// Compute the full indicator set for a series.
///
/// Pure function of its inputs. Indicators whose lookback exceeds the
/// series length yield the neutral sentinel rather than failing the
/// whole computation.
pub fn compute_indicators(series: &PriceSeries, cfg: &IndicatorConfig) -> IndicatorSet {
    let mut ema_fast = ema::Ema::new(cfg.ema_fast_window);
    let mut ema_slow = ema::Ema::new(cfg.ema_slow_window);
    let mut rsi = rsi::Rsi::new(cfg.rsi_window);
    let mut bb = bollinger::Bollinger::new(cfg.bb_window);
    let mut width_avg = RingBuf::new(cfg.bb_width_avg_window);
    let mut volume = volume::VolumeSmaPair::new(cfg.vol_short_window, cfg.vol_long_window);

    let mut bands = bollinger::Bands {
        upper: 0.0,
        middle: 0.0,
        lower: 0.0,
    };
    for candle in series.candles() {
        ema_fast.update(candle.c);
        ema_slow.update(candle.c);
        rsi.update(candle.c);
        bands = bb.update(candle.c);
        if bb.is_warm() {
            width_avg.push(bands.width());
        }
        volume.update(candle.v);
    }

    let trend = if ema_slow.is_warm() && ema_slow.value > 0.0 {
        let separation = (ema_fast.value - ema_slow.value) / ema_slow.value;
        Score::bounded(separation / cfg.trend_full_scale, Provenance::Measured)
    } else {
        Score::neutral()
    };

    let momentum = if rsi.is_warm() {
        Score::bounded(rsi_to_score(rsi.value, cfg), Provenance::Measured)
    } else {
        Score::neutral()
    };

    let band_width = bands.width();
    let band_width_avg = width_avg.mean();
    let volatility = if bb.is_warm() {
        if band_width_avg > 0.0 {
            Score::bounded(1.0 - band_width / band_width_avg, Provenance::Measured)
        } else {
            // Flat market: no expansion signal either way.
            Score::bounded(0.0, Provenance::Measured)
        }
    } else {
        Score::neutral()
    };

    let volume_ratio = volume.ratio();
    let volume_confirmation = if volume.is_warm() && ema_slow.is_warm() {
        let direction = match ema_fast.value.partial_cmp(&ema_slow.value) {
            Some(std::cmp::Ordering::Greater) => 1.0,
            Some(std::cmp::Ordering::Less) => -1.0,
            _ => 0.0,
        };
        let delta = ((volume_ratio - 1.0) / cfg.volume_full_scale).clamp(-1.0, 1.0);
        Score::bounded(direction * delta, Provenance::Measured)
    } else {
        Score::neutral()
    };

    tracing::debug!(
        bars = series.len(),
        trend = trend.value,
        momentum = momentum.value,
        volatility = volatility.value,
        volume = volume_confirmation.value,
        "indicator scores"
    );

    IndicatorSet {
        scores: TechnicalScores {
            trend,
            momentum,
            volatility,
            volume_confirmation,
        },
        raw: RawIndicators {
            rsi: rsi.value,
            ema_fast: ema_fast.value,
            ema_slow: ema_slow.value,
            bb_upper: bands.upper,
            bb_middle: bands.middle,
            bb_lower: bands.lower,
            band_width,
            band_width_avg,
            volume_ratio,
            bar_count: series.len(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candle::Candle;

    fn series(closes_volumes: &[(f64, f64)]) -> PriceSeries {
        let candles = closes_volumes
            .iter()
            .enumerate()
            .map(|(i, (c, v))| Candle {
                t: i as i64 * 60_000,
                o: *c,
                h: c * 1.01,
                l: c * 0.99,
                c: *c,
                v: *v,
            })
            .collect();
        PriceSeries::new(candles).unwrap()
    }

    fn flat_volume(closes: &[f64]) -> PriceSeries {
        series(&closes.iter().map(|c| (*c, 1_000.0)).collect::<Vec<_>>())
    }

    #[test]
    fn short_series_degrades_every_category_to_neutral() {
        let cfg = IndicatorConfig::default();
        let set = compute_indicators(&flat_volume(&[100.0, 101.0, 102.0]), &cfg);
        for score in [
            set.scores.trend,
            set.scores.momentum,
            set.scores.volatility,
            set.scores.volume_confirmation,
        ] {
            assert_eq!(score.value, 0.0);
            assert_eq!(score.provenance, Provenance::DefaultNeutral);
        }
        assert!(set.measured_band_width().is_none());
    }

    #[test]
    fn empty_series_is_fully_neutral() {
        let cfg = IndicatorConfig::default();
        let set = compute_indicators(&PriceSeries::empty(), &cfg);
        assert_eq!(set.scores, TechnicalScores::neutral());
    }

    #[test]
    fn lookbacks_warm_independently() {
        // 16 bars: RSI(14) needs 15 closes and is warm, EMA(26) is not.
        let cfg = IndicatorConfig::default();
        let closes: Vec<f64> = (0..16).map(|i| 100.0 + i as f64).collect();
        let set = compute_indicators(&flat_volume(&closes), &cfg);
        assert!(set.scores.momentum.is_measured());
        assert!(!set.scores.trend.is_measured());
        assert!(!set.scores.volume_confirmation.is_measured());
    }

    #[test]
    fn sustained_uptrend_scores_bullish_trend_and_overbought_momentum() {
        let cfg = IndicatorConfig::default();
        let closes: Vec<f64> = (0..60).map(|i| 100.0 * 1.01f64.powi(i)).collect();
        let set = compute_indicators(&flat_volume(&closes), &cfg);

        assert!(set.scores.trend.is_measured());
        assert!(set.scores.trend.value > 0.5);

        // A one-way march pins RSI at 100, which reads contrarian-bearish.
        assert!(set.scores.momentum.is_measured());
        assert_eq!(set.raw.rsi, 100.0);
        assert_eq!(set.scores.momentum.value, -1.0);
    }

    #[test]
    fn rising_volume_in_uptrend_confirms() {
        let cfg = IndicatorConfig::default();
        let data: Vec<(f64, f64)> = (0..40)
            .map(|i| (100.0 + i as f64, 1_000.0 + 200.0 * i as f64))
            .collect();
        let set = compute_indicators(&series(&data), &cfg);
        assert!(set.scores.volume_confirmation.is_measured());
        assert!(set.scores.volume_confirmation.value > 0.0);
    }

    #[test]
    fn fading_volume_in_uptrend_diverges() {
        let cfg = IndicatorConfig::default();
        let data: Vec<(f64, f64)> = (0..40)
            .map(|i| (100.0 + i as f64, 10_000.0 - 200.0 * i as f64))
            .collect();
        let set = compute_indicators(&series(&data), &cfg);
        assert!(set.scores.volume_confirmation.is_measured());
        assert!(set.scores.volume_confirmation.value < 0.0);
    }

    #[test]
    fn compute_is_deterministic() {
        let cfg = IndicatorConfig::default();
        let closes: Vec<f64> = (0..50)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0)
            .collect();
        let s = flat_volume(&closes);
        assert_eq!(compute_indicators(&s, &cfg), compute_indicators(&s, &cfg));
    }

    #[test]
    fn rsi_mapping_is_contrarian_at_extremes() {
        let cfg = IndicatorConfig::default();
        assert!((rsi_to_score(75.0, &cfg) + 5.0 / 30.0).abs() < 1e-12);
        assert!((rsi_to_score(25.0, &cfg) - 5.0 / 30.0).abs() < 1e-12);
        assert_eq!(rsi_to_score(100.0, &cfg), -1.0);
        assert_eq!(rsi_to_score(0.0, &cfg), 1.0);
        // Linear around the midpoint inside the band.
        assert!((rsi_to_score(60.0, &cfg) - 0.2).abs() < 1e-12);
        assert!((rsi_to_score(40.0, &cfg) + 0.2).abs() < 1e-12);
        assert_eq!(rsi_to_score(50.0, &cfg), 0.0);
    }
}
