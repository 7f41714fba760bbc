use std::fmt;

use serde::{Deserialize, Serialize};

/// OHLCV bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Open time, ms since epoch.
    pub t: i64,
    pub o: f64,
    pub h: f64,
    pub l: f64,
    pub c: f64,
    pub v: f64,
}

/// Validation failure while constructing a [`PriceSeries`].
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesError {
    /// Timestamps must be strictly ascending with no duplicates.
    OutOfOrder { index: usize },
    /// Close prices must be finite and positive.
    BadClose { index: usize, close: f64 },
    /// Volume must be finite and non-negative.
    BadVolume { index: usize, volume: f64 },
}

impl fmt::Display for SeriesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfOrder { index } => {
                write!(f, "candle {index} is not strictly after its predecessor")
            }
            Self::BadClose { index, close } => {
                write!(f, "candle {index} has unusable close {close}")
            }
            Self::BadVolume { index, volume } => {
                write!(f, "candle {index} has unusable volume {volume}")
            }
        }
    }
}

impl std::error::Error for SeriesError {}

/// Ordered, validated price/volume series. Read-only after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Candle>", into = "Vec<Candle>")]
pub struct PriceSeries {
    candles: Vec<Candle>,
}

impl PriceSeries {
    /// Validate and take ownership of `candles`.
    pub fn new(candles: Vec<Candle>) -> Result<Self, SeriesError> {
        for (i, candle) in candles.iter().enumerate() {
            if i > 0 && candle.t <= candles[i - 1].t {
                return Err(SeriesError::OutOfOrder { index: i });
            }
            if !candle.c.is_finite() || candle.c <= 0.0 {
                return Err(SeriesError::BadClose {
                    index: i,
                    close: candle.c,
                });
            }
            if !candle.v.is_finite() || candle.v < 0.0 {
                return Err(SeriesError::BadVolume {
                    index: i,
                    volume: candle.v,
                });
            }
        }
        Ok(Self { candles })
    }

    /// A series with no bars: every indicator degrades to neutral.
    pub fn empty() -> Self {
        Self { candles: Vec::new() }
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }
}

impl TryFrom<Vec<Candle>> for PriceSeries {
    type Error = SeriesError;

    fn try_from(candles: Vec<Candle>) -> Result<Self, Self::Error> {
        Self::new(candles)
    }
}

impl From<PriceSeries> for Vec<Candle> {
    fn from(series: PriceSeries) -> Self {
        series.candles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(t: i64, close: f64) -> Candle {
        Candle {
            t,
            o: close,
            h: close + 1.0,
            l: close - 1.0,
            c: close,
            v: 1_000.0,
        }
    }

    #[test]
    fn accepts_ascending_series() {
        let series =
            PriceSeries::new(vec![candle(0, 100.0), candle(1, 101.0), candle(2, 99.5)]).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.last().unwrap().c, 99.5);
    }

    #[test]
    fn rejects_duplicate_and_backwards_timestamps() {
        let err = PriceSeries::new(vec![candle(5, 100.0), candle(5, 101.0)]).unwrap_err();
        assert_eq!(err, SeriesError::OutOfOrder { index: 1 });

        let err = PriceSeries::new(vec![candle(5, 100.0), candle(3, 101.0)]).unwrap_err();
        assert_eq!(err, SeriesError::OutOfOrder { index: 1 });
    }

    #[test]
    fn rejects_non_positive_or_non_finite_close() {
        let err = PriceSeries::new(vec![candle(0, 0.0)]).unwrap_err();
        assert!(matches!(err, SeriesError::BadClose { index: 0, .. }));

        let err = PriceSeries::new(vec![candle(0, f64::NAN)]).unwrap_err();
        assert!(matches!(err, SeriesError::BadClose { index: 0, .. }));
    }

    #[test]
    fn deserialization_goes_through_validation() {
        let parsed: Result<PriceSeries, _> = serde_json::from_str(
            r#"[{"t":1,"o":1.0,"h":1.0,"l":1.0,"c":1.0,"v":1.0},
                {"t":1,"o":1.0,"h":1.0,"l":1.0,"c":1.0,"v":1.0}]"#,
        );
        assert!(parsed.is_err());
    }
}
