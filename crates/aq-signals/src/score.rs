use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a score came from.
///
/// `DefaultNeutral` marks an input that was absent, stale or not yet warm
/// and was substituted with 0. Downstream fusion discounts such scores so
/// a defaulted input never carries the weight of a real observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    Measured,
    DefaultNeutral,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Measured => write!(f, "measured"),
            Provenance::DefaultNeutral => write!(f, "default-neutral"),
        }
    }
}

/// Bounded scalar in [-1, 1] with provenance.
///
/// Negative is bearish, positive is bullish. `clipped` records that the
/// raw value fell outside the range and was clipped rather than silently
/// renormalized; fusion surfaces this in the rationale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub value: f64,
    pub provenance: Provenance,
    #[serde(default)]
    pub clipped: bool,
}

impl Score {
    /// The neutral sentinel: 0.0, provenance `default-neutral`.
    pub fn neutral() -> Self {
        Self {
            value: 0.0,
            provenance: Provenance::DefaultNeutral,
            clipped: false,
        }
    }

    /// A measured score, clipped into [-1, 1] if necessary.
    pub fn measured(value: f64) -> Self {
        Self::bounded(value, Provenance::Measured)
    }

    /// Clip `value` into [-1, 1], recording whether clipping occurred.
    pub fn bounded(value: f64, provenance: Provenance) -> Self {
        let clamped = value.clamp(-1.0, 1.0);
        Self {
            value: clamped,
            provenance,
            clipped: clamped != value,
        }
    }

    pub fn is_measured(&self) -> bool {
        self.provenance == Provenance::Measured
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_sentinel_is_zero_and_defaulted() {
        let s = Score::neutral();
        assert_eq!(s.value, 0.0);
        assert_eq!(s.provenance, Provenance::DefaultNeutral);
        assert!(!s.clipped);
        assert!(!s.is_measured());
    }

    #[test]
    fn bounded_clips_and_flags() {
        let s = Score::measured(1.7);
        assert_eq!(s.value, 1.0);
        assert!(s.clipped);

        let s = Score::measured(-2.0);
        assert_eq!(s.value, -1.0);
        assert!(s.clipped);

        let s = Score::measured(0.25);
        assert_eq!(s.value, 0.25);
        assert!(!s.clipped);
    }
}
