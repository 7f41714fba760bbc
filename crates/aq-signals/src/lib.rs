//! Score types, input normalizers and signal fusion.
//!
//! Everything in this crate is pure: the same inputs always produce the
//! same outputs, which is what makes the fusion rules testable in
//! isolation from market-data plumbing.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod fusion;
pub mod normalize;
pub mod score;

pub use fusion::{fuse, FusionConfig, TechnicalScores};
pub use normalize::{
    normalize_onchain, normalize_sentiment, RawMetricInput, RawOnChainInput, RawSentimentInput,
};
pub use score::{Provenance, Score};

/// Directional trading recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalAction {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for SignalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalAction::Buy => write!(f, "BUY"),
            SignalAction::Sell => write!(f, "SELL"),
            SignalAction::Hold => write!(f, "HOLD"),
        }
    }
}

/// Fused recommendation with confidence and an ordered explanation.
///
/// `rationale` lists every contributing input in descending absolute
/// contribution, followed by clip/default/marginal notices, so a degraded
/// result is always distinguishable from a fully-informed one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingSignal {
    pub action: SignalAction,
    /// In [0, 1]; exactly 0 when the composite score is 0.
    pub confidence: f64,
    pub rationale: Vec<String>,
    pub generated_at: DateTime<Utc>,
}
