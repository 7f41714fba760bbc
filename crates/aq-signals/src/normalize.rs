//! Sentiment and on-chain input normalization.
//!
//! Raw external inputs arrive as a single scalar, a small map of
//! sub-metrics, or not at all. Absent or unusable input degrades to the
//! neutral sentinel; normalization never fails a request.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::score::Score;

/// Raw external input: one scalar or a map of named sub-metrics.
///
/// Sub-metric values are expected in [-1, 1]; out-of-range results are
/// clipped after combination and the clip is reported, never hidden.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawMetricInput {
    Scalar(f64),
    Metrics(BTreeMap<String, f64>),
}

pub type RawSentimentInput = RawMetricInput;
pub type RawOnChainInput = RawMetricInput;

/// Sentiment sub-metric weights. Sum to 1.
///
/// `social` folds the per-network sources together, `news` covers press
/// coverage, `chart_pattern` is the opaque score from visual chart
/// analysis.
pub const SENTIMENT_WEIGHTS: &[(&str, f64)] = &[
    ("social", 0.45),
    ("news", 0.35),
    ("chart_pattern", 0.20),
];

/// On-chain sub-metric weights. Sum to 1.
///
/// `exchange_flow` is signed net flow (outflow positive), `whale_activity`
/// is accumulation (+) vs distribution (-), `active_addresses` is growth
/// relative to trend.
pub const ONCHAIN_WEIGHTS: &[(&str, f64)] = &[
    ("exchange_flow", 0.40),
    ("whale_activity", 0.35),
    ("active_addresses", 0.25),
];

pub fn normalize_sentiment(input: Option<&RawSentimentInput>) -> Score {
    normalize(input, SENTIMENT_WEIGHTS)
}

pub fn normalize_onchain(input: Option<&RawOnChainInput>) -> Score {
    normalize(input, ONCHAIN_WEIGHTS)
}

/// Map a raw input to a bounded score against a fixed weight table.
///
/// Sub-metrics are combined as a weighted average over the keys actually
/// present, dividing by the sum of the present weights; unknown keys and
/// non-finite values are ignored. An empty or fully unusable input yields
/// the neutral sentinel.
fn normalize(input: Option<&RawMetricInput>, weights: &[(&str, f64)]) -> Score {
    let input = match input {
        Some(input) => input,
        None => return Score::neutral(),
    };

    match input {
        RawMetricInput::Scalar(v) => {
            if !v.is_finite() {
                return Score::neutral();
            }
            Score::measured(*v)
        }
        RawMetricInput::Metrics(map) => {
            let mut weighted_sum = 0.0;
            let mut weight_sum = 0.0;
            for (name, weight) in weights {
                if let Some(v) = map.get(*name) {
                    if v.is_finite() {
                        weighted_sum += v * weight;
                        weight_sum += weight;
                    }
                }
            }
            if weight_sum == 0.0 {
                return Score::neutral();
            }
            Score::measured(weighted_sum / weight_sum)
        }
    }
}
