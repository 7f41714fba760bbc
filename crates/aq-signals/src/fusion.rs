//! Composite signal fusion.
//!
//! Folds the four technical category scores into one technical score,
//! combines it with sentiment and on-chain scores under fixed weights and
//! provenance discounts, and maps the composite onto BUY / SELL / HOLD.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::score::{Provenance, Score};
use crate::{SignalAction, TradingSignal};

/// The four technical category scores, one per indicator family.
///
/// A category that could not be computed (insufficient lookback, failed
/// series fetch) carries the neutral sentinel, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TechnicalScores {
    pub trend: Score,
    pub momentum: Score,
    pub volatility: Score,
    pub volume_confirmation: Score,
}

impl TechnicalScores {
    pub fn neutral() -> Self {
        Self {
            trend: Score::neutral(),
            momentum: Score::neutral(),
            volatility: Score::neutral(),
            volume_confirmation: Score::neutral(),
        }
    }

    fn categories(&self) -> [(&'static str, Score); 4] {
        [
            ("trend", self.trend),
            ("momentum", self.momentum),
            ("volatility", self.volatility),
            ("volume-confirmation", self.volume_confirmation),
        ]
    }
}

/// Fusion weights, discounts and decision thresholds.
///
/// The technical category weights sum to 1, as do the composite weights;
/// `validate` enforces both so a hand-edited config cannot skew the
/// composite silently.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FusionConfig {
    // Technical aggregate: trend and momentum dominate, volume confirms,
    // volatility contributes least direction.
    pub trend_weight: f64,
    pub momentum_weight: f64,
    pub volatility_weight: f64,
    pub volume_weight: f64,

    // Composite: technical carries the most weight.
    pub technical_weight: f64,
    pub sentiment_weight: f64,
    pub onchain_weight: f64,

    /// Discount applied to a default-neutral external score so a stale or
    /// absent signal never carries full weight.
    pub default_neutral_discount: f64,

    /// |composite| at or above this fires BUY/SELL; below it, HOLD.
    pub decision_threshold: f64,

    /// A HOLD whose |composite| lands within this band of the threshold
    /// is flagged "marginal" in the rationale.
    pub marginal_band: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            trend_weight: 0.35,
            momentum_weight: 0.35,
            volatility_weight: 0.10,
            volume_weight: 0.20,
            technical_weight: 0.60,
            sentiment_weight: 0.25,
            onchain_weight: 0.15,
            default_neutral_discount: 0.5,
            decision_threshold: 0.15,
            marginal_band: 0.03,
        }
    }
}

impl FusionConfig {
    /// Theoretical maximum |composite|: every input measured and saturated.
    pub fn theta_max(&self) -> f64 {
        self.technical_weight + self.sentiment_weight + self.onchain_weight
    }

    pub fn validate(&self) -> Result<(), String> {
        let cat = self.trend_weight + self.momentum_weight + self.volatility_weight
            + self.volume_weight;
        if (cat - 1.0).abs() > 1e-9 {
            return Err(format!("technical category weights sum to {cat}, expected 1.0"));
        }
        let composite = self.theta_max();
        if (composite - 1.0).abs() > 1e-9 {
            return Err(format!("composite weights sum to {composite}, expected 1.0"));
        }
        if !(self.decision_threshold > 0.0 && self.decision_threshold < 1.0) {
            return Err(format!(
                "decision_threshold {} outside (0, 1)",
                self.decision_threshold
            ));
        }
        if !(0.0..=1.0).contains(&self.default_neutral_discount) {
            return Err(format!(
                "default_neutral_discount {} outside [0, 1]",
                self.default_neutral_discount
            ));
        }
        if self.marginal_band < 0.0 || !self.marginal_band.is_finite() {
            return Err(format!("marginal_band {} invalid", self.marginal_band));
        }
        Ok(())
    }

    fn discount(&self, score: &Score) -> f64 {
        match score.provenance {
            Provenance::Measured => 1.0,
            Provenance::DefaultNeutral => self.default_neutral_discount,
        }
    }
}

/// Weighted technical aggregate over the four categories.
pub fn technical_score(tech: &TechnicalScores, cfg: &FusionConfig) -> Score {
    let value = cfg.trend_weight * tech.trend.value
        + cfg.momentum_weight * tech.momentum.value
        + cfg.volatility_weight * tech.volatility.value
        + cfg.volume_weight * tech.volume_confirmation.value;
    let provenance = if tech.categories().iter().any(|(_, s)| s.is_measured()) {
        Provenance::Measured
    } else {
        Provenance::DefaultNeutral
    };
    Score::bounded(value, provenance)
}

/// Composite score: `C = w_t*T + w_s*S*d_s + w_o*O*d_o`.
///
/// Pure and deterministic: identical scores and config always produce the
/// identical composite.
pub fn composite_score(
    technical: &Score,
    sentiment: &Score,
    onchain: &Score,
    cfg: &FusionConfig,
) -> f64 {
    cfg.technical_weight * technical.value
        + cfg.sentiment_weight * sentiment.value * cfg.discount(sentiment)
        + cfg.onchain_weight * onchain.value * cfg.discount(onchain)
}

/// Fuse technical, sentiment and on-chain scores into one trading signal.
pub fn fuse(
    tech: &TechnicalScores,
    sentiment: &Score,
    onchain: &Score,
    cfg: &FusionConfig,
    generated_at: DateTime<Utc>,
) -> TradingSignal {
    let technical = technical_score(tech, cfg);
    let composite = composite_score(&technical, sentiment, onchain, cfg);

    let theta = cfg.decision_threshold;
    let action = if composite >= theta {
        SignalAction::Buy
    } else if composite <= -theta {
        SignalAction::Sell
    } else {
        SignalAction::Hold
    };

    let theta_max = cfg.theta_max();
    let confidence = if theta_max > 0.0 {
        (composite.abs() / theta_max).min(1.0)
    } else {
        0.0
    };

    tracing::debug!(
        composite,
        technical = technical.value,
        sentiment = sentiment.value,
        onchain = onchain.value,
        %action,
        "fused signal"
    );

    let mut rationale = Vec::new();
    rationale.push(format!(
        "composite {composite:+.4} vs threshold {theta:.2} -> {action}"
    ));

    // Contribution lines, descending |contribution|.
    let mut contributions = [
        (
            "technical",
            technical.value,
            cfg.technical_weight,
            1.0,
            technical.provenance,
        ),
        (
            "sentiment",
            sentiment.value,
            cfg.sentiment_weight,
            cfg.discount(sentiment),
            sentiment.provenance,
        ),
        (
            "on-chain",
            onchain.value,
            cfg.onchain_weight,
            cfg.discount(onchain),
            onchain.provenance,
        ),
    ];
    contributions.sort_by(|a, b| {
        let ca = (a.1 * a.2 * a.3).abs();
        let cb = (b.1 * b.2 * b.3).abs();
        cb.total_cmp(&ca)
    });
    for (name, value, weight, discount, provenance) in contributions {
        rationale.push(format!(
            "{name}: score {value:+.3}, weight {weight:.2}, discount {discount:.2}, \
             contribution {:+.4} ({provenance})",
            value * weight * discount
        ));
    }

    if sentiment.clipped {
        rationale.push("sentiment input was clipped to [-1, 1]".to_string());
    }
    if onchain.clipped {
        rationale.push("on-chain input was clipped to [-1, 1]".to_string());
    }

    let mut defaulted: Vec<&str> = Vec::new();
    for (name, score) in tech.categories() {
        if !score.is_measured() {
            defaulted.push(name);
        }
    }
    if !sentiment.is_measured() {
        defaulted.push("sentiment");
    }
    if !onchain.is_measured() {
        defaulted.push("on-chain");
    }
    if !defaulted.is_empty() {
        rationale.push(format!("defaulted inputs: {}", defaulted.join(", ")));
    }

    if action == SignalAction::Hold && theta - composite.abs() <= cfg.marginal_band {
        rationale.push(format!(
            "marginal: |composite| {:.4} within {:.2} of threshold {theta:.2}",
            composite.abs(),
            cfg.marginal_band
        ));
    }

    TradingSignal {
        action,
        confidence,
        rationale,
        generated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-06-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn tech(trend: f64, momentum: f64, volume: f64) -> TechnicalScores {
        TechnicalScores {
            trend: Score::measured(trend),
            momentum: Score::measured(momentum),
            volatility: Score::neutral(),
            volume_confirmation: Score::measured(volume),
        }
    }

    #[test]
    fn default_config_validates() {
        FusionConfig::default().validate().unwrap();
    }

    #[test]
    fn validate_rejects_skewed_weights() {
        let cfg = FusionConfig {
            trend_weight: 0.5,
            ..FusionConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn fuse_is_deterministic() {
        let cfg = FusionConfig::default();
        let t = tech(0.6, -0.2, 0.3);
        let s = Score::measured(0.4);
        let o = Score::neutral();
        let a = fuse(&t, &s, &o, &cfg, at());
        let b = fuse(&t, &s, &o, &cfg, at());
        assert_eq!(a, b);
    }

    #[test]
    fn all_neutral_inputs_hold_with_zero_confidence() {
        let cfg = FusionConfig::default();
        let signal = fuse(
            &TechnicalScores::neutral(),
            &Score::neutral(),
            &Score::neutral(),
            &cfg,
            at(),
        );
        assert_eq!(signal.action, SignalAction::Hold);
        assert_eq!(signal.confidence, 0.0);
        assert!(signal
            .rationale
            .iter()
            .any(|line| line.contains("defaulted inputs")));
    }

    #[test]
    fn decision_boundary_at_theta() {
        let cfg = FusionConfig::default();
        let eps = 1e-4;
        // Only sentiment measured: C = 0.25 * s.
        let theta = cfg.decision_threshold;

        let below = Score::measured((theta - eps) / cfg.sentiment_weight);
        let signal = fuse(
            &TechnicalScores::neutral(),
            &below,
            &Score::neutral(),
            &cfg,
            at(),
        );
        assert_eq!(signal.action, SignalAction::Hold);

        let above = Score::measured((theta + eps) / cfg.sentiment_weight);
        let signal = fuse(
            &TechnicalScores::neutral(),
            &above,
            &Score::neutral(),
            &cfg,
            at(),
        );
        assert_eq!(signal.action, SignalAction::Buy);

        let sell = Score::measured(-(theta + eps) / cfg.sentiment_weight);
        let signal = fuse(
            &TechnicalScores::neutral(),
            &sell,
            &Score::neutral(),
            &cfg,
            at(),
        );
        assert_eq!(signal.action, SignalAction::Sell);
    }

    #[test]
    fn overbought_scenario_composite_is_reproducible() {
        // RSI 75 maps to -1/6 momentum; trend +0.6, volume-confirmation
        // +0.2, sentiment and on-chain absent.
        let cfg = FusionConfig::default();
        let t = TechnicalScores {
            trend: Score::measured(0.6),
            momentum: Score::measured(-1.0 / 6.0),
            volatility: Score::neutral(),
            volume_confirmation: Score::measured(0.2),
        };
        let technical = technical_score(&t, &cfg);
        let expected_t = 0.35 * 0.6 + 0.35 * (-1.0 / 6.0) + 0.20 * 0.2;
        assert!((technical.value - expected_t).abs() < 1e-12);

        let signal = fuse(&t, &Score::neutral(), &Score::neutral(), &cfg, at());
        let expected_c = 0.60 * expected_t;
        assert!((signal.confidence - expected_c.abs()).abs() < 1e-12);
        assert_eq!(signal.action, SignalAction::Hold);
        assert!(signal
            .rationale
            .iter()
            .any(|line| line.contains("defaulted inputs: volatility, sentiment, on-chain")));
    }

    #[test]
    fn defaulted_external_score_is_discounted() {
        let cfg = FusionConfig::default();
        // A stale sentiment value that kept its magnitude but lost its
        // provenance must contribute at half weight.
        let stale = Score::bounded(0.8, Provenance::DefaultNeutral);
        let fresh = Score::measured(0.8);
        let neutral = Score::neutral();
        let technical = Score::bounded(0.0, Provenance::Measured);

        let c_stale = composite_score(&technical, &stale, &neutral, &cfg);
        let c_fresh = composite_score(&technical, &fresh, &neutral, &cfg);
        assert!((c_stale - 0.25 * 0.8 * 0.5).abs() < 1e-12);
        assert!((c_fresh - 0.25 * 0.8).abs() < 1e-12);
    }

    #[test]
    fn rationale_orders_contributions_by_magnitude() {
        let cfg = FusionConfig::default();
        let t = tech(0.1, 0.0, 0.0); // technical contribution: 0.6*0.035 = 0.021
        let s = Score::measured(0.9); // sentiment contribution: 0.225
        let o = Score::measured(-0.5); // on-chain contribution: -0.075
        let signal = fuse(&t, &s, &o, &cfg, at());

        let idx = |needle: &str| {
            signal
                .rationale
                .iter()
                .position(|line| line.starts_with(needle))
                .unwrap()
        };
        assert!(idx("sentiment") < idx("on-chain"));
        assert!(idx("on-chain") < idx("technical"));
    }

    #[test]
    fn near_threshold_hold_is_flagged_marginal() {
        let cfg = FusionConfig::default();
        // C = 0.25 * 0.52 = 0.13; theta 0.15, band 0.03.
        let s = Score::measured(0.52);
        let signal = fuse(&TechnicalScores::neutral(), &s, &Score::neutral(), &cfg, at());
        assert_eq!(signal.action, SignalAction::Hold);
        assert!(signal.rationale.iter().any(|l| l.starts_with("marginal")));

        // C = 0.25 * 0.2 = 0.05 is a comfortable HOLD: no flag.
        let s = Score::measured(0.2);
        let signal = fuse(&TechnicalScores::neutral(), &s, &Score::neutral(), &cfg, at());
        assert_eq!(signal.action, SignalAction::Hold);
        assert!(!signal.rationale.iter().any(|l| l.starts_with("marginal")));
    }

    #[test]
    fn clipped_input_is_reported() {
        let cfg = FusionConfig::default();
        let s = Score::measured(1.4);
        assert!(s.clipped);
        let signal = fuse(&TechnicalScores::neutral(), &s, &Score::neutral(), &cfg, at());
        assert!(signal
            .rationale
            .iter()
            .any(|l| l.contains("sentiment input was clipped")));
    }

    #[test]
    fn confidence_never_exceeds_one() {
        let cfg = FusionConfig::default();
        let t = tech(1.0, 1.0, 1.0);
        let signal = fuse(
            &t,
            &Score::measured(1.0),
            &Score::measured(1.0),
            &cfg,
            at(),
        );
        assert_eq!(signal.action, SignalAction::Buy);
        assert!(signal.confidence <= 1.0);
    }
}
