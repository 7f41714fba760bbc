//! Pure risk primitives: position sizing and trading-plan construction.
//!
//! This crate intentionally keeps risk logic free from engine state and
//! I/O. Everything here is a deterministic function of its inputs, and
//! every safety bound (risk ceiling, position cap, plan ordering) is
//! enforced with an explicit flag or error, never silently.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Direction of a planned position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanSide {
    Long,
    Short,
}

/// Account-level risk configuration for one request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskProfile {
    /// Account equity in quote currency. Must be positive.
    pub account_size: f64,
    /// Percent of the account risked per trade, in (0, 100].
    pub risk_percent: f64,
    /// Optional cap on position notional as a percent of the account.
    #[serde(default)]
    pub max_position_percent: Option<f64>,
}

impl RiskProfile {
    pub fn new(account_size: f64, risk_percent: f64) -> Self {
        Self {
            account_size,
            risk_percent,
            max_position_percent: None,
        }
    }
}

/// Named constants for sizing and plan construction.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PlanParams {
    /// Hard ceiling on `risk_percent`; values above are clamped and
    /// flagged, never accepted.
    pub risk_percent_ceiling: f64,
    /// Stop distance as a fraction of the volatility band width.
    pub stop_width_factor: f64,
    /// Bounds on the stop distance, as fractions of entry price.
    pub min_stop_distance_pct: f64,
    pub max_stop_distance_pct: f64,
    /// Stop distance used when no volatility measurement is available.
    pub default_stop_distance_pct: f64,
    /// Take-profit distance as a multiple of the stop distance.
    pub reward_risk_ratio: f64,
}

impl Default for PlanParams {
    fn default() -> Self {
        Self {
            risk_percent_ceiling: 5.0,
            stop_width_factor: 0.5,
            min_stop_distance_pct: 0.01,
            max_stop_distance_pct: 0.08,
            default_stop_distance_pct: 0.02,
            reward_risk_ratio: 2.0,
        }
    }
}

impl PlanParams {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.risk_percent_ceiling > 0.0 && self.risk_percent_ceiling <= 100.0) {
            return Err(format!(
                "risk_percent_ceiling {} outside (0, 100]",
                self.risk_percent_ceiling
            ));
        }
        if self.stop_width_factor <= 0.0 {
            return Err("stop_width_factor must be positive".to_string());
        }
        if !(self.min_stop_distance_pct > 0.0
            && self.min_stop_distance_pct <= self.max_stop_distance_pct
            && self.max_stop_distance_pct < 1.0)
        {
            return Err(format!(
                "stop distance bounds ({}, {}) must satisfy 0 < min <= max < 1",
                self.min_stop_distance_pct, self.max_stop_distance_pct
            ));
        }
        if !(self.default_stop_distance_pct >= self.min_stop_distance_pct
            && self.default_stop_distance_pct <= self.max_stop_distance_pct)
        {
            return Err(format!(
                "default_stop_distance_pct {} outside the stop bounds",
                self.default_stop_distance_pct
            ));
        }
        if self.reward_risk_ratio <= 0.0 {
            return Err("reward_risk_ratio must be positive".to_string());
        }
        Ok(())
    }
}

/// Sizing and plan failures that must surface to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum RiskError {
    /// Bad risk configuration: non-positive account size or risk percent.
    InvalidProfile(String),
    /// A computed plan violated its own ordering invariant.
    DegeneratePlan(String),
}

impl fmt::Display for RiskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidProfile(msg) => write!(f, "invalid risk profile: {msg}"),
            Self::DegeneratePlan(msg) => write!(f, "degenerate plan: {msg}"),
        }
    }
}

impl std::error::Error for RiskError {}

/// Position sizing result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizingResult {
    /// Units of the asset to hold.
    pub position_size: f64,
    /// Quote-currency amount actually at risk between entry and stop.
    pub risk_amount: f64,
    pub stop_loss: f64,
    /// True when `risk_percent` exceeded the ceiling and was clamped.
    pub risk_clamped: bool,
    /// True when the position was reduced to honor `max_position_percent`.
    pub position_capped: bool,
}

/// Size a position from account risk and stop distance.
///
/// `risk_amount = account_size × risk_percent/100` with `risk_percent`
/// clamped at the ceiling; `position_size = risk_amount / (price ×
/// stop_distance_pct)`, then capped by `max_position_percent` notional
/// with `risk_amount` recomputed from the capped size so the reported
/// risk stays truthful.
pub fn size_position(
    side: PlanSide,
    price: f64,
    profile: &RiskProfile,
    stop_distance_pct: f64,
    params: &PlanParams,
) -> Result<SizingResult, RiskError> {
    if !(profile.account_size.is_finite() && profile.account_size > 0.0) {
        return Err(RiskError::InvalidProfile(format!(
            "account_size {} must be positive",
            profile.account_size
        )));
    }
    if !(profile.risk_percent.is_finite() && profile.risk_percent > 0.0) {
        return Err(RiskError::InvalidProfile(format!(
            "risk_percent {} must be positive",
            profile.risk_percent
        )));
    }
    if !(price.is_finite() && price > 0.0) {
        return Err(RiskError::InvalidProfile(format!(
            "price {price} must be positive"
        )));
    }
    if !(stop_distance_pct.is_finite() && stop_distance_pct > 0.0 && stop_distance_pct < 1.0) {
        return Err(RiskError::InvalidProfile(format!(
            "stop_distance_pct {stop_distance_pct} outside (0, 1)"
        )));
    }

    let risk_clamped = profile.risk_percent > params.risk_percent_ceiling;
    let effective_percent = profile.risk_percent.min(params.risk_percent_ceiling);
    let mut risk_amount = profile.account_size * effective_percent / 100.0;

    let stop_loss = match side {
        PlanSide::Long => price * (1.0 - stop_distance_pct),
        PlanSide::Short => price * (1.0 + stop_distance_pct),
    };

    let mut position_size = risk_amount / (price * stop_distance_pct);

    let mut position_capped = false;
    if let Some(cap_percent) = profile.max_position_percent {
        if cap_percent > 0.0 {
            let max_units = profile.account_size * cap_percent / 100.0 / price;
            if position_size > max_units {
                position_size = max_units;
                risk_amount = position_size * price * stop_distance_pct;
                position_capped = true;
            }
        }
    }

    Ok(SizingResult {
        position_size,
        risk_amount,
        stop_loss,
        risk_clamped,
        position_capped,
    })
}

/// Concrete, self-consistent trade plan.
///
/// Ordering invariant: `stop_loss < entry_price < take_profit` for a
/// long, reversed for a short. [`build_plan`] refuses to emit a plan
/// that violates it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradingPlan {
    pub side: PlanSide,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub position_size: f64,
    pub risk_amount: f64,
    pub stop_distance_pct: f64,
    pub risk_clamped: bool,
    pub position_capped: bool,
}

/// Derive the stop distance from a measured volatility band width, or
/// fall back to the default when volatility is unavailable.
pub fn stop_distance_from_band_width(band_width: Option<f64>, params: &PlanParams) -> f64 {
    match band_width {
        Some(width) if width.is_finite() && width > 0.0 => (width * params.stop_width_factor)
            .clamp(params.min_stop_distance_pct, params.max_stop_distance_pct),
        _ => params.default_stop_distance_pct,
    }
}

/// Build a trade plan around the current price.
///
/// Take-profit sits at `reward_risk_ratio` stop distances beyond entry.
/// The ordering invariant is checked before returning; a pathological
/// volatility/price combination yields `DegeneratePlan`, never an
/// inconsistent plan.
pub fn build_plan(
    side: PlanSide,
    price: f64,
    band_width: Option<f64>,
    profile: &RiskProfile,
    params: &PlanParams,
) -> Result<TradingPlan, RiskError> {
    let stop_distance_pct = stop_distance_from_band_width(band_width, params);
    let sizing = size_position(side, price, profile, stop_distance_pct, params)?;

    let entry_price = price;
    let risk_per_unit = entry_price * stop_distance_pct;
    let take_profit = match side {
        PlanSide::Long => entry_price + params.reward_risk_ratio * risk_per_unit,
        PlanSide::Short => entry_price - params.reward_risk_ratio * risk_per_unit,
    };

    let ordered = match side {
        PlanSide::Long => sizing.stop_loss < entry_price && entry_price < take_profit,
        PlanSide::Short => take_profit < entry_price && entry_price < sizing.stop_loss,
    };
    let finite = entry_price.is_finite()
        && sizing.stop_loss.is_finite()
        && take_profit.is_finite()
        && sizing.position_size.is_finite();
    if !ordered || !finite || sizing.stop_loss <= 0.0 || take_profit <= 0.0 {
        return Err(RiskError::DegeneratePlan(format!(
            "stop {} / entry {} / target {} do not order for {:?}",
            sizing.stop_loss, entry_price, take_profit, side
        )));
    }

    Ok(TradingPlan {
        side,
        entry_price,
        stop_loss: sizing.stop_loss,
        take_profit,
        position_size: sizing.position_size,
        risk_amount: sizing.risk_amount,
        stop_distance_pct,
        risk_clamped: sizing.risk_clamped,
        position_capped: sizing.position_capped,
    })
}
