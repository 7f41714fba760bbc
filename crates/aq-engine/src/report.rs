use serde::{Deserialize, Serialize};

use aq_core::IndicatorSet;
use aq_signals::TradingSignal;
use risk_core::TradingPlan;

use crate::market::MarketSnapshot;

/// Complete result of one analysis request. Plain data, directly
/// serializable for whatever presentation layer sits on top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub symbol: String,
    pub snapshot: MarketSnapshot,
    pub signal: TradingSignal,
    /// `None` for HOLD: no position, no plan.
    pub plan: Option<TradingPlan>,
    pub indicators: IndicatorSet,
}
