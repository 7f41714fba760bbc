use std::fmt;

use risk_core::RiskError;

/// Unified error type for analysis requests.
///
/// Only these failures reach the caller; every degradable input problem
/// (missing sentiment, short series, stale source) is absorbed as a
/// default-neutral score and named in the signal rationale instead.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The market-data source does not know the symbol and nothing is
    /// cached for it.
    UnknownSymbol(String),
    /// Market data could not be fetched and no usable cache entry exists;
    /// a signal cannot be computed without price data.
    UpstreamUnavailable(String),
    /// Bad risk configuration, fatal to this request.
    InvalidRiskProfile(String),
    /// A plan violated its ordering invariant; never silently swallowed.
    DegeneratePlan(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSymbol(symbol) => write!(f, "unknown_symbol: {symbol}"),
            Self::UpstreamUnavailable(msg) => write!(f, "upstream_unavailable: {msg}"),
            Self::InvalidRiskProfile(msg) => write!(f, "invalid_risk_profile: {msg}"),
            Self::DegeneratePlan(msg) => write!(f, "degenerate_plan: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<RiskError> for EngineError {
    fn from(e: RiskError) -> Self {
        match e {
            RiskError::InvalidProfile(msg) => Self::InvalidRiskProfile(msg),
            RiskError::DegeneratePlan(msg) => Self::DegeneratePlan(msg),
        }
    }
}
