//! Engine configuration: every tunable constant, named.

use std::path::Path;

use serde::{Deserialize, Serialize};

use aq_core::IndicatorConfig;
use aq_signals::FusionConfig;
use risk_core::PlanParams;

/// Full engine configuration with documented defaults.
///
/// Loadable from JSON with any subset of fields overridden; `validate`
/// is called at construction so a skewed weight table or inverted bound
/// never reaches the scoring path.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    pub indicators: IndicatorConfig,
    pub fusion: FusionConfig,
    pub plan: PlanParams,

    /// Snapshot cache time-to-live, seconds.
    pub snapshot_ttl_secs: u64,
    /// Timeout for market-data fetches (snapshot and series), ms.
    pub fetch_timeout_ms: u64,
    /// Timeout for sentiment / on-chain fetches, ms. On expiry the input
    /// is treated as absent, never as a request failure.
    pub signal_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            indicators: IndicatorConfig::default(),
            fusion: FusionConfig::default(),
            plan: PlanParams::default(),
            snapshot_ttl_secs: 45,
            fetch_timeout_ms: 3_000,
            signal_timeout_ms: 1_500,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.indicators.validate()?;
        self.fusion.validate()?;
        self.plan.validate()?;
        if self.fetch_timeout_ms == 0 || self.signal_timeout_ms == 0 {
            return Err("fetch and signal timeouts must be positive".to_string());
        }
        Ok(())
    }

    /// Load overrides from a JSON file on top of the defaults.
    pub fn load(path: &Path) -> Result<Self, String> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        let config: Self =
            serde_json::from_str(&data).map_err(|e| format!("invalid config JSON: {e}"))?;
        config.validate()?;
        Ok(config)
    }
}
