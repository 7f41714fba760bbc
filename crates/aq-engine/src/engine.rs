//! The analysis engine: one `analyze` call per request.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use aq_core::{compute_indicators, IndicatorSet, PriceSeries};
use aq_signals::{
    fuse, normalize_onchain, normalize_sentiment, RawOnChainInput, RawSentimentInput,
    SignalAction,
};
use risk_core::{build_plan, PlanSide, RiskProfile};

use crate::cache::SnapshotCache;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::market::{MarketDataSource, OnChainSource, SentimentSource};
use crate::report::AnalysisReport;

/// Signal synthesis engine.
///
/// Holds the collaborators and the snapshot cache; everything else is
/// computed fresh per request. Requests are independent and safe to run
/// concurrently.
pub struct Engine {
    config: EngineConfig,
    market: Arc<dyn MarketDataSource>,
    sentiment: Option<Arc<dyn SentimentSource>>,
    onchain: Option<Arc<dyn OnChainSource>>,
    cache: SnapshotCache,
}

impl Engine {
    pub fn new(config: EngineConfig, market: Arc<dyn MarketDataSource>) -> Result<Self, String> {
        config.validate()?;
        let cache = SnapshotCache::new(
            Duration::from_secs(config.snapshot_ttl_secs),
            Duration::from_millis(config.fetch_timeout_ms),
        );
        Ok(Self {
            config,
            market,
            sentiment: None,
            onchain: None,
            cache,
        })
    }

    pub fn with_sentiment(mut self, source: Arc<dyn SentimentSource>) -> Self {
        self.sentiment = Some(source);
        self
    }

    pub fn with_onchain(mut self, source: Arc<dyn OnChainSource>) -> Self {
        self.onchain = Some(source);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run one full analysis for `symbol`.
    ///
    /// Degradable problems (short or missing series, absent or slow
    /// sentiment / on-chain sources) become default-neutral scores named
    /// in the rationale. Only a bad risk profile, a degenerate plan, or
    /// total absence of price data fail the request.
    pub async fn analyze(
        &self,
        symbol: &str,
        profile: &RiskProfile,
    ) -> Result<AnalysisReport, EngineError> {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(EngineError::UnknownSymbol(symbol));
        }

        // Risk configuration is fatal before any upstream work.
        if !(profile.account_size.is_finite() && profile.account_size > 0.0) {
            return Err(EngineError::InvalidRiskProfile(format!(
                "account_size {} must be positive",
                profile.account_size
            )));
        }
        if !(profile.risk_percent.is_finite() && profile.risk_percent > 0.0) {
            return Err(EngineError::InvalidRiskProfile(format!(
                "risk_percent {} must be positive",
                profile.risk_percent
            )));
        }

        let snapshot = self.cache.get_or_fetch(&symbol, self.market.as_ref()).await?;

        let indicators = self.technical_view(&symbol).await;

        let (sentiment_raw, onchain_raw) = tokio::join!(
            self.fetch_sentiment(&symbol),
            self.fetch_onchain(&symbol),
        );
        let sentiment = normalize_sentiment(sentiment_raw.as_ref());
        let onchain = normalize_onchain(onchain_raw.as_ref());

        let signal = fuse(
            &indicators.scores,
            &sentiment,
            &onchain,
            &self.config.fusion,
            Utc::now(),
        );

        let plan = match signal.action {
            SignalAction::Hold => None,
            SignalAction::Buy | SignalAction::Sell => {
                let side = if signal.action == SignalAction::Buy {
                    PlanSide::Long
                } else {
                    PlanSide::Short
                };
                Some(build_plan(
                    side,
                    snapshot.price,
                    indicators.measured_band_width(),
                    profile,
                    &self.config.plan,
                )?)
            }
        };

        tracing::info!(
            %symbol,
            action = %signal.action,
            confidence = signal.confidence,
            has_plan = plan.is_some(),
            "analysis complete"
        );

        Ok(AnalysisReport {
            symbol,
            snapshot,
            signal,
            plan,
            indicators,
        })
    }

    /// Fetch the series and score it; a failed or slow fetch degrades
    /// every technical category to neutral instead of failing.
    async fn technical_view(&self, symbol: &str) -> IndicatorSet {
        let timeout = Duration::from_millis(self.config.fetch_timeout_ms);
        match tokio::time::timeout(timeout, self.market.price_series(symbol)).await {
            Ok(Ok(series)) => compute_indicators(&series, &self.config.indicators),
            Ok(Err(err)) => {
                tracing::warn!(symbol, error = %err, "series fetch failed, technicals neutral");
                compute_indicators(&PriceSeries::empty(), &self.config.indicators)
            }
            Err(_) => {
                tracing::warn!(symbol, "series fetch timed out, technicals neutral");
                compute_indicators(&PriceSeries::empty(), &self.config.indicators)
            }
        }
    }

    async fn fetch_sentiment(&self, symbol: &str) -> Option<RawSentimentInput> {
        let source = self.sentiment.as_ref()?;
        let timeout = Duration::from_millis(self.config.signal_timeout_ms);
        match tokio::time::timeout(timeout, source.sentiment(symbol)).await {
            Ok(Ok(input)) => input,
            Ok(Err(err)) => {
                tracing::warn!(symbol, error = %err, "sentiment fetch failed, defaulting");
                None
            }
            Err(_) => {
                tracing::warn!(symbol, "sentiment fetch timed out, defaulting");
                None
            }
        }
    }

    async fn fetch_onchain(&self, symbol: &str) -> Option<RawOnChainInput> {
        let source = self.onchain.as_ref()?;
        let timeout = Duration::from_millis(self.config.signal_timeout_ms);
        match tokio::time::timeout(timeout, source.onchain(symbol)).await {
            Ok(Ok(input)) => input,
            Ok(Err(err)) => {
                tracing::warn!(symbol, error = %err, "on-chain fetch failed, defaulting");
                None
            }
            Err(_) => {
                tracing::warn!(symbol, "on-chain fetch timed out, defaulting");
                None
            }
        }
    }
}
