//! Collaborator traits and the market snapshot type.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use aq_core::PriceSeries;
use aq_signals::{RawOnChainInput, RawSentimentInput};

/// Point-in-time market state for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Uppercase ticker, e.g. "BTC".
    pub symbol: String,
    pub price: f64,
    pub volume_24h: f64,
    pub market_cap: f64,
    pub percent_change_1h: f64,
    pub percent_change_24h: f64,
    pub percent_change_7d: f64,
    pub fetched_at: DateTime<Utc>,
}

/// Market-data fetch failure.
#[derive(Debug, Clone, PartialEq)]
pub enum MarketDataError {
    UnknownSymbol(String),
    RateLimited,
    Transport(String),
}

impl fmt::Display for MarketDataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSymbol(symbol) => write!(f, "unknown symbol {symbol}"),
            Self::RateLimited => write!(f, "rate limited by upstream"),
            Self::Transport(msg) => write!(f, "transport failure: {msg}"),
        }
    }
}

impl std::error::Error for MarketDataError {}

/// Upstream market-data client.
///
/// Implementations do the actual wire work (HTTP client, fixture file,
/// test stub); the engine adds caching and timeouts on top.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn snapshot(&self, symbol: &str) -> Result<MarketSnapshot, MarketDataError>;
    async fn price_series(&self, symbol: &str) -> Result<PriceSeries, MarketDataError>;
}

/// Optional sentiment provider (text or chart-image derived).
///
/// `Ok(None)` means "nothing known for this symbol"; errors are treated
/// the same way by the engine. Either degrades to default-neutral.
#[async_trait]
pub trait SentimentSource: Send + Sync {
    async fn sentiment(&self, symbol: &str) -> Result<Option<RawSentimentInput>, MarketDataError>;
}

/// Optional on-chain metrics provider.
#[async_trait]
pub trait OnChainSource: Send + Sync {
    async fn onchain(&self, symbol: &str) -> Result<Option<RawOnChainInput>, MarketDataError>;
}
