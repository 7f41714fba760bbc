//! Analysis engine facade.
//!
//! Wires the pure scoring crates to the market-data, sentiment and
//! on-chain collaborators, caches snapshots per symbol, and exposes a
//! single `analyze` entry point returning a serializable report.

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod market;
pub mod report;

pub use cache::SnapshotCache;
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::EngineError;
pub use market::{
    MarketDataError, MarketDataSource, MarketSnapshot, OnChainSource, SentimentSource,
};
pub use report::AnalysisReport;
