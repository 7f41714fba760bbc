//! Offline analysis CLI.
//!
//! Runs the signal synthesis engine over a candle file and prints the
//! full analysis report as JSON:
//!
//!   aq analyze --symbol BTC --candles btc_1h.json --account 10000

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use aq_core::PriceSeries;
use aq_engine::{
    Engine, EngineConfig, MarketDataError, MarketDataSource, MarketSnapshot, OnChainSource,
    SentimentSource,
};
use aq_signals::{RawMetricInput, RawOnChainInput, RawSentimentInput};
use risk_core::RiskProfile;

#[derive(Parser)]
#[command(
    name = "aq",
    version,
    about = "Signal synthesis engine for crypto assets",
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one symbol from a candle file
    Analyze(AnalyzeArgs),
}

#[derive(Parser)]
struct AnalyzeArgs {
    /// Ticker to analyze, e.g. BTC
    #[arg(long)]
    symbol: String,

    /// Path to a JSON array of candles: [{"t":..,"o":..,"h":..,"l":..,"c":..,"v":..}, ...]
    /// Percent-change fields in the snapshot assume hourly candles.
    #[arg(long)]
    candles: PathBuf,

    /// Account equity in quote currency
    #[arg(long, default_value_t = 10_000.0)]
    account: f64,

    /// Percent of the account risked per trade
    #[arg(long, default_value_t = 2.0)]
    risk_pct: f64,

    /// Optional cap on position notional, percent of the account
    #[arg(long)]
    max_position_pct: Option<f64>,

    /// Optional sentiment score in [-1, 1]
    #[arg(long)]
    sentiment: Option<f64>,

    /// Optional on-chain score in [-1, 1]
    #[arg(long)]
    onchain: Option<f64>,

    /// Optional engine config JSON (partial overrides on the defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the JSON report here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

/// Market data served from a candle file. The snapshot is synthesized
/// from the tail of the series.
struct FileMarketSource {
    symbol: String,
    series: PriceSeries,
}

impl FileMarketSource {
    fn load(symbol: &str, path: &PathBuf) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read candle file {}", path.display()))?;
        let series: PriceSeries =
            serde_json::from_str(&data).with_context(|| "invalid candle JSON")?;
        anyhow::ensure!(!series.is_empty(), "candle file holds no bars");
        Ok(Self {
            symbol: symbol.trim().to_uppercase(),
            series,
        })
    }

    /// Close-to-close percent change `bars` back from the last bar.
    fn percent_change(&self, bars: usize) -> f64 {
        let candles = self.series.candles();
        let last = match candles.last() {
            Some(candle) => candle.c,
            None => return 0.0,
        };
        if candles.len() <= bars {
            return 0.0;
        }
        let past = candles[candles.len() - 1 - bars].c;
        (last / past - 1.0) * 100.0
    }
}

#[async_trait]
impl MarketDataSource for FileMarketSource {
    async fn snapshot(&self, symbol: &str) -> Result<MarketSnapshot, MarketDataError> {
        if symbol != self.symbol {
            return Err(MarketDataError::UnknownSymbol(symbol.to_string()));
        }
        let last = self
            .series
            .last()
            .ok_or_else(|| MarketDataError::Transport("empty series".to_string()))?;
        let volume_24h: f64 = self
            .series
            .candles()
            .iter()
            .rev()
            .take(24)
            .map(|candle| candle.v)
            .sum();
        Ok(MarketSnapshot {
            symbol: self.symbol.clone(),
            price: last.c,
            volume_24h,
            market_cap: 0.0,
            percent_change_1h: self.percent_change(1),
            percent_change_24h: self.percent_change(24),
            percent_change_7d: self.percent_change(168),
            fetched_at: Utc::now(),
        })
    }

    async fn price_series(&self, symbol: &str) -> Result<PriceSeries, MarketDataError> {
        if symbol != self.symbol {
            return Err(MarketDataError::UnknownSymbol(symbol.to_string()));
        }
        Ok(self.series.clone())
    }
}

/// Fixed scalar passed on the command line.
struct ScalarSource {
    value: f64,
}

#[async_trait]
impl SentimentSource for ScalarSource {
    async fn sentiment(&self, _: &str) -> Result<Option<RawSentimentInput>, MarketDataError> {
        Ok(Some(RawMetricInput::Scalar(self.value)))
    }
}

#[async_trait]
impl OnChainSource for ScalarSource {
    async fn onchain(&self, _: &str) -> Result<Option<RawOnChainInput>, MarketDataError> {
        Ok(Some(RawMetricInput::Scalar(self.value)))
    }
}

async fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => EngineConfig::load(path).map_err(anyhow::Error::msg)?,
        None => EngineConfig::default(),
    };

    let market = Arc::new(FileMarketSource::load(&args.symbol, &args.candles)?);
    let mut engine = Engine::new(config, market).map_err(anyhow::Error::msg)?;
    if let Some(value) = args.sentiment {
        engine = engine.with_sentiment(Arc::new(ScalarSource { value }));
    }
    if let Some(value) = args.onchain {
        engine = engine.with_onchain(Arc::new(ScalarSource { value }));
    }

    let profile = RiskProfile {
        account_size: args.account,
        risk_percent: args.risk_pct,
        max_position_percent: args.max_position_pct,
    };

    let report = engine
        .analyze(&args.symbol, &profile)
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    let json = serde_json::to_string_pretty(&report)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("cannot write {}", path.display()))?;
            tracing::info!(path = %path.display(), "report written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze(args) => run_analyze(args).await,
    }
}
