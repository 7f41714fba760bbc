//! Read-through snapshot cache with per-symbol single-flight refresh.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use tokio::sync::{Mutex, RwLock};

use crate::error::EngineError;
use crate::market::{MarketDataError, MarketDataSource, MarketSnapshot};

#[derive(Default)]
struct Slot {
    entry: Option<(MarketSnapshot, Instant)>,
}

/// TTL cache of [`MarketSnapshot`] keyed by symbol.
///
/// Each symbol owns one slot behind its own async mutex; a refresh holds
/// the slot lock across the upstream call, so concurrent requests for a
/// stale key wait on the in-flight fetch and reuse its result instead of
/// issuing duplicate upstream calls (single-writer-per-key).
///
/// Fetch failures fall back to the stale entry when one exists; only a
/// miss with no usable cache propagates an error.
pub struct SnapshotCache {
    ttl: Duration,
    fetch_timeout: Duration,
    slots: RwLock<FxHashMap<String, Arc<Mutex<Slot>>>>,
}

impl SnapshotCache {
    pub fn new(ttl: Duration, fetch_timeout: Duration) -> Self {
        Self {
            ttl,
            fetch_timeout,
            slots: RwLock::new(FxHashMap::default()),
        }
    }

    async fn slot(&self, symbol: &str) -> Arc<Mutex<Slot>> {
        if let Some(slot) = self.slots.read().await.get(symbol) {
            return Arc::clone(slot);
        }
        let mut slots = self.slots.write().await;
        Arc::clone(slots.entry(symbol.to_string()).or_default())
    }

    /// Return a fresh snapshot, refreshing through `source` if needed.
    pub async fn get_or_fetch(
        &self,
        symbol: &str,
        source: &dyn MarketDataSource,
    ) -> Result<MarketSnapshot, EngineError> {
        let slot = self.slot(symbol).await;
        let mut guard = slot.lock().await;

        if let Some((snapshot, fetched)) = &guard.entry {
            if fetched.elapsed() < self.ttl {
                return Ok(snapshot.clone());
            }
        }

        let fetched = match tokio::time::timeout(self.fetch_timeout, source.snapshot(symbol)).await
        {
            Ok(result) => result,
            Err(_) => Err(MarketDataError::Transport(format!(
                "snapshot fetch for {symbol} timed out after {:?}",
                self.fetch_timeout
            ))),
        };

        match fetched {
            Ok(snapshot) => {
                guard.entry = Some((snapshot.clone(), Instant::now()));
                Ok(snapshot)
            }
            Err(err) => {
                if let Some((stale, fetched_at)) = &guard.entry {
                    tracing::warn!(
                        symbol,
                        error = %err,
                        age_secs = fetched_at.elapsed().as_secs(),
                        "snapshot refresh failed, serving stale entry"
                    );
                    return Ok(stale.clone());
                }
                match err {
                    MarketDataError::UnknownSymbol(symbol) => {
                        Err(EngineError::UnknownSymbol(symbol))
                    }
                    other => Err(EngineError::UpstreamUnavailable(other.to_string())),
                }
            }
        }
    }
}
