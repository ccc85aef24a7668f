//! Time-bounded in-memory cache in front of another [`DataPort`].

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::domain::error::SignalError;
use crate::domain::ohlcv::{Lookback, Series};
use crate::domain::universe::UniverseEntry;
use crate::ports::data_port::DataPort;

type CacheKey = (String, Lookback);

/// Caches successful fetches per `(symbol, lookback)` for `ttl`.
///
/// Errors are never cached, so a symbol that failed is retried on the next
/// request.
pub struct CachedDataPort<P> {
    inner: P,
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, (Instant, Series)>>,
}

impl<P: DataPort> CachedDataPort<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, (Instant, Series)>> {
        // A panic while holding the lock cannot leave a half-written entry.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl<P: DataPort> DataPort for CachedDataPort<P> {
    fn fetch_series(&self, symbol: &str, lookback: Lookback) -> Result<Series, SignalError> {
        let key = (symbol.to_string(), lookback);
        let hit = self
            .lock()
            .get(&key)
            .filter(|(stored, _)| stored.elapsed() < self.ttl)
            .map(|(_, series)| series.clone());
        if let Some(series) = hit {
            tracing::debug!(symbol, %lookback, "cache hit");
            return Ok(series);
        }

        // Fetch outside the lock so slow symbols do not serialise the pool.
        let series = self.inner.fetch_series(symbol, lookback)?;
        let ttl = self.ttl;
        let mut entries = self.lock();
        // Expired entries go on every insert so the map stays bounded by the live set.
        entries.retain(|_, (stored, _)| stored.elapsed() < ttl);
        entries.insert(key, (Instant::now(), series.clone()));
        Ok(series)
    }

    fn list_symbols(&self, sector: Option<&str>) -> Result<Vec<UniverseEntry>, SignalError> {
        self.inner.list_symbols(sector)
    }
}
