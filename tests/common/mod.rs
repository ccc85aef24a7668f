#![allow(dead_code)]

use chrono::NaiveDate;
use signalbourse::domain::error::SignalError;
pub use signalbourse::domain::ohlcv::{Lookback, OhlcvBar, Series};
use signalbourse::domain::universe::{filter_sector, UniverseEntry};
use signalbourse::ports::data_port::DataPort;
use std::collections::HashMap;
use std::time::Duration;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
    pub delays: HashMap<String, Duration>,
    pub universe: Vec<UniverseEntry>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            delays: HashMap::new(),
            universe: Vec::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self.universe.push(UniverseEntry::bare(symbol));
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self.universe.push(UniverseEntry::bare(symbol));
        self
    }

    pub fn with_delay(mut self, symbol: &str, delay: Duration) -> Self {
        self.delays.insert(symbol.to_string(), delay);
        self
    }

    pub fn with_sector(mut self, symbol: &str, sector: &str) -> Self {
        if let Some(entry) = self.universe.iter_mut().find(|e| e.symbol == symbol) {
            entry.sector = Some(sector.to_string());
        }
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_series(&self, symbol: &str, _lookback: Lookback) -> Result<Series, SignalError> {
        if let Some(delay) = self.delays.get(symbol) {
            std::thread::sleep(*delay);
        }
        if let Some(reason) = self.errors.get(symbol) {
            return Err(SignalError::DataSource {
                reason: reason.clone(),
            });
        }
        match self.data.get(symbol) {
            Some(bars) if !bars.is_empty() => Series::new(symbol, bars.clone()),
            _ => Err(SignalError::EmptyResult {
                symbol: symbol.to_string(),
            }),
        }
    }

    fn list_symbols(&self, sector: Option<&str>) -> Result<Vec<UniverseEntry>, SignalError> {
        Ok(filter_sector(self.universe.clone(), sector))
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// One bar per calendar day from 2024-01-01 with the given closes and volumes.
pub fn bars_from(closes: &[f64], volumes: &[i64]) -> Vec<OhlcvBar> {
    let start = date(2024, 1, 1);
    closes
        .iter()
        .zip(volumes)
        .enumerate()
        .map(|(i, (&close, &volume))| OhlcvBar {
            date: start + chrono::Duration::days(i as i64),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume,
        })
        .collect()
}

/// Closes `start_price + i * step`, volumes `1000 + 10 * i`.
pub fn trending_bars(count: usize, start_price: f64, step: f64) -> Vec<OhlcvBar> {
    let closes: Vec<f64> = (0..count).map(|i| start_price + step * i as f64).collect();
    let volumes: Vec<i64> = (0..count).map(|i| 1000 + 10 * i as i64).collect();
    bars_from(&closes, &volumes)
}

pub fn make_series(symbol: &str, bars: Vec<OhlcvBar>) -> Series {
    Series::new(symbol, bars).unwrap()
}

pub fn sample_csv(bars: &[OhlcvBar]) -> String {
    let mut out = String::from("date,open,high,low,close,volume\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.date, b.open, b.high, b.low, b.close, b.volume
        ));
    }
    out
}
