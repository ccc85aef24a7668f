//! Daily bars and the validated series built from them.

use crate::domain::error::SignalError;
use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// Ordered, gap-free run of bars for one symbol. Dates are strictly ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub symbol: String,
    bars: Vec<OhlcvBar>,
}

impl Series {
    pub fn new(symbol: impl Into<String>, bars: Vec<OhlcvBar>) -> Result<Self, SignalError> {
        let symbol = symbol.into();
        for pair in bars.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(SignalError::MalformedSeries {
                    symbol,
                    reason: format!(
                        "dates not strictly ascending: {} then {}",
                        pair[0].date, pair[1].date
                    ),
                });
            }
        }
        if let Some(bar) = bars.iter().find(|b| !b.close.is_finite() || b.close <= 0.0) {
            return Err(SignalError::MalformedSeries {
                symbol,
                reason: format!("non-positive close on {}", bar.date),
            });
        }
        if let Some(bar) = bars
            .iter()
            .find(|b| ![b.open, b.high, b.low].iter().all(|v| v.is_finite()))
        {
            return Err(SignalError::MalformedSeries {
                symbol,
                reason: format!("non-finite price on {}", bar.date),
            });
        }
        if let Some(bar) = bars.iter().find(|b| b.volume < 0) {
            return Err(SignalError::MalformedSeries {
                symbol,
                reason: format!("negative volume {} on {}", bar.volume, bar.date),
            });
        }
        Ok(Self { symbol, bars })
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&OhlcvBar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume as f64).collect()
    }

    /// Keep only bars dated on or after `start`.
    pub fn since(&self, start: NaiveDate) -> Series {
        Series {
            symbol: self.symbol.clone(),
            bars: self.bars.iter().filter(|b| b.date >= start).cloned().collect(),
        }
    }
}

/// History depth requested from a data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lookback {
    SixMonths,
    OneYear,
    TwoYears,
}

impl Lookback {
    pub fn months(self) -> u32 {
        match self {
            Lookback::SixMonths => 6,
            Lookback::OneYear => 12,
            Lookback::TwoYears => 24,
        }
    }

    /// First calendar date covered when the window ends on `end`.
    pub fn start_from(self, end: NaiveDate) -> NaiveDate {
        end.checked_sub_months(chrono::Months::new(self.months()))
            .unwrap_or(NaiveDate::MIN)
    }
}

impl fmt::Display for Lookback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookback::SixMonths => write!(f, "6mo"),
            Lookback::OneYear => write!(f, "1y"),
            Lookback::TwoYears => write!(f, "2y"),
        }
    }
}

impl FromStr for Lookback {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "6mo" => Ok(Lookback::SixMonths),
            "1y" => Ok(Lookback::OneYear),
            "2y" => Ok(Lookback::TwoYears),
            other => Err(SignalError::invalid_parameter(
                "lookback",
                format!("unknown period '{other}' (expected 6mo, 1y or 2y)"),
            )),
        }
    }
}
