//! Opportunity ranking across a universe of instruments.
//!
//! [`rank_opportunities`] works on series the caller already holds. [`scan`]
//! fetches through a [`DataPort`] on a bounded worker pool with a per-symbol
//! timeout.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use rayon::prelude::*;

use crate::domain::error::SignalError;
use crate::domain::indicator::{IndicatorFrame, IndicatorParams};
use crate::domain::ohlcv::{Lookback, Series};
use crate::domain::signal::{is_bullish_trend, pct_vs_ma};
use crate::domain::universe::UniverseEntry;
use crate::ports::data_port::DataPort;

pub const DEFAULT_TOP_N: usize = 5;
pub const DEFAULT_WORKERS: usize = 8;
pub const MAX_WORKERS: usize = 64;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq)]
pub struct Opportunity {
    pub symbol: String,
    pub name: String,
    pub last_price: f64,
    pub pct_vs_ma20: f64,
}

/// Why a symbol produced neither an opportunity nor a rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    EmptyResult,
    InsufficientData { bars: usize },
    FetchFailed(String),
    Malformed(String),
    TimedOut,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::EmptyResult => write!(f, "no data"),
            SkipReason::InsufficientData { bars } => write!(f, "only {bars} bars"),
            SkipReason::FetchFailed(reason) => write!(f, "fetch failed: {reason}"),
            SkipReason::Malformed(reason) => write!(f, "malformed: {reason}"),
            SkipReason::TimedOut => write!(f, "timed out"),
        }
    }
}

impl From<SignalError> for SkipReason {
    fn from(err: SignalError) -> Self {
        match err {
            SignalError::EmptyResult { .. } => SkipReason::EmptyResult,
            SignalError::InsufficientData { bars, .. } => SkipReason::InsufficientData { bars },
            SignalError::MalformedSeries { reason, .. } => SkipReason::Malformed(reason),
            other => SkipReason::FetchFailed(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScanOutcome {
    pub opportunities: Vec<Opportunity>,
    pub skipped: Vec<SkippedSymbol>,
    /// Symbols that were evaluated but failed the bullish gate.
    pub rejected: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanOptions {
    pub lookback: Lookback,
    pub top_n: usize,
    pub workers: usize,
    pub timeout: Duration,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            lookback: Lookback::SixMonths,
            top_n: DEFAULT_TOP_N,
            workers: DEFAULT_WORKERS,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ScanOptions {
    pub fn validate(&self) -> Result<(), SignalError> {
        if self.top_n == 0 {
            return Err(SignalError::invalid_parameter("top_n", "must be at least 1"));
        }
        if !(1..=MAX_WORKERS).contains(&self.workers) {
            return Err(SignalError::invalid_parameter(
                "workers",
                format!("{} must be in 1..={MAX_WORKERS}", self.workers),
            ));
        }
        if self.timeout.is_zero() {
            return Err(SignalError::invalid_parameter("timeout", "must be positive"));
        }
        Ok(())
    }
}

/// Result of evaluating one already-fetched series.
#[derive(Debug, Clone, PartialEq)]
pub enum Candidate {
    Bullish(Opportunity),
    Rejected,
    Skipped(SkipReason),
}

impl ScanOutcome {
    fn record(&mut self, symbol: &str, candidate: Candidate) {
        match candidate {
            Candidate::Bullish(opportunity) => self.opportunities.push(opportunity),
            Candidate::Rejected => self.rejected += 1,
            Candidate::Skipped(reason) => {
                tracing::debug!(symbol, %reason, "symbol skipped");
                self.skipped.push(SkippedSymbol {
                    symbol: symbol.to_string(),
                    reason,
                });
            }
        }
    }
}

/// Apply the bullish trend+volume gate to the latest bar of `series`.
pub fn evaluate_candidate(
    entry: &UniverseEntry,
    series: &Series,
    params: &IndicatorParams,
) -> Candidate {
    let Some(bar) = series.last() else {
        return Candidate::Skipped(SkipReason::EmptyResult);
    };
    if series.len() < params.max_window() {
        return Candidate::Skipped(SkipReason::InsufficientData { bars: series.len() });
    }

    let frame = IndicatorFrame::compute(series, params);
    let Some(row) = frame.latest() else {
        return Candidate::Skipped(SkipReason::EmptyResult);
    };
    let (Some(ma20), Some(ma50), Some(vol_avg)) = (row.ma20, row.ma50, row.vol_avg) else {
        return Candidate::Skipped(SkipReason::InsufficientData { bars: series.len() });
    };

    if is_bullish_trend(bar.close, bar.volume as f64, ma20, ma50, vol_avg) {
        Candidate::Bullish(Opportunity {
            symbol: entry.symbol.clone(),
            name: entry.name.clone(),
            last_price: bar.close,
            pct_vs_ma20: pct_vs_ma(bar.close, ma20),
        })
    } else {
        Candidate::Rejected
    }
}

fn sort_and_truncate(opportunities: &mut Vec<Opportunity>, top_n: usize) {
    opportunities.sort_by(|a, b| {
        b.pct_vs_ma20
            .total_cmp(&a.pct_vs_ma20)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    opportunities.truncate(top_n);
}

/// Rank already-fetched series, best `top_n` first.
///
/// Short or empty series are skipped, never errors.
pub fn rank_opportunities(
    candidates: &[(UniverseEntry, Series)],
    top_n: usize,
    params: &IndicatorParams,
) -> Vec<Opportunity> {
    let mut opportunities: Vec<Opportunity> = candidates
        .par_iter()
        .filter_map(|(entry, series)| match evaluate_candidate(entry, series, params) {
            Candidate::Bullish(opportunity) => Some(opportunity),
            Candidate::Rejected | Candidate::Skipped(_) => None,
        })
        .collect();
    sort_and_truncate(&mut opportunities, top_n);
    opportunities
}

fn fetch_and_evaluate(
    source: &dyn DataPort,
    entry: &UniverseEntry,
    lookback: Lookback,
    params: &IndicatorParams,
) -> Candidate {
    match source.fetch_series(&entry.symbol, lookback) {
        Ok(series) => evaluate_candidate(entry, &series, params),
        Err(err) => Candidate::Skipped(err.into()),
    }
}

/// Fetch and rank every symbol in `universe` on a pool of `options.workers`
/// threads.
///
/// The timeout runs per symbol from the moment a worker picks it up, so
/// symbols still queued behind a stalled one are not charged for the wait.
/// A symbol running longer than `options.timeout` is recorded as timed out;
/// its worker keeps going and whatever it sends later is dropped.
pub fn scan(
    source: Arc<dyn DataPort + Send + Sync>,
    universe: &[UniverseEntry],
    options: &ScanOptions,
    params: &IndicatorParams,
) -> Result<ScanOutcome, SignalError> {
    options.validate()?;
    params.validate()?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.workers)
        .thread_name(|i| format!("scan-worker-{i}"))
        .build()
        .map_err(|e| SignalError::invalid_parameter("workers", e.to_string()))?;

    let (tx, rx) = mpsc::channel::<(usize, Candidate)>();
    let started: Arc<Vec<OnceLock<Instant>>> =
        Arc::new(universe.iter().map(|_| OnceLock::new()).collect());

    for (index, entry) in universe.iter().enumerate() {
        let tx = tx.clone();
        let source = Arc::clone(&source);
        let started = Arc::clone(&started);
        let entry = entry.clone();
        let lookback = options.lookback;
        let timeout = options.timeout;
        let params = *params;
        pool.spawn(move || {
            let started_at = *started[index].get_or_init(Instant::now);
            let candidate = catch_unwind(AssertUnwindSafe(|| {
                fetch_and_evaluate(source.as_ref(), &entry, lookback, &params)
            }))
            .unwrap_or_else(|_| Candidate::Skipped(SkipReason::FetchFailed("worker panicked".into())));
            let candidate = if started_at.elapsed() > timeout {
                Candidate::Skipped(SkipReason::TimedOut)
            } else {
                candidate
            };
            // The collector may have given up already.
            let _ = tx.send((index, candidate));
        });
    }
    drop(tx);

    let mut outcome = ScanOutcome::default();
    let mut done = vec![false; universe.len()];
    let mut remaining = universe.len();
    let mut inbox: Vec<(usize, Candidate)> = Vec::new();

    while remaining > 0 {
        // Results already delivered win over a deadline that lapsed while waiting.
        inbox.extend(rx.try_iter());
        for (index, candidate) in inbox.drain(..) {
            if !done[index] {
                done[index] = true;
                remaining -= 1;
                outcome.record(&universe[index].symbol, candidate);
            }
        }
        if remaining == 0 {
            break;
        }

        let now = Instant::now();
        let mut next_deadline: Option<Instant> = None;
        for (index, slot) in started.iter().enumerate() {
            if done[index] {
                continue;
            }
            let Some(&started_at) = slot.get() else {
                continue;
            };
            let deadline = started_at + options.timeout;
            if deadline <= now {
                done[index] = true;
                remaining -= 1;
                tracing::warn!(symbol = %universe[index].symbol, "symbol timed out");
                outcome.record(&universe[index].symbol, Candidate::Skipped(SkipReason::TimedOut));
            } else {
                next_deadline = Some(next_deadline.map_or(deadline, |d| d.min(deadline)));
            }
        }
        if remaining == 0 {
            break;
        }

        // Nothing running means the rest are queued; look again after a full timeout.
        let wait = next_deadline.map_or(options.timeout, |d| d.saturating_duration_since(now));
        match rx.recv_timeout(wait) {
            Ok(message) => inbox.push(message),
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    for (entry, _) in universe.iter().zip(&done).filter(|(_, d)| !**d) {
        outcome.record(&entry.symbol, Candidate::Skipped(SkipReason::TimedOut));
    }

    sort_and_truncate(&mut outcome.opportunities, options.top_n);
    outcome.skipped.sort_by(|a, b| a.symbol.cmp(&b.symbol));

    tracing::info!(
        universe = universe.len(),
        ranked = outcome.opportunities.len(),
        skipped = outcome.skipped.len(),
        rejected = outcome.rejected,
        "scan complete"
    );

    Ok(outcome)
}
