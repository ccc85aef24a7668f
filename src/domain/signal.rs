//! Indicator fusion into a BUY / SELL / WAIT recommendation.
//!
//! Four independent gates each read one family of indicators and may emit an
//! [`Observation`]. The advice is a plain majority vote of bullish against
//! bearish observations; a tie is WAIT. The trend and MACD gates always vote,
//! the RSI and Bollinger gates are silent inside their neutral zones.

use crate::domain::error::SignalError;
use crate::domain::indicator::{IndicatorFrame, IndicatorParams, IndicatorRow};
use crate::domain::ohlcv::{OhlcvBar, Series};
use chrono::NaiveDate;
use std::fmt;

pub const RSI_OVERSOLD: f64 = 30.0;
pub const RSI_OVERBOUGHT: f64 = 70.0;
/// Minimum volume, as a fraction of its average, for a bullish trend.
pub const BULL_VOLUME_RATIO: f64 = 0.8;
/// Maximum volume, as a fraction of its average, for a bearish trend.
pub const BEAR_VOLUME_RATIO: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Advice {
    Buy,
    Sell,
    Wait,
}

impl fmt::Display for Advice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advice::Buy => write!(f, "BUY"),
            Advice::Sell => write!(f, "SELL"),
            Advice::Wait => write!(f, "WAIT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Polarity {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Trend,
    Rsi,
    Macd,
    Bollinger,
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Polarity::Bullish => "bullish",
            Polarity::Bearish => "bearish",
            Polarity::Neutral => "neutral",
        })
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Source::Trend => "trend",
            Source::Rsi => "rsi",
            Source::Macd => "macd",
            Source::Bollinger => "bollinger",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Observation {
    pub polarity: Polarity,
    pub source: Source,
}

impl Observation {
    fn new(source: Source, polarity: Polarity) -> Self {
        Self { polarity, source }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalResult {
    pub advice: Advice,
    pub observations: Vec<Observation>,
}

/// Indicator readings every gate needs. RSI may legitimately be undefined on a
/// flat window, in which case its gate stays silent.
#[derive(Debug, Clone, Copy)]
struct GateInputs {
    ma20: f64,
    ma50: f64,
    vol_avg: f64,
    rsi14: Option<f64>,
    macd: f64,
    macd_signal: f64,
    boll_upper: f64,
    boll_lower: f64,
}

impl GateInputs {
    fn from_row(row: &IndicatorRow) -> Option<Self> {
        Some(Self {
            ma20: row.ma20?,
            ma50: row.ma50?,
            vol_avg: row.vol_avg?,
            rsi14: row.rsi14,
            macd: row.macd?,
            macd_signal: row.macd_signal?,
            boll_upper: row.boll_upper?,
            boll_lower: row.boll_lower?,
        })
    }
}

/// Bullish side of the trend+volume gate; shared with the opportunity ranker.
pub fn is_bullish_trend(close: f64, volume: f64, ma20: f64, ma50: f64, vol_avg: f64) -> bool {
    close > ma20 && ma20 > ma50 && volume >= BULL_VOLUME_RATIO * vol_avg
}

fn is_bearish_trend(close: f64, volume: f64, ma20: f64, ma50: f64, vol_avg: f64) -> bool {
    close < ma20 && ma20 < ma50 && volume <= BEAR_VOLUME_RATIO * vol_avg
}

fn trend_gate(bar: &OhlcvBar, inputs: &GateInputs) -> Observation {
    let volume = bar.volume as f64;
    let polarity = if is_bullish_trend(bar.close, volume, inputs.ma20, inputs.ma50, inputs.vol_avg)
    {
        Polarity::Bullish
    } else if is_bearish_trend(bar.close, volume, inputs.ma20, inputs.ma50, inputs.vol_avg) {
        Polarity::Bearish
    } else {
        Polarity::Neutral
    };
    Observation::new(Source::Trend, polarity)
}

fn rsi_gate(inputs: &GateInputs) -> Option<Observation> {
    let rsi = inputs.rsi14?;
    if rsi < RSI_OVERSOLD {
        Some(Observation::new(Source::Rsi, Polarity::Bullish))
    } else if rsi > RSI_OVERBOUGHT {
        Some(Observation::new(Source::Rsi, Polarity::Bearish))
    } else {
        None
    }
}

fn macd_gate(inputs: &GateInputs) -> Observation {
    let polarity = if inputs.macd > inputs.macd_signal {
        Polarity::Bullish
    } else {
        Polarity::Bearish
    };
    Observation::new(Source::Macd, polarity)
}

fn bollinger_gate(bar: &OhlcvBar, inputs: &GateInputs) -> Option<Observation> {
    if bar.close < inputs.boll_lower {
        Some(Observation::new(Source::Bollinger, Polarity::Bullish))
    } else if bar.close > inputs.boll_upper {
        Some(Observation::new(Source::Bollinger, Polarity::Bearish))
    } else {
        None
    }
}

fn vote(observations: &[Observation]) -> Advice {
    let bullish = observations
        .iter()
        .filter(|o| o.polarity == Polarity::Bullish)
        .count();
    let bearish = observations
        .iter()
        .filter(|o| o.polarity == Polarity::Bearish)
        .count();
    match bullish.cmp(&bearish) {
        std::cmp::Ordering::Greater => Advice::Buy,
        std::cmp::Ordering::Less => Advice::Sell,
        std::cmp::Ordering::Equal => Advice::Wait,
    }
}

/// Run every gate against one bar and its indicator row.
///
/// Returns `None` when an indicator the rule needs has no value yet.
pub fn evaluate(bar: &OhlcvBar, row: &IndicatorRow) -> Option<SignalResult> {
    let inputs = GateInputs::from_row(row)?;

    let mut observations = vec![trend_gate(bar, &inputs)];
    observations.extend(rsi_gate(&inputs));
    observations.push(macd_gate(&inputs));
    observations.extend(bollinger_gate(bar, &inputs));

    Some(SignalResult {
        advice: vote(&observations),
        observations,
    })
}

/// Headline figures for the latest bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub date: NaiveDate,
    pub last_price: f64,
    pub ma20: f64,
    pub pct_vs_ma20: f64,
    pub volume: i64,
    pub vol_avg: f64,
}

/// Percent distance of `price` above (positive) or below its 20-bar average.
pub fn pct_vs_ma(price: f64, ma: f64) -> f64 {
    100.0 * (price / ma - 1.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub symbol: String,
    pub advice: Advice,
    pub observations: Vec<Observation>,
    pub snapshot: Snapshot,
}

/// Number of bars after which every gate input is defined.
pub fn minimum_bars(params: &IndicatorParams) -> usize {
    let macd_warmup = crate::domain::indicator::macd::warmup(
        crate::domain::indicator::macd::DEFAULT_FAST,
        crate::domain::indicator::macd::DEFAULT_SLOW,
        crate::domain::indicator::macd::DEFAULT_SIGNAL,
    ) + 1;
    params.max_window().max(macd_warmup)
}

/// Evaluate the rule on the most recent bar of `series`.
pub fn analyze(series: &Series, params: &IndicatorParams) -> Result<Analysis, SignalError> {
    params.validate()?;

    let Some(bar) = series.last() else {
        return Err(SignalError::EmptyResult {
            symbol: series.symbol.clone(),
        });
    };

    let frame = IndicatorFrame::compute(series, params);
    let insufficient = || SignalError::InsufficientData {
        symbol: series.symbol.clone(),
        bars: series.len(),
        minimum: minimum_bars(params),
    };

    let row = frame.latest().ok_or_else(insufficient)?;
    let result = evaluate(bar, row).ok_or_else(insufficient)?;

    // evaluate() succeeded, so both averages are defined.
    let ma20 = row.ma20.ok_or_else(insufficient)?;
    let vol_avg = row.vol_avg.ok_or_else(insufficient)?;

    tracing::debug!(symbol = %series.symbol, advice = %result.advice, "signal evaluated");

    Ok(Analysis {
        symbol: series.symbol.clone(),
        advice: result.advice,
        observations: result.observations,
        snapshot: Snapshot {
            date: bar.date,
            last_price: bar.close,
            ma20,
            pct_vs_ma20: pct_vs_ma(bar.close, ma20),
            volume: bar.volume,
            vol_avg,
        },
    })
}

/// One flag per bar: did the rule say BUY on that bar?
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signal {
    pub date: NaiveDate,
    pub entry: bool,
}

/// Replay the rule over every bar. Bars without a full set of indicators are
/// never entries.
pub fn entry_signals(series: &Series, frame: &IndicatorFrame) -> Vec<Signal> {
    series
        .bars()
        .iter()
        .zip(frame.rows())
        .map(|(bar, row)| Signal {
            date: bar.date,
            entry: evaluate(bar, row).is_some_and(|r| r.advice == Advice::Buy),
        })
        .collect()
}
