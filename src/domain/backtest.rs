//! Single-position trade replay over a boolean entry series.
//!
//! The simulator is a two-state machine. While flat, a true entry flag opens a
//! long position at that bar's close with stop/target from [`risk_levels`].
//! While in a trade, every later bar's close is checked against the target and
//! the stop; entry flags are ignored. A position still open after the final
//! bar is closed at the final close.

use crate::domain::error::SignalError;
use crate::domain::indicator::{IndicatorFrame, IndicatorParams};
use crate::domain::metrics::BacktestReport;
use crate::domain::ohlcv::Series;
use crate::domain::position::{ExitReason, Position, Trade};
use crate::domain::risk::{self, risk_levels};
use crate::domain::signal::{entry_signals, minimum_bars, Signal};

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub risk_pct: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            risk_pct: risk::DEFAULT_RISK_PCT,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum State {
    Flat,
    InTrade(Position),
}

fn check_alignment(series: &Series, signals: &[Signal]) -> Result<(), SignalError> {
    if signals.len() != series.len() {
        return Err(SignalError::invalid_parameter(
            "signals",
            format!(
                "{} signals for {} bars of {}",
                signals.len(),
                series.len(),
                series.symbol
            ),
        ));
    }
    if let Some((bar, signal)) = series
        .bars()
        .iter()
        .zip(signals)
        .find(|(bar, signal)| bar.date != signal.date)
    {
        return Err(SignalError::invalid_parameter(
            "signals",
            format!("signal dated {} does not match bar {}", signal.date, bar.date),
        ));
    }
    Ok(())
}

/// Replay `signals` against `series` and summarise the resulting trades.
pub fn run_backtest(
    series: &Series,
    signals: &[Signal],
    config: &BacktestConfig,
) -> Result<BacktestReport, SignalError> {
    risk::validate_risk_pct(config.risk_pct)?;
    if series.is_empty() {
        return Err(SignalError::InsufficientData {
            symbol: series.symbol.clone(),
            bars: 0,
            minimum: 1,
        });
    }
    check_alignment(series, signals)?;

    let mut state = State::Flat;
    let mut trades: Vec<Trade> = Vec::new();

    for (bar, signal) in series.bars().iter().zip(signals) {
        state = match state {
            State::Flat if signal.entry => {
                let levels = risk_levels(bar.close, config.risk_pct)?;
                tracing::debug!(
                    symbol = %series.symbol,
                    date = %bar.date,
                    price = bar.close,
                    "trade opened"
                );
                State::InTrade(Position {
                    entry_date: bar.date,
                    entry_price: bar.close,
                    stop_loss: levels.stop_loss,
                    take_profit: levels.take_profit,
                })
            }
            State::Flat => State::Flat,
            State::InTrade(position) => {
                let reason = if position.should_take_profit(bar.close) {
                    Some(ExitReason::TakeProfit)
                } else if position.should_stop_loss(bar.close) {
                    Some(ExitReason::StopLoss)
                } else {
                    None
                };
                match reason {
                    Some(reason) => {
                        let trade = position.close(bar.date, bar.close, reason);
                        tracing::debug!(
                            symbol = %series.symbol,
                            date = %bar.date,
                            return_pct = trade.return_pct,
                            ?reason,
                            "trade closed"
                        );
                        trades.push(trade);
                        State::Flat
                    }
                    None => State::InTrade(position),
                }
            }
        };
    }

    if let State::InTrade(position) = state {
        // Series is non-empty, checked above.
        if let Some(last) = series.last() {
            trades.push(position.close(last.date, last.close, ExitReason::EndOfData));
        }
    }

    Ok(BacktestReport::from_trades(trades))
}

/// Compute indicators, derive entry flags from the signal rule, and replay them.
///
/// Fails with `InsufficientData` when the history is too short for the rule
/// to ever fire.
pub fn backtest_series(
    series: &Series,
    params: &IndicatorParams,
    config: &BacktestConfig,
) -> Result<BacktestReport, SignalError> {
    params.validate()?;
    let minimum = minimum_bars(params);
    if series.len() < minimum {
        return Err(SignalError::InsufficientData {
            symbol: series.symbol.clone(),
            bars: series.len(),
            minimum,
        });
    }
    let frame = IndicatorFrame::compute(series, params);
    let signals = entry_signals(series, &frame);
    run_backtest(series, &signals, config)
}
