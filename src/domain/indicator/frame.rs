//! Per-bar indicator rows aligned with a [`Series`].

use crate::domain::error::SignalError;
use crate::domain::indicator::bollinger::{self, calculate_bollinger};
use crate::domain::indicator::macd::{self, calculate_macd};
use crate::domain::indicator::rsi::{self, calculate_rsi};
use crate::domain::indicator::sma::{calculate_sma, calculate_volume_sma};
use crate::domain::indicator::IndicatorValue;
use crate::domain::ohlcv::Series;
use chrono::NaiveDate;

pub const MA_SHORT: usize = 20;
pub const MA_LONG: usize = 50;
pub const DEFAULT_VOLUME_WINDOW: usize = 20;
pub const MIN_VOLUME_WINDOW: usize = 5;
pub const MAX_VOLUME_WINDOW: usize = 50;

/// Tunable indicator inputs. Every other window is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorParams {
    pub volume_window: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            volume_window: DEFAULT_VOLUME_WINDOW,
        }
    }
}

impl IndicatorParams {
    pub fn validate(&self) -> Result<(), SignalError> {
        if !(MIN_VOLUME_WINDOW..=MAX_VOLUME_WINDOW).contains(&self.volume_window) {
            return Err(SignalError::invalid_parameter(
                "volume_window",
                format!(
                    "{} outside {}..={}",
                    self.volume_window, MIN_VOLUME_WINDOW, MAX_VOLUME_WINDOW
                ),
            ));
        }
        Ok(())
    }

    /// Longest trailing window the signal rule depends on.
    pub fn max_window(&self) -> usize {
        MA_LONG.max(self.volume_window)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorRow {
    pub date: NaiveDate,
    pub ma20: Option<f64>,
    pub ma50: Option<f64>,
    pub vol_avg: Option<f64>,
    pub rsi14: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub boll_upper: Option<f64>,
    pub boll_lower: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorFrame {
    rows: Vec<IndicatorRow>,
}

impl IndicatorFrame {
    /// Never fails: rows without a full window simply carry `None`.
    pub fn compute(series: &Series, params: &IndicatorParams) -> Self {
        let bars = series.bars();

        let ma20 = calculate_sma(bars, MA_SHORT).simple_values();
        let ma50 = calculate_sma(bars, MA_LONG).simple_values();
        let vol_avg = calculate_volume_sma(bars, params.volume_window).simple_values();
        let rsi14 = calculate_rsi(bars, rsi::DEFAULT_PERIOD).simple_values();
        let macd_series = calculate_macd(
            bars,
            macd::DEFAULT_FAST,
            macd::DEFAULT_SLOW,
            macd::DEFAULT_SIGNAL,
        );
        let boll = calculate_bollinger(
            bars,
            bollinger::DEFAULT_PERIOD,
            bollinger::DEFAULT_MULT_X100,
        );

        let rows = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| {
                let (macd, macd_signal) = match macd_series.values[i].value {
                    Some(IndicatorValue::Macd { line, signal, .. }) => (Some(line), Some(signal)),
                    _ => (None, None),
                };
                let (boll_upper, boll_lower) = match boll.values[i].value {
                    Some(IndicatorValue::Bollinger { upper, lower, .. }) => {
                        (Some(upper), Some(lower))
                    }
                    _ => (None, None),
                };
                IndicatorRow {
                    date: bar.date,
                    ma20: ma20[i],
                    ma50: ma50[i],
                    vol_avg: vol_avg[i],
                    rsi14: rsi14[i],
                    macd,
                    macd_signal,
                    boll_upper,
                    boll_lower,
                }
            })
            .collect();

        Self { rows }
    }

    pub fn rows(&self) -> &[IndicatorRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&IndicatorRow> {
        self.rows.get(index)
    }

    pub fn latest(&self) -> Option<&IndicatorRow> {
        self.rows.last()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::OhlcvBar;

    fn rising_series(n: usize) -> Series {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = (0..n)
            .map(|i| OhlcvBar {
                date: start + chrono::Duration::days(i as i64),
                open: 100.0 + i as f64,
                high: 101.0 + i as f64,
                low: 99.0 + i as f64,
                close: 100.0 + i as f64,
                volume: 1000 + i as i64,
            })
            .collect();
        Series::new("TEST", bars).unwrap()
    }

    #[test]
    fn frame_is_aligned_with_series() {
        let series = rising_series(60);
        let frame = IndicatorFrame::compute(&series, &IndicatorParams::default());
        assert_eq!(frame.len(), 60);
        for (bar, row) in series.bars().iter().zip(frame.rows()) {
            assert_eq!(bar.date, row.date);
        }
    }

    #[test]
    fn frame_warmups() {
        let frame = IndicatorFrame::compute(&rising_series(60), &IndicatorParams::default());
        assert!(frame.row(18).unwrap().ma20.is_none());
        assert!(frame.row(19).unwrap().ma20.is_some());
        assert!(frame.row(48).unwrap().ma50.is_none());
        assert!(frame.row(49).unwrap().ma50.is_some());
        assert!(frame.row(13).unwrap().rsi14.is_none());
        assert!(frame.row(14).unwrap().rsi14.is_some());
        assert!(frame.row(32).unwrap().macd.is_none());
        assert!(frame.row(33).unwrap().macd_signal.is_some());
        assert!(frame.row(18).unwrap().boll_upper.is_none());
        assert!(frame.row(19).unwrap().boll_lower.is_some());
    }

    #[test]
    fn frame_short_series_has_no_values() {
        let frame = IndicatorFrame::compute(&rising_series(5), &IndicatorParams::default());
        let row = frame.latest().unwrap();
        assert!(row.ma20.is_none());
        assert!(row.vol_avg.is_none());
        assert!(row.macd.is_none());
    }

    #[test]
    fn frame_empty_series() {
        let series = Series::new("EMPTY", vec![]).unwrap();
        let frame = IndicatorFrame::compute(&series, &IndicatorParams::default());
        assert!(frame.is_empty());
        assert!(frame.latest().is_none());
    }

    #[test]
    fn volume_window_is_respected() {
        let params = IndicatorParams { volume_window: 5 };
        let frame = IndicatorFrame::compute(&rising_series(10), &params);
        assert!(frame.row(3).unwrap().vol_avg.is_none());
        // volumes 1000..=1004 → mean 1002
        assert_eq!(frame.row(4).unwrap().vol_avg, Some(1002.0));
    }

    #[test]
    fn params_validation() {
        assert!(IndicatorParams::default().validate().is_ok());
        assert!(IndicatorParams { volume_window: 4 }.validate().is_err());
        assert!(IndicatorParams { volume_window: 51 }.validate().is_err());
        assert_eq!(IndicatorParams { volume_window: 50 }.max_window(), 50);
    }
}
