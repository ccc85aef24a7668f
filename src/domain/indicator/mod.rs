//! Technical indicator implementations.
//!
//! Each indicator module turns a bar slice into an [`IndicatorSeries`] aligned
//! one-to-one with the input. Points that do not yet have a full window carry
//! `None` rather than a placeholder number. [`IndicatorFrame`] stitches the
//! series the signal rule needs into per-bar rows.

pub mod bollinger;
pub mod ema;
pub mod frame;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stddev;

pub use frame::{IndicatorFrame, IndicatorParams, IndicatorRow};

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub value: Option<IndicatorValue>,
}

impl IndicatorPoint {
    pub fn undefined(date: NaiveDate) -> Self {
        Self { date, value: None }
    }

    /// The scalar reading of a single-line indicator.
    pub fn simple(&self) -> Option<f64> {
        match self.value {
            Some(IndicatorValue::Simple(v)) => Some(v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    VolumeSma(usize),
    Rsi(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Scalar values by index, `None` where undefined or not single-line.
    pub fn simple_values(&self) -> Vec<Option<f64>> {
        self.values.iter().map(IndicatorPoint::simple).collect()
    }
}

/// Trailing arithmetic mean; `None` until `period` values are available.
pub(crate) fn rolling_mean(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                None
            } else {
                let window = &values[i + 1 - period..=i];
                Some(window.iter().sum::<f64>() / period as f64)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolling_mean_pads_partial_windows() {
        let means = rolling_mean(&[1.0, 2.0, 3.0, 4.0], 3);
        assert_eq!(means, vec![None, None, Some(2.0), Some(3.0)]);
    }

    #[test]
    fn rolling_mean_zero_period_is_undefined() {
        assert_eq!(rolling_mean(&[1.0, 2.0], 0), vec![None, None]);
    }

    #[test]
    fn point_simple_accessor() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let p = IndicatorPoint {
            date,
            value: Some(IndicatorValue::Simple(3.5)),
        };
        assert_eq!(p.simple(), Some(3.5));
        assert!(p.value.is_some());
        assert_eq!(IndicatorPoint::undefined(date).simple(), None);
    }
}
