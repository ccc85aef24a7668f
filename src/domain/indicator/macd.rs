//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Both EMAs and the signal EMA are seeded with their first input.
//! Default parameters: fast=12, slow=26, signal=9
//! Warmup: max(fast, slow) - 1 + signal - 1 bars are undefined.

use crate::domain::indicator::ema::ema_values;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub fn warmup(fast: usize, slow: usize, signal_period: usize) -> usize {
    fast.max(slow) - 1 + signal_period - 1
}

pub fn calculate_macd(
    bars: &[OhlcvBar],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Macd {
        fast,
        slow,
        signal: signal_period,
    };

    if fast == 0 || slow == 0 || signal_period == 0 {
        return IndicatorSeries {
            indicator_type,
            values: bars.iter().map(|b| IndicatorPoint::undefined(b.date)).collect(),
        };
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let ema_fast = ema_values(&closes, fast);
    let ema_slow = ema_values(&closes, slow);

    let macd_line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema_values(&macd_line, signal_period);

    let first_valid = warmup(fast, slow, signal_period);

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let value = (i >= first_valid).then(|| IndicatorValue::Macd {
                line: macd_line[i],
                signal: signal_line[i],
                histogram: macd_line[i] - signal_line[i],
            });
            IndicatorPoint {
                date: bar.date,
                value,
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bars(prices: &[f64]) -> Vec<OhlcvBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000,
            })
            .collect()
    }

    fn macd_default(bars: &[OhlcvBar]) -> IndicatorSeries {
        calculate_macd(bars, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
    }

    fn rising(n: usize) -> Vec<OhlcvBar> {
        let prices: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
        make_bars(&prices)
    }

    #[test]
    fn macd_warmup_default() {
        let series = macd_default(&rising(40));

        let warmup = DEFAULT_SLOW - 1 + DEFAULT_SIGNAL - 1;
        for i in 0..warmup {
            assert!(series.values[i].value.is_none(), "Index {} should be undefined", i);
        }
        assert!(series.values[warmup].value.is_some(), "Index {} should be defined", warmup);
    }

    #[test]
    fn macd_histogram_equals_line_minus_signal() {
        let series = macd_default(&rising(40));
        for point in &series.values {
            if let Some(IndicatorValue::Macd {
                line,
                signal,
                histogram,
            }) = point.value
            {
                assert!((histogram - (line - signal)).abs() < f64::EPSILON);
            }
        }
    }

    #[test]
    fn macd_line_is_ema_fast_minus_ema_slow() {
        let prices = [10.0, 20.0, 30.0, 25.0, 50.0, 45.0, 70.0, 80.0, 60.0, 100.0];
        let bars = make_bars(&prices);
        let series = calculate_macd(&bars, 3, 5, 2);

        let ema_fast = ema_values(&prices, 3);
        let ema_slow = ema_values(&prices, 5);

        for (i, point) in series.values.iter().enumerate() {
            if let Some(IndicatorValue::Macd { line, .. }) = point.value {
                assert!(
                    (line - (ema_fast[i] - ema_slow[i])).abs() < 1e-12,
                    "MACD line mismatch at index {}",
                    i
                );
            }
        }
    }

    #[test]
    fn macd_rising_prices_line_positive() {
        let series = macd_default(&rising(60));
        if let Some(IndicatorValue::Macd { line, .. }) = series.values[59].value {
            assert!(line > 0.0);
        } else {
            panic!("Expected MACD value");
        }
    }

    #[test]
    fn macd_short_series_is_all_undefined() {
        let series = macd_default(&rising(20));
        assert_eq!(series.values.len(), 20);
        assert!(series.values.iter().all(|p| p.value.is_none()));
    }

    #[test]
    fn macd_zero_period() {
        let bars = make_bars(&[100.0, 101.0, 102.0]);
        for (f, s, g) in [(0, 26, 9), (12, 0, 9), (12, 26, 0)] {
            let series = calculate_macd(&bars, f, s, g);
            assert_eq!(series.values.len(), 3);
            assert!(series.values.iter().all(|p| p.value.is_none()));
        }
    }

    #[test]
    fn macd_custom_parameters() {
        let series = calculate_macd(&rising(20), 5, 10, 3);
        let warmup = 10 - 1 + 3 - 1;
        assert!(series.values[warmup - 1].value.is_none());
        assert!(series.values[warmup].value.is_some());
        assert_eq!(
            series.indicator_type,
            IndicatorType::Macd {
                fast: 5,
                slow: 10,
                signal: 3
            }
        );
    }

    #[test]
    fn macd_empty_bars() {
        assert!(macd_default(&[]).values.is_empty());
    }
}
