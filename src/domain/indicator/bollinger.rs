//! Bollinger Bands indicator.
//!
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! StdDev is the population standard deviation (divides by N, not N-1).
//!
//! Default parameters: period=20, multiplier=2.0
//! Warmup: first (period-1) bars are undefined.

use crate::domain::indicator::stddev::population_stats;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULT_X100: u32 = 200;

pub fn calculate_bollinger(
    bars: &[OhlcvBar],
    period: usize,
    stddev_mult_x100: u32,
) -> IndicatorSeries {
    let mult = stddev_mult_x100 as f64 / 100.0;
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let value = (period > 0 && i + 1 >= period).then(|| {
                let (middle, stddev) = population_stats(&closes[i + 1 - period..=i]);
                IndicatorValue::Bollinger {
                    upper: middle + mult * stddev,
                    middle,
                    lower: middle - mult * stddev,
                }
            });
            IndicatorPoint {
                date: bar.date,
                value,
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Bollinger {
            period,
            stddev_mult_x100,
        },
        values,
    }
}
