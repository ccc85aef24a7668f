//! Simple moving averages over close and over volume.
//!
//! SMA(n)[i] = mean(x[i-n+1..=i]). Warmup: first (n-1) bars are undefined.

use crate::domain::indicator::{
    rolling_mean, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_sma(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values: to_points(bars, rolling_mean(&closes, period)),
    }
}

pub fn calculate_volume_sma(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume as f64).collect();
    IndicatorSeries {
        indicator_type: IndicatorType::VolumeSma(period),
        values: to_points(bars, rolling_mean(&volumes, period)),
    }
}

fn to_points(bars: &[OhlcvBar], means: Vec<Option<f64>>) -> Vec<IndicatorPoint> {
    bars.iter()
        .zip(means)
        .map(|(bar, mean)| IndicatorPoint {
            date: bar.date,
            value: mean.map(IndicatorValue::Simple),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bars(closes: &[f64], volumes: &[i64]) -> Vec<OhlcvBar> {
        closes
            .iter()
            .zip(volumes)
            .enumerate()
            .map(|(i, (&close, &volume))| OhlcvBar {
                date: NaiveDate::from_ymd_opt(2024, 1, (i + 1) as u32).unwrap(),
                open: close,
                high: close,
                low: close,
                close,
                volume,
            })
            .collect()
    }

    #[test]
    fn sma_warmup() {
        let bars = make_bars(&[10.0, 20.0, 30.0, 40.0], &[1, 1, 1, 1]);
        let series = calculate_sma(&bars, 3);
        assert!(series.values[0].value.is_none());
        assert!(series.values[1].value.is_none());
        assert_eq!(series.values[2].simple(), Some(20.0));
        assert_eq!(series.values[3].simple(), Some(30.0));
    }

    #[test]
    fn sma_shorter_than_window_is_all_undefined() {
        let bars = make_bars(&[10.0, 20.0], &[1, 1]);
        let series = calculate_sma(&bars, 20);
        assert_eq!(series.values.len(), 2);
        assert!(series.values.iter().all(|p| p.value.is_none()));
    }

    #[test]
    fn volume_sma_uses_volume() {
        let bars = make_bars(&[1.0, 1.0, 1.0], &[100, 200, 600]);
        let series = calculate_volume_sma(&bars, 3);
        assert_eq!(series.indicator_type, IndicatorType::VolumeSma(3));
        assert_eq!(series.values[2].simple(), Some(300.0));
    }

    #[test]
    fn sma_keeps_dates_aligned() {
        let bars = make_bars(&[1.0, 2.0, 3.0], &[1, 1, 1]);
        let series = calculate_sma(&bars, 2);
        for (bar, point) in bars.iter().zip(&series.values) {
            assert_eq!(bar.date, point.date);
        }
    }
}
