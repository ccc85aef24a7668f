//! RSI (Relative Strength Index) indicator.
//!
//! delta[i] = C[i] - C[i-1]; gain = max(delta, 0), loss = max(-delta, 0).
//! avg_gain / avg_loss are simple rolling means over the last n deltas.
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0 and avg_gain > 0: RSI = 100.
//! If both are 0 (flat window): undefined.
//!
//! Warmup: first n bars are undefined (n deltas are needed).

use crate::domain::indicator::{
    rolling_mean, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_PERIOD: usize = 14;

pub fn calculate_rsi(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.len() < 2 {
        return IndicatorSeries {
            indicator_type: IndicatorType::Rsi(period),
            values: bars.iter().map(|b| IndicatorPoint::undefined(b.date)).collect(),
        };
    }

    let mut gains = Vec::with_capacity(bars.len() - 1);
    let mut losses = Vec::with_capacity(bars.len() - 1);
    for pair in bars.windows(2) {
        let change = pair[1].close - pair[0].close;
        gains.push(change.max(0.0));
        losses.push((-change).max(0.0));
    }

    let avg_gains = rolling_mean(&gains, period);
    let avg_losses = rolling_mean(&losses, period);

    let mut values = Vec::with_capacity(bars.len());
    values.push(IndicatorPoint::undefined(bars[0].date));

    for (i, bar) in bars.iter().enumerate().skip(1) {
        let rsi = match (avg_gains[i - 1], avg_losses[i - 1]) {
            (Some(gain), Some(loss)) => rsi_from_averages(gain, loss),
            _ => None,
        };
        values.push(IndicatorPoint {
            date: bar.date,
            value: rsi.map(IndicatorValue::Simple),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss == 0.0 {
        return (avg_gain > 0.0).then_some(100.0);
    }
    let rsi = 100.0 - (100.0 / (1.0 + avg_gain / avg_loss));
    Some(rsi.clamp(0.0, 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bars(closes: &[f64]) -> Vec<OhlcvBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
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

    #[test]
    fn rsi_empty_bars() {
        let series = calculate_rsi(&[], 14);
        assert_eq!(series.values.len(), 0);
    }

    #[test]
    fn rsi_single_bar() {
        let series = calculate_rsi(&make_bars(&[100.0]), 14);
        assert_eq!(series.values.len(), 1);
        assert!(series.values[0].value.is_none());
    }

    #[test]
    fn rsi_warmup_period() {
        let closes: Vec<f64> = (1..=15).map(|i| 100.0 + (i as f64 % 5.0) * 2.0).collect();
        let series = calculate_rsi(&make_bars(&closes), 14);

        assert_eq!(series.values.len(), 15);
        for i in 0..14 {
            assert!(series.values[i].value.is_none(), "Bar {} should be undefined", i);
        }
        assert!(series.values[14].value.is_some(), "Bar 14 should be defined");
    }

    #[test]
    fn rsi_all_gains_saturates_at_100() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let series = calculate_rsi(&make_bars(&closes), 14);
        assert_eq!(series.values[14].simple(), Some(100.0));
    }

    #[test]
    fn rsi_all_losses_is_zero() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 - i as f64).collect();
        let series = calculate_rsi(&make_bars(&closes), 14);
        let rsi = series.values[14].simple().unwrap();
        assert!(rsi.abs() < f64::EPSILON);
    }

    #[test]
    fn rsi_flat_market_is_undefined() {
        let series = calculate_rsi(&make_bars(&[50.0; 20]), 14);
        assert!(series.values.iter().all(|p| p.value.is_none()));
    }

    #[test]
    fn rsi_simple_rolling_mean_known_value() {
        // Deltas over the last 3 bars: +2, -1, +1 → avg_gain 1, avg_loss 1/3 → RS 3 → RSI 75.
        let series = calculate_rsi(&make_bars(&[10.0, 12.0, 11.0, 12.0]), 3);
        let rsi = series.values[3].simple().unwrap();
        assert!((rsi - 75.0).abs() < 1e-9);
    }

    #[test]
    fn rsi_window_drops_old_deltas() {
        // With period 2 only the last two deltas (+0, -2) count.
        let series = calculate_rsi(&make_bars(&[10.0, 20.0, 20.0, 18.0]), 2);
        let rsi = series.values[3].simple().unwrap();
        assert!(rsi.abs() < 1e-9);
    }

    #[test]
    fn rsi_in_range() {
        let closes: Vec<f64> = (1..=40).map(|i| 100.0 + (i as f64 % 7.0 - 3.0) * 2.0).collect();
        let series = calculate_rsi(&make_bars(&closes), 14);
        for rsi in series.simple_values().into_iter().flatten() {
            assert!((0.0..=100.0).contains(&rsi), "RSI {} out of range", rsi);
        }
    }

    #[test]
    fn rsi_zero_period() {
        let series = calculate_rsi(&make_bars(&[100.0, 101.0]), 0);
        assert_eq!(series.values.len(), 2);
        assert!(series.values.iter().all(|p| p.value.is_none()));
    }

    #[test]
    fn rsi_indicator_type() {
        let series = calculate_rsi(&make_bars(&[100.0]), DEFAULT_PERIOD);
        assert_eq!(series.indicator_type, IndicatorType::Rsi(14));
    }
}
