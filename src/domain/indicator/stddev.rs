//! Population standard deviation, the band width behind Bollinger.
//!
//! STDDEV(n) = sqrt(sum((C[j] - mean)^2) / n) over the window.

/// Population (mean, stddev) of a window. Callers guarantee a non-empty slice.
pub(crate) fn population_stats(window: &[f64]) -> (f64, f64) {
    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let variance = window
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f64>()
        / n;
    (mean, variance.sqrt())
}
