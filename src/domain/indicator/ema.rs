//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seeded with the first value, then EMA[i] = x[i]*k + EMA[i-1]*(1-k).
//! The recursion runs from the first input; callers such as MACD decide from
//! which index the values are reported.

/// Raw recursive EMA over `values`, one output per input.
pub fn ema_values(values: &[f64], span: usize) -> Vec<f64> {
    if span == 0 {
        return Vec::new();
    }
    let k = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut ema = 0.0;
    for (i, &v) in values.iter().enumerate() {
        ema = if i == 0 { v } else { v * k + ema * (1.0 - k) };
        out.push(ema);
    }
    out
}
