//! Stop-loss / take-profit sizing at a fixed 1:2 risk/reward ratio.

use crate::domain::error::SignalError;

pub const DEFAULT_RISK_PCT: f64 = 0.05;
pub const REWARD_MULTIPLE: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskLevels {
    pub stop_loss: f64,
    pub take_profit: f64,
}

/// Reject a risk fraction outside (0, 1].
pub fn validate_risk_pct(risk_pct: f64) -> Result<(), SignalError> {
    if !(risk_pct > 0.0 && risk_pct <= 1.0) {
        return Err(SignalError::invalid_parameter(
            "risk_pct",
            format!("{risk_pct} must be in (0, 1]"),
        ));
    }
    Ok(())
}

/// stop = entry × (1 − r), target = entry × (1 + 2r).
pub fn risk_levels(entry_price: f64, risk_pct: f64) -> Result<RiskLevels, SignalError> {
    validate_risk_pct(risk_pct)?;
    if !(entry_price.is_finite() && entry_price > 0.0) {
        return Err(SignalError::invalid_parameter(
            "entry_price",
            format!("{entry_price} must be positive"),
        ));
    }
    Ok(RiskLevels {
        stop_loss: entry_price * (1.0 - risk_pct),
        take_profit: entry_price * (1.0 + REWARD_MULTIPLE * risk_pct),
    })
}
