//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod signal;
pub mod risk;
pub mod position;
pub mod backtest;
pub mod metrics;
pub mod opportunity;
pub mod universe;
pub mod config_validation;
pub mod error;
