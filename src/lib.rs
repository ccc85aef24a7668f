//! signalbourse: technical-indicator signals, single-position backtests and
//! opportunity scans over daily bars.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
pub mod logging;
