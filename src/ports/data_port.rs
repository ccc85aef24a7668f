//! Market-data and universe provider port.

use crate::domain::error::SignalError;
use crate::domain::ohlcv::{Lookback, Series};
use crate::domain::universe::UniverseEntry;

pub trait DataPort {
    /// Daily bars for `symbol` covering `lookback`, oldest first.
    ///
    /// An unknown symbol or an empty result is `SignalError::EmptyResult`.
    fn fetch_series(&self, symbol: &str, lookback: Lookback) -> Result<Series, SignalError>;

    /// Known instruments, optionally restricted to one sector.
    fn list_symbols(&self, sector: Option<&str>) -> Result<Vec<UniverseEntry>, SignalError>;
}
