//! CSV file data adapter.
//!
//! Bars live in `<dir>/<SYMBOL>.csv` with a `date,open,high,low,close,volume`
//! header. The universe is either a `symbol,name,sector` CSV or, when none is
//! configured, every bar file found in the data directory.

use crate::domain::error::SignalError;
use crate::domain::ohlcv::{Lookback, OhlcvBar, Series};
use crate::domain::universe::{dedup_symbols, filter_sector, UniverseEntry};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub struct CsvAdapter {
    data_dir: PathBuf,
    universe_path: Option<PathBuf>,
}

impl CsvAdapter {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            universe_path: None,
        }
    }

    pub fn with_universe(mut self, universe_path: PathBuf) -> Self {
        self.universe_path = Some(universe_path);
        self
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.data_dir.join(format!("{symbol}.csv"))
    }

    fn read_bars(&self, symbol: &str) -> Result<Vec<OhlcvBar>, SignalError> {
        let path = self.csv_path(symbol);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SignalError::EmptyResult {
                    symbol: symbol.to_string(),
                });
            }
            Err(e) => {
                return Err(SignalError::DataSource {
                    reason: format!("failed to read {}: {e}", path.display()),
                });
            }
        };

        let malformed = |reason: String| SignalError::MalformedSeries {
            symbol: symbol.to_string(),
            reason,
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for (line, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| malformed(format!("CSV parse error: {e}")))?;
            // Header is line 1.
            let row = line + 2;

            let date_str = column(&record, 0, "date", row).map_err(&malformed)?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
                .map_err(|e| malformed(format!("row {row}: invalid date '{date_str}': {e}")))?;

            bars.push(OhlcvBar {
                date,
                open: parse_column(&record, 1, "open", row).map_err(&malformed)?,
                high: parse_column(&record, 2, "high", row).map_err(&malformed)?,
                low: parse_column(&record, 3, "low", row).map_err(&malformed)?,
                close: parse_column(&record, 4, "close", row).map_err(&malformed)?,
                volume: parse_column(&record, 5, "volume", row).map_err(&malformed)?,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    fn read_universe_file(&self, path: &Path) -> Result<Vec<UniverseEntry>, SignalError> {
        let content = fs::read_to_string(path).map_err(|e| SignalError::DataSource {
            reason: format!("failed to read universe {}: {e}", path.display()),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut entries = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| SignalError::DataSource {
                reason: format!("universe parse error: {e}"),
            })?;
            let symbol = record.get(0).map(str::trim).unwrap_or_default();
            if symbol.is_empty() {
                continue;
            }
            let symbol = symbol.to_uppercase();
            let name = record
                .get(1)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map_or_else(|| symbol.clone(), str::to_string);
            let sector = record
                .get(2)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string);
            entries.push(UniverseEntry {
                symbol,
                name,
                sector,
            });
        }

        Ok(dedup_symbols(entries))
    }

    fn scan_data_dir(&self) -> Result<Vec<UniverseEntry>, SignalError> {
        let entries = fs::read_dir(&self.data_dir).map_err(|e| SignalError::DataSource {
            reason: format!(
                "failed to read directory {}: {e}",
                self.data_dir.display()
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SignalError::DataSource {
                reason: format!("directory entry error: {e}"),
            })?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols.iter().map(|s| UniverseEntry::bare(s)).collect())
    }
}

fn column<'a>(
    record: &'a csv::StringRecord,
    index: usize,
    name: &str,
    row: usize,
) -> Result<&'a str, String> {
    record
        .get(index)
        .map(str::trim)
        .ok_or_else(|| format!("row {row}: missing {name} column"))
}

fn parse_column<T>(record: &csv::StringRecord, index: usize, name: &str, row: usize) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = column(record, index, name, row)?;
    raw.parse()
        .map_err(|e| format!("row {row}: invalid {name} value '{raw}': {e}"))
}

impl DataPort for CsvAdapter {
    fn fetch_series(&self, symbol: &str, lookback: Lookback) -> Result<Series, SignalError> {
        let bars = self.read_bars(symbol)?;
        let Some(last) = bars.last() else {
            return Err(SignalError::EmptyResult {
                symbol: symbol.to_string(),
            });
        };
        let start = lookback.start_from(last.date);
        let series = Series::new(symbol, bars)?.since(start);
        tracing::debug!(symbol, %lookback, bars = series.len(), "series loaded from csv");
        Ok(series)
    }

    fn list_symbols(&self, sector: Option<&str>) -> Result<Vec<UniverseEntry>, SignalError> {
        let entries = match &self.universe_path {
            Some(path) => self.read_universe_file(path)?,
            None => self.scan_data_dir()?,
        };
        Ok(filter_sector(entries, sector))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "date,open,high,low,close,volume\n\
            2024-01-16,105.0,115.0,100.0,110.0,60000\n\
            2024-01-15,100.0,110.0,90.0,105.0,50000\n\
            2024-01-17,110.0,120.0,105.0,115.0,55000\n";

        fs::write(path.join("AAPL.csv"), csv_content).unwrap();
        fs::write(path.join("MSFT.csv"), "date,open,high,low,close,volume\n").unwrap();
        fs::write(
            path.join("BAD.csv"),
            "date,open,high,low,close,volume\n2024-01-15,1,1,1,abc,10\n",
        )
        .unwrap();
        fs::write(
            path.join("DUP.csv"),
            "date,open,high,low,close,volume\n2024-01-15,1,1,1,1,10\n2024-01-15,1,1,1,1,10\n",
        )
        .unwrap();

        (dir, path)
    }

    #[test]
    fn fetch_series_returns_sorted_bars() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let series = adapter.fetch_series("AAPL", Lookback::TwoYears).unwrap();

        assert_eq!(series.len(), 3);
        let first = &series.bars()[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(first.open, 100.0);
        assert_eq!(first.high, 110.0);
        assert_eq!(first.low, 90.0);
        assert_eq!(first.close, 105.0);
        assert_eq!(first.volume, 50000);
    }

    #[test]
    fn fetch_series_trims_to_lookback() {
        let dir = TempDir::new().unwrap();
        let csv_content = "date,open,high,low,close,volume\n\
            2022-01-03,1,1,1,10,100\n\
            2023-09-01,1,1,1,11,100\n\
            2024-01-02,1,1,1,12,100\n";
        fs::write(dir.path().join("OLD.csv"), csv_content).unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());

        assert_eq!(adapter.fetch_series("OLD", Lookback::SixMonths).unwrap().len(), 2);
        assert_eq!(adapter.fetch_series("OLD", Lookback::OneYear).unwrap().len(), 2);
        assert_eq!(adapter.fetch_series("OLD", Lookback::TwoYears).unwrap().len(), 3);
    }

    #[test]
    fn missing_file_and_header_only_are_empty_results() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let err = adapter.fetch_series("XYZ", Lookback::SixMonths).unwrap_err();
        assert!(matches!(err, SignalError::EmptyResult { .. }));

        let err = adapter.fetch_series("MSFT", Lookback::SixMonths).unwrap_err();
        assert!(matches!(err, SignalError::EmptyResult { .. }));
    }

    #[test]
    fn bad_rows_are_malformed() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let err = adapter.fetch_series("BAD", Lookback::SixMonths).unwrap_err();
        assert!(matches!(err, SignalError::MalformedSeries { ref reason, .. } if reason.contains("close")));

        let err = adapter.fetch_series("DUP", Lookback::SixMonths).unwrap_err();
        assert!(matches!(err, SignalError::MalformedSeries { .. }));
    }

    #[test]
    fn negative_volume_is_malformed() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("NEG.csv"),
            "date,open,high,low,close,volume\n2024-01-15,1,1,1,1,-10\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());

        let err = adapter.fetch_series("NEG", Lookback::SixMonths).unwrap_err();
        assert!(matches!(err, SignalError::MalformedSeries { ref reason, .. } if reason.contains("volume")));
    }

    #[test]
    fn list_symbols_from_directory() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let symbols: Vec<_> = adapter
            .list_symbols(None)
            .unwrap()
            .into_iter()
            .map(|e| e.symbol)
            .collect();
        assert_eq!(symbols, vec!["AAPL", "BAD", "DUP", "MSFT"]);
    }

    #[test]
    fn list_symbols_from_universe_file() {
        let (dir, path) = setup_test_data();
        let universe = dir.path().join("universe.txt");
        fs::write(
            &universe,
            "symbol,name,sector\n\
             aapl,Apple Inc.,Technology\n\
             XOM,Exxon Mobil,Energy\n\
             MSFT,,Technology\n\
             AAPL,Duplicate,Energy\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(path).with_universe(universe);

        let all = adapter.list_symbols(None).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].name, "Apple Inc.");
        assert_eq!(all[2].name, "MSFT");

        let tech = adapter.list_symbols(Some("Technology")).unwrap();
        let symbols: Vec<_> = tech.iter().map(|e| e.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAPL", "MSFT"]);
    }
}
