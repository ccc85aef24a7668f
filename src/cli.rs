//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::cached_adapter::CachedDataPort;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{backtest_series, BacktestConfig};
use crate::domain::config_validation::{
    read_int, read_lookback, read_risk_pct, require_string, validate_config,
};
use crate::domain::error::SignalError;
use crate::domain::indicator::frame::{DEFAULT_VOLUME_WINDOW, MAX_VOLUME_WINDOW, MIN_VOLUME_WINDOW};
use crate::domain::indicator::IndicatorParams;
use crate::domain::metrics::BacktestReport;
use crate::domain::ohlcv::Lookback;
use crate::domain::opportunity::{self, ScanOptions, ScanOutcome};
use crate::domain::risk::DEFAULT_RISK_PCT;
use crate::domain::signal::{analyze, Analysis};
use crate::domain::universe::{filter_sector, parse_symbols, UniverseEntry};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(
    name = "signalbourse",
    about = "Technical-indicator signals, backtests and opportunity scans"
)]
pub struct Cli {
    /// Debug-level logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate the signal rule on a symbol's latest bar
    Analyze {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        symbol: String,
        /// 6mo, 1y or 2y
        #[arg(long)]
        lookback: Option<Lookback>,
        #[arg(long)]
        volume_window: Option<usize>,
    },
    /// Replay the signal rule over a symbol's history
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        symbol: String,
        /// Fraction of the entry price risked per trade, in (0, 1]
        #[arg(long)]
        risk_pct: Option<f64>,
        #[arg(long)]
        lookback: Option<Lookback>,
    },
    /// Rank the universe by strength of the bullish trend
    Scan {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        sector: Option<String>,
        /// Comma-separated symbols to scan instead of the configured universe
        #[arg(long)]
        symbols: Option<String>,
        #[arg(long)]
        top: Option<usize>,
        #[arg(long)]
        workers: Option<usize>,
    },
    /// List the configured universe
    Universe {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        sector: Option<String>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Everything the commands read from the INI file, with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub universe: Option<PathBuf>,
    pub cache_ttl: Duration,
    pub analysis_lookback: Lookback,
    pub params: IndicatorParams,
    pub risk_pct: f64,
    pub scan: ScanOptions,
}

pub fn run(cli: Cli) -> ExitCode {
    let mut stdout = io::stdout().lock();
    match cli.command {
        Command::Analyze {
            config,
            symbol,
            lookback,
            volume_window,
        } => run_analyze(&config, &symbol, lookback, volume_window, &mut stdout),
        Command::Backtest {
            config,
            symbol,
            risk_pct,
            lookback,
        } => run_backtest(&config, &symbol, risk_pct, lookback, &mut stdout),
        Command::Scan {
            config,
            sector,
            symbols,
            top,
            workers,
        } => run_scan(
            &config,
            sector.as_deref(),
            symbols.as_deref(),
            top,
            workers,
            &mut stdout,
        ),
        Command::Universe { config, sector } => {
            run_universe(&config, sector.as_deref(), &mut stdout)
        }
        Command::Validate { config } => run_validate(&config),
    }
}

fn fail(err: &SignalError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| fail(&e))
}

pub fn build_settings(config: &dyn ConfigPort) -> Result<Settings, SignalError> {
    validate_config(config)?;

    let data_dir = PathBuf::from(require_string(config, "data", "dir")?);
    // Relative universe paths resolve against the data directory.
    let universe = config
        .get_string("data", "universe")
        .map(|u| data_dir.join(u.trim()));
    let cache_ttl_secs = read_int(config, "data", "cache_ttl_secs", 900, 0..=i64::MAX)?;

    let volume_window = read_int(
        config,
        "analysis",
        "volume_window",
        DEFAULT_VOLUME_WINDOW as i64,
        MIN_VOLUME_WINDOW as i64..=MAX_VOLUME_WINDOW as i64,
    )?;

    let timeout_ms = read_int(
        config,
        "scan",
        "timeout_ms",
        opportunity::DEFAULT_TIMEOUT.as_millis() as i64,
        1..=i64::MAX,
    )?;

    Ok(Settings {
        data_dir,
        universe,
        cache_ttl: Duration::from_secs(cache_ttl_secs as u64),
        analysis_lookback: read_lookback(config, "analysis", Lookback::TwoYears)?,
        params: IndicatorParams {
            volume_window: volume_window as usize,
        },
        risk_pct: read_risk_pct(config, DEFAULT_RISK_PCT)?,
        scan: ScanOptions {
            lookback: read_lookback(config, "scan", Lookback::SixMonths)?,
            top_n: read_int(
                config,
                "scan",
                "top_n",
                opportunity::DEFAULT_TOP_N as i64,
                1..=i64::MAX,
            )? as usize,
            workers: read_int(
                config,
                "scan",
                "workers",
                opportunity::DEFAULT_WORKERS as i64,
                1..=opportunity::MAX_WORKERS as i64,
            )? as usize,
            timeout: Duration::from_millis(timeout_ms as u64),
        },
    })
}

pub fn load_settings(path: &Path) -> Result<Settings, ExitCode> {
    tracing::info!(config = %path.display(), "loading config");
    let adapter = load_config(path)?;
    build_settings(&adapter).map_err(|e| fail(&e))
}

/// CSV bars behind the fetch cache; a zero TTL skips the cache.
pub fn open_data_port(settings: &Settings) -> Arc<dyn DataPort + Send + Sync> {
    let mut csv = CsvAdapter::new(settings.data_dir.clone());
    if let Some(universe) = &settings.universe {
        csv = csv.with_universe(universe.clone());
    }
    if settings.cache_ttl.is_zero() {
        Arc::new(csv)
    } else {
        Arc::new(CachedDataPort::new(csv, settings.cache_ttl))
    }
}

pub fn format_analysis(analysis: &Analysis) -> String {
    let snap = &analysis.snapshot;
    let mut out = String::new();
    out.push_str(&format!("=== {} ({}) ===\n", analysis.symbol, snap.date));
    out.push_str(&format!("Advice:           {}\n", analysis.advice));
    out.push_str(&format!("Last Price:       {:.2}\n", snap.last_price));
    out.push_str(&format!("MA20:             {:.2}\n", snap.ma20));
    out.push_str(&format!("vs MA20:          {:+.2}%\n", snap.pct_vs_ma20));
    out.push_str(&format!(
        "Volume:           {} (avg {:.0})\n",
        snap.volume, snap.vol_avg
    ));
    out.push_str("Observations:\n");
    for obs in &analysis.observations {
        out.push_str(&format!("  {:<10} {}\n", obs.source, obs.polarity));
    }
    out
}

fn format_optional_pct(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}%", v * 100.0))
}

pub fn format_report(symbol: &str, report: &BacktestReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== Backtest: {symbol} ===\n"));
    out.push_str(&format!("Total Trades:     {}\n", report.trade_count));
    out.push_str(&format!(
        "Win Rate:         {}\n",
        format_optional_pct(report.win_rate)
    ));
    out.push_str(&format!(
        "Average Return:   {}\n",
        format_optional_pct(report.average_return_pct)
    ));
    out.push_str(&format!(
        "Profit Factor:    {}\n",
        report.profit_factor_display()
    ));
    if let Some(days) = report.avg_holding_days {
        out.push_str(&format!("Avg Holding:      {days:.1} days\n"));
    }
    if !report.trades.is_empty() {
        out.push_str("\n=== Trades ===\n");
        for trade in &report.trades {
            out.push_str(&format!(
                "  {} {:>10.2} -> {} {:>10.2}  {:+7.2}%  {:?}\n",
                trade.entry_date,
                trade.entry_price,
                trade.exit_date,
                trade.exit_price,
                trade.return_pct * 100.0,
                trade.exit_reason,
            ));
        }
    }
    out
}

pub fn format_scan(outcome: &ScanOutcome) -> String {
    let mut out = String::new();
    if outcome.opportunities.is_empty() {
        out.push_str("No symbols pass the bullish trend filter.\n");
    } else {
        out.push_str("=== Opportunities ===\n");
        for (rank, opp) in outcome.opportunities.iter().enumerate() {
            out.push_str(&format!(
                "{:>2}. {:<8} {:<30} {:>10.2} {:>+8.2}%\n",
                rank + 1,
                opp.symbol,
                opp.name,
                opp.last_price,
                opp.pct_vs_ma20,
            ));
        }
    }
    out.push_str(&format!(
        "\n{} rejected, {} skipped\n",
        outcome.rejected,
        outcome.skipped.len()
    ));
    out
}

fn emit(out: &mut dyn Write, text: &str) -> ExitCode {
    match out.write_all(text.as_bytes()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&SignalError::Io(e)),
    }
}

fn run_analyze(
    config_path: &Path,
    symbol: &str,
    lookback: Option<Lookback>,
    volume_window: Option<usize>,
    out: &mut dyn Write,
) -> ExitCode {
    let settings = match load_settings(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let params = IndicatorParams {
        volume_window: volume_window.unwrap_or(settings.params.volume_window),
    };
    let port = open_data_port(&settings);
    run_analyze_pipeline(
        port.as_ref(),
        symbol,
        lookback.unwrap_or(settings.analysis_lookback),
        &params,
        out,
    )
}

/// Fetch, analyse and print one symbol.
///
/// A short history prints "no signal yet" and succeeds; a symbol with no data
/// at all prints the same note but exits with the data error code.
pub fn run_analyze_pipeline(
    port: &dyn DataPort,
    symbol: &str,
    lookback: Lookback,
    params: &IndicatorParams,
    out: &mut dyn Write,
) -> ExitCode {
    let symbol = symbol.trim().to_uppercase();
    let result = port
        .fetch_series(&symbol, lookback)
        .and_then(|series| analyze(&series, params));

    match result {
        Ok(analysis) => emit(out, &format_analysis(&analysis)),
        Err(e) if e.is_data_shortage() => no_signal_yet(&symbol, &e, out),
        Err(e) => fail(&e),
    }
}

fn no_signal_yet(symbol: &str, e: &SignalError, out: &mut dyn Write) -> ExitCode {
    let code = emit(out, &format!("{symbol}: no signal yet ({e})\n"));
    if matches!(e, SignalError::EmptyResult { .. }) {
        e.into()
    } else {
        code
    }
}

fn run_backtest(
    config_path: &Path,
    symbol: &str,
    risk_pct: Option<f64>,
    lookback: Option<Lookback>,
    out: &mut dyn Write,
) -> ExitCode {
    let settings = match load_settings(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let config = BacktestConfig {
        risk_pct: risk_pct.unwrap_or(settings.risk_pct),
    };
    let port = open_data_port(&settings);
    run_backtest_pipeline(
        port.as_ref(),
        symbol,
        lookback.unwrap_or(settings.analysis_lookback),
        &settings.params,
        &config,
        out,
    )
}

pub fn run_backtest_pipeline(
    port: &dyn DataPort,
    symbol: &str,
    lookback: Lookback,
    params: &IndicatorParams,
    config: &BacktestConfig,
    out: &mut dyn Write,
) -> ExitCode {
    let symbol = symbol.trim().to_uppercase();
    let report = port
        .fetch_series(&symbol, lookback)
        .and_then(|series| {
            tracing::info!(symbol = %symbol, bars = series.len(), risk_pct = config.risk_pct, "running backtest");
            backtest_series(&series, params, config)
        });

    match report {
        Ok(report) => emit(out, &format_report(&symbol, &report)),
        Err(e) if e.is_data_shortage() => no_signal_yet(&symbol, &e, out),
        Err(e) => fail(&e),
    }
}

fn run_scan(
    config_path: &Path,
    sector: Option<&str>,
    symbols: Option<&str>,
    top: Option<usize>,
    workers: Option<usize>,
    out: &mut dyn Write,
) -> ExitCode {
    let settings = match load_settings(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let options = ScanOptions {
        top_n: top.unwrap_or(settings.scan.top_n),
        workers: workers.unwrap_or(settings.scan.workers),
        ..settings.scan.clone()
    };
    let port = open_data_port(&settings);

    let universe = match resolve_universe(port.as_ref(), sector, symbols) {
        Ok(u) => u,
        Err(e) => return fail(&e),
    };

    run_scan_pipeline(port, &universe, &options, &settings.params, out)
}

/// Explicit `--symbols` win over the configured universe; `--sector` filters
/// either.
pub fn resolve_universe(
    port: &dyn DataPort,
    sector: Option<&str>,
    symbols: Option<&str>,
) -> Result<Vec<UniverseEntry>, SignalError> {
    match symbols {
        Some(list) => {
            let entries = parse_symbols(list)
                .map_err(|e| SignalError::invalid_parameter("symbols", e.to_string()))?;
            Ok(filter_sector(entries, sector))
        }
        None => port.list_symbols(sector),
    }
}

pub fn run_scan_pipeline(
    port: Arc<dyn DataPort + Send + Sync>,
    universe: &[UniverseEntry],
    options: &ScanOptions,
    params: &IndicatorParams,
    out: &mut dyn Write,
) -> ExitCode {
    if universe.is_empty() {
        let err = SignalError::EmptyResult {
            symbol: "universe".to_string(),
        };
        return fail(&err);
    }
    tracing::info!(
        symbols = universe.len(),
        workers = options.workers,
        lookback = %options.lookback,
        "scanning universe"
    );

    match opportunity::scan(port, universe, options, params) {
        Ok(outcome) => {
            for skipped in &outcome.skipped {
                tracing::warn!(symbol = %skipped.symbol, reason = %skipped.reason, "skipped");
            }
            emit(out, &format_scan(&outcome))
        }
        Err(e) => fail(&e),
    }
}

fn run_universe(config_path: &Path, sector: Option<&str>, out: &mut dyn Write) -> ExitCode {
    let settings = match load_settings(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let port = open_data_port(&settings);
    match port.list_symbols(sector) {
        Ok(entries) => emit(out, &format_universe(&entries)),
        Err(e) => fail(&e),
    }
}

pub fn format_universe(entries: &[UniverseEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&format!(
            "{:<8} {:<30} {}\n",
            entry.symbol,
            entry.name,
            entry.sector.as_deref().unwrap_or("-")
        ));
    }
    out.push_str(&format!("{} symbols\n", entries.len()));
    out
}

pub fn run_validate(config_path: &Path) -> ExitCode {
    match load_settings(config_path) {
        Ok(settings) => {
            eprintln!("Configuration valid.");
            eprintln!("  Data dir:   {}", settings.data_dir.display());
            eprintln!("  Lookback:   {} (scan {})", settings.analysis_lookback, settings.scan.lookback);
            eprintln!("  Risk:       {:.2}%", settings.risk_pct * 100.0);
            eprintln!("  Workers:    {}", settings.scan.workers);
            ExitCode::SUCCESS
        }
        Err(code) => code,
    }
}
