//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::adapters::console_report::ConsoleReportAdapter;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{BacktestConfig, StrategyOutcome, run_comparison};
use crate::domain::config_validation::{parse_date, validate_backtest_config};
use crate::domain::error::DcaError;
use crate::domain::strategy::{
    DEFAULT_DRAWDOWN_THRESHOLD, DEFAULT_MONTHLY_CONTRIB, DEFAULT_MONTHLY_GROWTH,
    DEFAULT_SMA_WINDOW, ROLLING_HIGH_DAYS, Strategy, StrategyKind, parse_strategy_list,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "dcasim", about = "Dollar-cost averaging strategy backtester")]
pub struct Cli {
    /// Log level when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest and compare the selected strategies
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: Option<String>,
        /// Directory holding <TICKER>.csv price files
        #[arg(long)]
        data: Option<PathBuf>,
        /// Comma-separated strategy keys, e.g. "dca,lump_sum"
        #[arg(long)]
        strategies: Option<String>,
        /// Directory for CSV export
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the data range of a ticker's price file
    Info {
        #[arg(long)]
        ticker: Option<String>,
        #[arg(long)]
        data: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// List tickers available in the data directory
    ListSymbols {
        #[arg(long)]
        data: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Values given on the command line that take precedence over the INI file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub ticker: Option<String>,
    pub data: Option<PathBuf>,
    pub strategies: Option<String>,
    pub output: Option<PathBuf>,
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `level`.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("dcasim={level}")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            ticker,
            data,
            strategies,
            output,
            dry_run,
        } => {
            let overrides = Overrides {
                ticker,
                data,
                strategies,
                output,
            };
            if dry_run {
                run_dry_run(&config, &overrides)
            } else {
                run_backtest(&config, &overrides)
            }
        }
        Command::Validate { config } => run_validate(&config),
        Command::Info {
            ticker,
            data,
            config,
        } => run_info(ticker.as_deref(), data, config.as_deref()),
        Command::ListSymbols { data, config } => run_list_symbols(data, config.as_deref()),
    }
}

fn fail(err: &DcaError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| fail(&e))
}

fn load_optional_config(path: Option<&Path>) -> Result<Option<FileConfigAdapter>, ExitCode> {
    path.map(load_config).transpose()
}

fn positive_usize(
    adapter: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, DcaError> {
    let value = adapter.get_int(section, key)?.unwrap_or(default as i64);
    usize::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| DcaError::config(format!("[{}] {}", section, key), "must be positive"))
}

pub fn resolve_ticker(
    ticker_override: Option<&str>,
    adapter: Option<&dyn ConfigPort>,
) -> Result<String, DcaError> {
    ticker_override
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| adapter.and_then(|a| a.get_trimmed("data", "ticker")))
        .map(|t| t.to_uppercase())
        .ok_or_else(|| DcaError::ConfigMissing {
            section: "data".into(),
            key: "ticker".into(),
        })
}

pub fn resolve_data_dir(data_override: Option<PathBuf>, adapter: Option<&dyn ConfigPort>) -> PathBuf {
    data_override
        .or_else(|| {
            adapter
                .and_then(|a| a.get_trimmed("data", "path"))
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn resolve_output_dir(overrides: &Overrides, adapter: &dyn ConfigPort) -> Option<PathBuf> {
    overrides
        .output
        .clone()
        .or_else(|| adapter.get_trimmed("report", "output_dir").map(PathBuf::from))
}

pub fn build_backtest_config(
    adapter: &dyn ConfigPort,
    overrides: &Overrides,
) -> Result<BacktestConfig, DcaError> {
    let ticker = resolve_ticker(overrides.ticker.as_deref(), Some(adapter))?;

    let strategies = match &overrides.strategies {
        Some(list) => parse_strategy_list(list)?,
        None => match adapter.get_trimmed("simulation", "strategies") {
            Some(list) => parse_strategy_list(&list)?,
            None => vec![StrategyKind::StandardDca],
        },
    };

    Ok(BacktestConfig {
        ticker,
        start_date: parse_date(adapter, "data", "start_date")?,
        end_date: parse_date(adapter, "data", "end_date")?,
        monthly_contrib: adapter
            .get_double("simulation", "monthly_contrib")?
            .unwrap_or(DEFAULT_MONTHLY_CONTRIB),
        strategies,
        drawdown_threshold: adapter
            .get_double("double_down", "threshold")?
            .unwrap_or(DEFAULT_DRAWDOWN_THRESHOLD),
        rolling_high_days: positive_usize(adapter, "double_down", "lookback", ROLLING_HIGH_DAYS)?,
        sma_window: positive_usize(adapter, "sma", "window", DEFAULT_SMA_WINDOW)?,
        monthly_growth: adapter
            .get_double("value_averaging", "monthly_growth")?
            .unwrap_or(DEFAULT_MONTHLY_GROWTH),
    })
}

/// One line per strategy with the parameters it will run with.
pub fn describe_strategy(strategy: &Strategy) -> String {
    let params = match strategy {
        Strategy::StandardDca(p) => format!("monthly_contrib={}", p.monthly_contrib),
        Strategy::DoubleDownDca(p) => format!(
            "monthly_contrib={}, threshold={}, lookback={}",
            p.monthly_contrib, p.threshold, p.lookback
        ),
        Strategy::LumpSum(p) => format!("monthly_contrib={}", p.monthly_contrib),
        Strategy::SmaMomentum(p) | Strategy::SmaMeanReversion(p) => {
            format!("monthly_contrib={}, window={}", p.monthly_contrib, p.window)
        }
        Strategy::ValueAveraging(p) => format!(
            "monthly_contrib={}, monthly_growth={}",
            p.monthly_contrib, p.monthly_growth
        ),
    };
    format!("{:<20} {} ({})", strategy.kind().key(), strategy.kind().label(), params)
}

/// Validate the configuration file and resolve it into a [`BacktestConfig`],
/// checking every strategy's parameters before any data is read.
fn prepare(config_path: &Path, overrides: &Overrides) -> Result<(FileConfigAdapter, BacktestConfig), ExitCode> {
    tracing::info!(path = %config_path.display(), "loading config");
    let adapter = load_config(config_path)?;

    validate_backtest_config(&adapter).map_err(|e| fail(&e))?;
    let bt_config = build_backtest_config(&adapter, overrides).map_err(|e| fail(&e))?;
    for strategy in bt_config.build_strategies() {
        strategy.validate().map_err(|e| fail(&e))?;
    }
    Ok((adapter, bt_config))
}

fn run_backtest(config_path: &Path, overrides: &Overrides) -> ExitCode {
    let (adapter, bt_config) = match prepare(config_path, overrides) {
        Ok(v) => v,
        Err(code) => return code,
    };

    let data_port = CsvAdapter::new(resolve_data_dir(overrides.data.clone(), Some(&adapter)));
    let output_dir = resolve_output_dir(overrides, &adapter);

    let outcomes = match run_backtest_pipeline(&data_port, &bt_config, output_dir.as_deref()) {
        Ok(o) => o,
        Err(e) => return fail(&e),
    };

    // a comparison with no usable row is a failure of the whole command
    match outcomes.iter().find_map(StrategyOutcome::error) {
        Some(e) if outcomes.iter().all(|o| o.error().is_some()) => fail(e),
        _ => ExitCode::SUCCESS,
    }
}

/// Load prices, run every selected strategy, print the comparison and
/// export CSVs when `output_dir` is given.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    bt_config: &BacktestConfig,
    output_dir: Option<&Path>,
) -> Result<Vec<StrategyOutcome>, DcaError> {
    let series = data_port.fetch_prices(&bt_config.ticker, bt_config.start_date, bt_config.end_date)?;
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return Err(DcaError::data(format!(
            "no price data for {} in the requested range",
            bt_config.ticker
        )));
    };
    tracing::info!(
        ticker = %bt_config.ticker,
        rows = series.len(),
        from = %first.date,
        to = %last.date,
        "prices loaded"
    );

    let strategies = bt_config.build_strategies();
    tracing::info!(count = strategies.len(), "running strategies");
    let outcomes = run_comparison(&series, &strategies);

    ConsoleReportAdapter.write(bt_config, &outcomes)?;

    if let Some(dir) = output_dir {
        CsvReportAdapter::new(dir.to_path_buf()).write(bt_config, &outcomes)?;
    }

    Ok(outcomes)
}

pub fn run_dry_run(config_path: &Path, overrides: &Overrides) -> ExitCode {
    let (adapter, bt_config) = match prepare(config_path, overrides) {
        Ok(v) => v,
        Err(code) => return code,
    };
    eprintln!("Config validated successfully");

    eprintln!("\nData:");
    eprintln!("  ticker: {}", bt_config.ticker);
    eprintln!(
        "  path:   {}",
        resolve_data_dir(overrides.data.clone(), Some(&adapter)).display()
    );
    let range = |d: Option<chrono::NaiveDate>| d.map_or_else(|| "-".to_string(), |d| d.to_string());
    eprintln!(
        "  range:  {} to {}",
        range(bt_config.start_date),
        range(bt_config.end_date)
    );

    eprintln!("\nStrategies:");
    for strategy in bt_config.build_strategies() {
        eprintln!("  {}", describe_strategy(&strategy));
    }

    if let Some(dir) = resolve_output_dir(overrides, &adapter) {
        eprintln!("\nCSV output: {}", dir.display());
    }

    eprintln!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

pub fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let (_, bt_config) = match prepare(config_path, &Overrides::default()) {
        Ok(v) => v,
        Err(code) => return code,
    };

    for strategy in bt_config.build_strategies() {
        println!("{}", describe_strategy(&strategy));
    }
    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

pub fn run_info(
    ticker: Option<&str>,
    data: Option<PathBuf>,
    config_path: Option<&Path>,
) -> ExitCode {
    let config = match load_optional_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let config_port = config.as_ref().map(|c| c as &dyn ConfigPort);

    let ticker = match resolve_ticker(ticker, config_port) {
        Ok(t) => t,
        Err(e) => return fail(&e),
    };
    let adapter = CsvAdapter::new(resolve_data_dir(data, config_port));

    match adapter.get_data_range(&ticker) {
        Ok(Some((min_date, max_date, count))) => {
            println!("{}: {} rows, {} to {}", ticker, count, min_date, max_date);
            ExitCode::SUCCESS
        }
        Ok(None) => {
            eprintln!("{}: no data found", ticker);
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

pub fn run_list_symbols(data: Option<PathBuf>, config_path: Option<&Path>) -> ExitCode {
    let config = match load_optional_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let dir = resolve_data_dir(data, config.as_ref().map(|c| c as &dyn ConfigPort));
    let adapter = CsvAdapter::new(dir.clone());

    let symbols = match adapter.list_symbols() {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    if symbols.is_empty() {
        eprintln!("No price files found in {}", dir.display());
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    ExitCode::SUCCESS
}
