//! CLI definition and dispatch.
//!
//! Each subcommand loads the INI config, constructs the storage adapter from
//! it, and hands off to a pipeline function generic over the port traits.
//! Progress goes to stderr; results go to stdout.

use chrono::{Duration, NaiveDate};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{simulate, BacktestParams, LedgerEntry};
use crate::domain::error::StocklensError;
use crate::domain::forecast::{self, ForecastRow, LINEAR_REGRESSION};
use crate::domain::report::ReportBundle;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PriceDataPort;
use crate::ports::prediction_port::PredictionStorePort;
use crate::ports::report_port::ReportPort;

#[cfg(feature = "sqlite")]
use crate::adapters::sqlite_adapter::SqliteAdapter as StoreAdapter;

#[cfg(all(feature = "postgres", not(feature = "sqlite")))]
use crate::adapters::postgres_adapter::PostgresAdapter as StoreAdapter;

/// Both the backtest fetch window and the ingest retention boundary.
pub const RETENTION_DAYS: i64 = 730;

#[derive(Parser, Debug)]
#[command(name = "stocklens", about = "Stock backtesting and forecasting")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Import daily bars for a symbol from a CSV file
    Import {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        file: PathBuf,
        #[arg(short, long)]
        symbol: String,
        /// Retention reference date; bars older than two years before it are skipped
        #[arg(long)]
        as_of: NaiveDate,
    },
    /// Run the moving-average crossover backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        symbol: String,
        /// End of the two-year simulation window
        #[arg(long)]
        as_of: NaiveDate,
        #[arg(long)]
        investment: Option<f64>,
        #[arg(long)]
        buy_window: Option<usize>,
        #[arg(long)]
        sell_window: Option<usize>,
        /// Write the full ledger as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Fit per-field regressions and store forecast rows
    Predict {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        symbol: String,
        #[arg(long)]
        horizon: Option<usize>,
    },
    /// Generate a Typst forecast report
    Report {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        symbol: String,
        #[arg(long)]
        horizon: Option<usize>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show stored data range for symbol(s)
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        symbol: Option<String>,
    },
    /// List symbols with stored price data
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Import {
            config,
            file,
            symbol,
            as_of,
        } => run_import(&config, &file, &symbol, as_of),
        Command::Backtest {
            config,
            symbol,
            as_of,
            investment,
            buy_window,
            sell_window,
            output,
        } => run_backtest(
            &config,
            &symbol,
            as_of,
            investment,
            buy_window,
            sell_window,
            output.as_ref(),
        ),
        Command::Predict {
            config,
            symbol,
            horizon,
        } => run_predict(&config, &symbol, horizon),
        Command::Report {
            config,
            symbol,
            horizon,
            output,
        } => run_report(&config, &symbol, horizon, output.as_ref()),
        Command::Info { config, symbol } => run_info(&config, symbol.as_deref()),
        Command::ListSymbols { config } => run_list_symbols(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = StocklensError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Backtest parameters from the `[backtest]` config section, with CLI
/// overrides applied on top.
pub fn build_backtest_params(
    config: &dyn ConfigPort,
    investment: Option<f64>,
    buy_window: Option<usize>,
    sell_window: Option<usize>,
) -> BacktestParams {
    BacktestParams {
        initial_investment: investment
            .unwrap_or_else(|| config.get_double("backtest", "initial_investment", 10_000.0)),
        buy_window: buy_window
            .unwrap_or_else(|| config.get_int("backtest", "buy_window", 20) as usize),
        sell_window: sell_window
            .unwrap_or_else(|| config.get_int("backtest", "sell_window", 20) as usize),
    }
}

#[cfg(any(feature = "sqlite", feature = "postgres"))]
fn open_store(config: &dyn ConfigPort) -> Result<StoreAdapter, StocklensError> {
    let adapter = StoreAdapter::from_config(config)?;
    adapter.initialize_schema()?;
    Ok(adapter)
}

/// Fetch the trailing two-year window ending at `as_of` and simulate.
/// A symbol with no bars at all in the window is rejected.
pub fn run_backtest_pipeline(
    data_port: &dyn PriceDataPort,
    symbol: &str,
    as_of: NaiveDate,
    params: &BacktestParams,
) -> Result<Vec<LedgerEntry>, StocklensError> {
    let start = as_of - Duration::days(RETENTION_DAYS);
    let bars = data_port.fetch_bars(symbol, start, as_of)?;

    if bars.is_empty() {
        return Err(StocklensError::InvalidSymbol {
            symbol: symbol.to_string(),
        });
    }

    eprintln!(
        "Simulating {}: {} bars, {} to {}",
        symbol,
        bars.len(),
        bars[0].date,
        bars[bars.len() - 1].date
    );

    simulate(symbol, &bars, params)
}

/// Fit, project, store what is new, and return the stored rows covering
/// exactly the requested horizon.
pub fn run_predict_pipeline(
    data_port: &dyn PriceDataPort,
    store: &dyn PredictionStorePort,
    symbol: &str,
    horizon_days: usize,
) -> Result<Vec<ForecastRow>, StocklensError> {
    let bars = data_port.fetch_all_bars(symbol)?;
    if bars.is_empty() {
        return Err(StocklensError::InvalidSymbol {
            symbol: symbol.to_string(),
        });
    }

    let projected = forecast::project(symbol, &bars, horizon_days)?;

    let mut inserted = 0;
    let mut skipped = 0;
    for row in &projected {
        if store.exists(&row.symbol, row.date, &row.model_type)? {
            skipped += 1;
        } else {
            store.insert(row)?;
            inserted += 1;
        }
    }
    eprintln!(
        "Stored {} new forecast rows for {} ({} already present)",
        inserted, symbol, skipped
    );

    let last_date = bars[bars.len() - 1].date;
    store.query(
        symbol,
        LINEAR_REGRESSION,
        Some(last_date + Duration::days(1)),
        Some(last_date + Duration::days(horizon_days as i64)),
    )
}

/// Run the predict pipeline, assemble the report bundle, and write it.
pub fn run_report_pipeline(
    data_port: &dyn PriceDataPort,
    store: &dyn PredictionStorePort,
    report_port: &dyn ReportPort,
    symbol: &str,
    horizon_days: usize,
    output_path: &str,
) -> Result<(), StocklensError> {
    let requested_rows = run_predict_pipeline(data_port, store, symbol, horizon_days)?;
    let all_forecast_rows = store.query(symbol, LINEAR_REGRESSION, None, None)?;
    let all_actual_rows = data_port.fetch_all_bars(symbol)?;

    let bundle = ReportBundle {
        requested_rows,
        all_forecast_rows,
        all_actual_rows,
    };

    report_port.write(&bundle, output_path)
}

/// Serialize a ledger as CSV.
pub fn write_ledger_csv<W: Write>(ledger: &[LedgerEntry], writer: W) -> Result<(), StocklensError> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record([
        "symbol",
        "date",
        "action",
        "price",
        "cash",
        "stock_holdings",
        "total_value",
        "net_return",
    ])
    .map_err(csv_err)?;

    for entry in ledger {
        wtr.write_record([
            entry.symbol.as_str(),
            &entry.date.to_string(),
            &entry.action.to_string(),
            &format!("{:.4}", entry.price),
            &format!("{:.4}", entry.cash),
            &format!("{:.6}", entry.stock_holdings),
            &format!("{:.4}", entry.total_value),
            &format!("{:.4}", entry.net_return),
        ])
        .map_err(csv_err)?;
    }

    wtr.flush()?;
    Ok(())
}

fn csv_err(e: csv::Error) -> StocklensError {
    StocklensError::invalid_parameter("ledger_csv", e.to_string())
}

fn run_import(config_path: &PathBuf, file: &PathBuf, symbol: &str, as_of: NaiveDate) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    #[cfg(any(feature = "sqlite", feature = "postgres"))]
    {
        use crate::adapters::csv_adapter;

        let store = match open_store(&config) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        eprintln!("Reading {}", file.display());
        let bars = match csv_adapter::read_bars_from_file(file, symbol) {
            Ok(b) => b,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        let floor = as_of - Duration::days(RETENTION_DAYS);
        match store.insert_bars(&bars, Some(floor)) {
            Ok(inserted) => {
                eprintln!(
                    "Imported {} of {} bars for {} (retention floor {})",
                    inserted,
                    bars.len(),
                    symbol,
                    floor
                );
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {e}");
                (&e).into()
            }
        }
    }

    #[cfg(not(any(feature = "sqlite", feature = "postgres")))]
    {
        let _ = (config, file, symbol, as_of);
        eprintln!("error: a storage feature (sqlite or postgres) is required for import");
        ExitCode::from(1)
    }
}

fn run_backtest(
    config_path: &PathBuf,
    symbol: &str,
    as_of: NaiveDate,
    investment: Option<f64>,
    buy_window: Option<usize>,
    sell_window: Option<usize>,
    output_path: Option<&PathBuf>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let params = build_backtest_params(&config, investment, buy_window, sell_window);

    #[cfg(any(feature = "sqlite", feature = "postgres"))]
    {
        let store = match open_store(&config) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        let ledger = match run_backtest_pipeline(&store, symbol, as_of, &params) {
            Ok(l) => l,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        let buys = ledger
            .iter()
            .filter(|e| e.action == crate::domain::backtest::Action::Buy)
            .count();
        let sells = ledger
            .iter()
            .filter(|e| e.action == crate::domain::backtest::Action::Sell)
            .count();

        if let Some(last) = ledger.last() {
            eprintln!("Trades: {} buys, {} sells", buys, sells);
            println!(
                "{}: final value {:.2}, net return {:.2}",
                symbol, last.total_value, last.net_return
            );
        } else {
            println!("{}: empty ledger", symbol);
        }

        if let Some(path) = output_path {
            let file = match std::fs::File::create(path) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("error: failed to create {}: {}", path.display(), e);
                    return ExitCode::from(1);
                }
            };
            if let Err(e) = write_ledger_csv(&ledger, file) {
                eprintln!("error: {e}");
                return (&e).into();
            }
            eprintln!("Ledger written to {}", path.display());
        }

        ExitCode::SUCCESS
    }

    #[cfg(not(any(feature = "sqlite", feature = "postgres")))]
    {
        let _ = (config, symbol, as_of, params, output_path);
        eprintln!("error: a storage feature (sqlite or postgres) is required for backtest");
        ExitCode::from(1)
    }
}

fn run_predict(config_path: &PathBuf, symbol: &str, horizon: Option<usize>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let horizon_days =
        horizon.unwrap_or_else(|| config.get_int("forecast", "horizon_days", 7) as usize);

    #[cfg(any(feature = "sqlite", feature = "postgres"))]
    {
        let store = match open_store(&config) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        match run_predict_pipeline(&store, &store, symbol, horizon_days) {
            Ok(rows) => {
                for row in &rows {
                    println!(
                        "{},{},{:.2},{:.2},{:.2},{:.2},{}",
                        row.symbol, row.date, row.open, row.high, row.low, row.close, row.volume
                    );
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {e}");
                (&e).into()
            }
        }
    }

    #[cfg(not(any(feature = "sqlite", feature = "postgres")))]
    {
        let _ = (config, symbol, horizon_days);
        eprintln!("error: a storage feature (sqlite or postgres) is required for predict");
        ExitCode::from(1)
    }
}

fn run_report(
    config_path: &PathBuf,
    symbol: &str,
    horizon: Option<usize>,
    output_path: Option<&PathBuf>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let horizon_days =
        horizon.unwrap_or_else(|| config.get_int("forecast", "horizon_days", 7) as usize);
    let output = output_path
        .cloned()
        .unwrap_or_else(|| PathBuf::from("report.typ"));

    #[cfg(any(feature = "sqlite", feature = "postgres"))]
    {
        use crate::adapters::typst_report::TypstReportAdapter;

        let store = match open_store(&config) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        let report_adapter = TypstReportAdapter::from_config(&config);
        let output_str = output.display().to_string();

        match run_report_pipeline(&store, &store, &report_adapter, symbol, horizon_days, &output_str)
        {
            Ok(()) => {
                eprintln!("Report written to: {}", output.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {e}");
                (&e).into()
            }
        }
    }

    #[cfg(not(any(feature = "sqlite", feature = "postgres")))]
    {
        let _ = (config, symbol, horizon_days, output);
        eprintln!("error: a storage feature (sqlite or postgres) is required for report");
        ExitCode::from(1)
    }
}

fn run_info(config_path: &PathBuf, symbol: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    #[cfg(any(feature = "sqlite", feature = "postgres"))]
    {
        let store = match open_store(&config) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        let symbols: Vec<String> = match symbol {
            Some(s) => vec![s.to_string()],
            None => match store.list_symbols() {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("error: {e}");
                    return (&e).into();
                }
            },
        };

        if symbols.is_empty() {
            eprintln!("No symbols stored");
            return ExitCode::SUCCESS;
        }

        for s in &symbols {
            match store.get_data_range(s) {
                Ok(Some((min, max, count))) => {
                    println!("{}: {} bars, {} to {}", s, count, min, max);
                }
                Ok(None) => {
                    eprintln!("{}: no data found", s);
                }
                Err(e) => {
                    eprintln!("error querying {}: {}", s, e);
                }
            }
        }
        ExitCode::SUCCESS
    }

    #[cfg(not(any(feature = "sqlite", feature = "postgres")))]
    {
        let _ = (config, symbol);
        eprintln!("error: a storage feature (sqlite or postgres) is required for info");
        ExitCode::from(1)
    }
}

fn run_list_symbols(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    #[cfg(any(feature = "sqlite", feature = "postgres"))]
    {
        let store = match open_store(&config) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        let symbols = match store.list_symbols() {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        if symbols.is_empty() {
            eprintln!("No symbols stored");
        } else {
            for symbol in &symbols {
                println!("{}", symbol);
            }
            eprintln!("{} symbols found", symbols.len());
        }
        ExitCode::SUCCESS
    }

    #[cfg(not(any(feature = "sqlite", feature = "postgres")))]
    {
        let _ = config;
        eprintln!("error: a storage feature (sqlite or postgres) is required for list-symbols");
        ExitCode::from(1)
    }
}
