//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvDataAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::align::align;
use crate::domain::config_validation::{parse_optional_date, validate_backtest_config};
use crate::domain::error::NavsimError;
use crate::domain::fee::FeeSchedule;
use crate::domain::report::{build_report, BacktestReport};
use crate::domain::simulation::{simulate, PortfolioState};
use crate::domain::solver::RootSolver;
use crate::domain::stats::{period_stats, NavSeries, PeriodLabel};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "navsim", about = "Portfolio NAV backtester with fee-aware rebalancing")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a portfolio backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory for summary.csv and portfolio_states.csv
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Override the configured start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,
        /// Override the configured end date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,
    },
    /// Statistics for a single price column, no weighting imposed
    AssetStats {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        asset: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show input data ranges and usable rebalance dates
    Info {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            output,
            start,
            end,
        } => run_backtest(&config, output.as_ref(), start.as_deref(), end.as_deref()),
        Command::AssetStats {
            config,
            asset,
            output,
        } => run_asset_stats(&config, &asset, output.as_ref()),
        Command::Validate { config } => run_validate(&config),
        Command::Info { config } => run_info(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = NavsimError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

pub fn build_data_adapter(config: &dyn ConfigPort) -> Result<CsvDataAdapter, NavsimError> {
    let prices = config
        .get_string("data", "prices")
        .ok_or_else(|| NavsimError::ConfigMissing {
            section: "data".into(),
            key: "prices".into(),
        })?;
    let weights = config
        .get_string("data", "weights")
        .ok_or_else(|| NavsimError::ConfigMissing {
            section: "data".into(),
            key: "weights".into(),
        })?;
    Ok(CsvDataAdapter::new(PathBuf::from(prices), PathBuf::from(weights)))
}

pub fn build_fee_schedule(config: &dyn ConfigPort) -> FeeSchedule {
    FeeSchedule {
        high_risk: config.get_list("fees", "high_risk_assets"),
        high_risk_rate: config.get_double("fees", "high_risk_fee_rate", 0.0),
        low_risk: config.get_list("fees", "low_risk_assets"),
        low_risk_rate: config.get_double("fees", "low_risk_fee_rate", 0.0),
    }
}

pub fn build_solver(config: &dyn ConfigPort) -> RootSolver {
    RootSolver {
        max_iterations: config.get_int("solver", "max_iterations", 50) as usize,
        tolerance: config.get_double("solver", "tolerance", 1e-12),
    }
}

fn resolve_bounds(
    config: &dyn ConfigPort,
    start_override: Option<&str>,
    end_override: Option<&str>,
) -> Result<(Option<NaiveDate>, Option<NaiveDate>), NavsimError> {
    let parse_override = |value: Option<&str>, key: &str| -> Result<Option<NaiveDate>, NavsimError> {
        match value {
            None => Ok(None),
            Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").map(Some).map_err(|_| {
                NavsimError::ConfigInvalid {
                    section: "backtest".into(),
                    key: key.into(),
                    reason: "invalid date format (expected YYYY-MM-DD)".into(),
                }
            }),
        }
    };

    let start = match parse_override(start_override, "start_date")? {
        Some(d) => Some(d),
        None => parse_optional_date(config, "start_date")?,
    };
    let end = match parse_override(end_override, "end_date")? {
        Some(d) => Some(d),
        None => parse_optional_date(config, "end_date")?,
    };
    Ok((start, end))
}

fn run_backtest(
    config_path: &PathBuf,
    output_dir: Option<&PathBuf>,
    start_override: Option<&str>,
    end_override: Option<&str>,
) -> ExitCode {
    // Stage 1: load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_backtest_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    match run_backtest_pipeline(&adapter, output_dir, start_override, end_override) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_backtest_pipeline(
    adapter: &FileConfigAdapter,
    output_dir: Option<&PathBuf>,
    start_override: Option<&str>,
    end_override: Option<&str>,
) -> Result<(), NavsimError> {
    let ann = adapter.get_int("backtest", "annualization_factor", 250) as u32;
    let rf = adapter.get_double("backtest", "risk_free_rate", 0.0);
    let fee_schedule = build_fee_schedule(adapter);
    let solver = build_solver(adapter);
    let (start, end) = resolve_bounds(adapter, start_override, end_override)?;

    // Stage 2: load input tables
    let data_port = build_data_adapter(adapter)?;
    let panel = data_port.load_prices()?;
    let schedule = data_port.load_weights()?;
    eprintln!(
        "Loaded {} price dates, {} assets, {} weight rows",
        panel.len(),
        panel.assets.len(),
        schedule.len()
    );

    // Stage 3: align the schedule onto the trading calendar
    let (panel, aligned) = align(&panel, &schedule, start, end)?;
    eprintln!(
        "Aligned schedule: {} rebalance dates, backtest {} to {}",
        aligned.len(),
        panel.dates[0],
        panel.dates[panel.len() - 1]
    );

    // Stage 4: resolve fee rates and simulate
    let fee_rates = fee_schedule.rates_for(&panel.assets)?;
    let states = simulate(&panel, &aligned, &fee_rates, &solver)?;

    // Stage 5: statistics and report
    let report = build_report(&states, &panel.assets, ann, rf)?;
    print_summary(&report, &states);

    // Stage 6: write output tables
    let dir = output_dir.cloned().unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&dir)?;
    let report_port = CsvReportAdapter::new();
    let summary_path = dir.join("summary.csv");
    let states_path = dir.join("portfolio_states.csv");
    report_port.write_summary(&report, &summary_path)?;
    report_port.write_states(&states, &panel.assets, &states_path)?;
    eprintln!(
        "\nReports written to: {} and {}",
        summary_path.display(),
        states_path.display()
    );
    Ok(())
}

fn print_summary(report: &BacktestReport, states: &[PortfolioState]) {
    let Some(overall) = report
        .records
        .iter()
        .find(|r| r.label == PeriodLabel::FullPeriod)
    else {
        return;
    };

    eprintln!("\n=== Overall Performance ===");
    eprintln!("Dates Simulated:    {}", states.len());
    eprintln!(
        "Total Return:       {:.2}%",
        overall.holding_period_return * 100.0
    );
    eprintln!(
        "Annualized:         {:.2}%",
        overall.annualized_return * 100.0
    );
    eprintln!(
        "Annualized Vol:     {:.2}%",
        overall.annualized_volatility * 100.0
    );
    eprintln!("Sharpe Ratio:       {:.2}", overall.sharpe);
    eprintln!("Calmar Ratio:       {:.2}", overall.calmar);
    eprintln!("Max Drawdown:       -{:.2}%", overall.max_drawdown * 100.0);
    match overall.recovery {
        Some(date) => eprintln!("Recovered:          {date}"),
        None => eprintln!("Recovered:          not yet"),
    }
    eprintln!(
        "Portfolio Turnover: {:.2}%",
        overall.portfolio_turnover * 100.0
    );
    eprintln!("Total Fees:         {:.4}", overall.total_fee);

    let years: Vec<String> = report
        .records
        .iter()
        .filter_map(|r| match r.label {
            PeriodLabel::Year(y) => Some(format!("{y}")),
            PeriodLabel::FullPeriod => None,
        })
        .collect();
    if !years.is_empty() {
        eprintln!("\nYears reported: {}", years.join(", "));
    }
}

fn run_asset_stats(
    config_path: &PathBuf,
    asset: &str,
    output: Option<&PathBuf>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    match run_asset_stats_pipeline(&adapter, asset, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_asset_stats_pipeline(
    adapter: &FileConfigAdapter,
    asset: &str,
    output: Option<&PathBuf>,
) -> Result<(), NavsimError> {
    let ann = adapter.get_int("backtest", "annualization_factor", 250) as u32;
    let rf = adapter.get_double("backtest", "risk_free_rate", 0.0);
    let (start, end) = resolve_bounds(adapter, None, None)?;

    let data_port = build_data_adapter(adapter)?;
    let panel = data_port.load_prices()?.sliced(start, end);
    let series = NavSeries::from_panel_column(&panel, asset)?;
    eprintln!("{}: {} observations", asset, series.len());

    let rows = period_stats(&series, ann, rf)?;
    for row in &rows {
        eprintln!(
            "  {:<8} return {:>8.2}%  vol {:>8.2}%  mdd {:>6.2}%  sharpe {:>6.2}",
            row.label.to_string(),
            row.stats.annualized_return * 100.0,
            row.stats.annualized_volatility * 100.0,
            row.stats.drawdown.mdd * 100.0,
            row.stats.sharpe
        );
    }

    if let Some(path) = output {
        CsvReportAdapter::new().write_asset_stats(asset, &rows, path)?;
        eprintln!("\nReport written to: {}", path.display());
    }
    Ok(())
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    match validate_backtest_config(&adapter) {
        Ok(()) => {
            eprintln!("Configuration is valid");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_info(config_path: &PathBuf) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_backtest_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let result = (|| -> Result<(), NavsimError> {
        let (start, end) = resolve_bounds(&adapter, None, None)?;
        let data_port = build_data_adapter(&adapter)?;
        let panel = data_port.load_prices()?;
        let schedule = data_port.load_weights()?;

        println!("assets: {}", panel.assets.join(", "));
        if !panel.is_empty() {
            println!(
                "price dates: {} ({} to {})",
                panel.len(),
                panel.dates[0],
                panel.dates[panel.len() - 1]
            );
        }
        println!("weight rows: {}", schedule.len());

        let (panel, aligned) = align(&panel, &schedule, start, end)?;
        println!(
            "usable rebalance dates: {} (backtest {} to {})",
            aligned.len(),
            panel.dates[0],
            panel.dates[panel.len() - 1]
        );
        Ok(())
    })();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}
