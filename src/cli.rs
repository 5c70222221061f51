//! CLI definition and dispatch.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use crate::adapters::backup_sheet_adapter::CsvBackupSheet;
use crate::adapters::csv_adapter::CsvPriceDirectory;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::text_report::{SolveSummary, format_metrics, format_summary};
use crate::domain::config_validation::{
    check_capital, parse_date, read_number, validate_portfolio_config,
};
use crate::domain::error::MarkowitzError;
use crate::domain::model::{ModelRequest, PortfolioModel, TRADING_DAYS_PER_YEAR};
use crate::domain::optimizer::{SolveMethod, annual_to_period_return};
use crate::domain::retry::{PriceSource, RetryPolicy, Sleeper, ThreadSleeper};
use crate::domain::universe::parse_tickers;
use crate::ports::config_port::ConfigPort;
use crate::ports::price_port::{BackupLoader, PriceRetriever};

pub const DEFAULT_BACKUP_FILE: &str = "stock_data.csv";
pub const DEFAULT_PRICES_DIR: &str = "prices";
pub const DEFAULT_CAPITAL: f64 = 10_000.0;
pub const DEFAULT_TARGET_RETURN_PCT: f64 = 7.0;
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.044;

#[derive(Parser, Debug)]
#[command(name = "markowitz", about = "Closed-form Markowitz portfolio allocation")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Global minimum-variance, long-only, fully invested
    MinRisk,
    /// Hit the configured target return
    TargetReturn,
    /// Run both solvers
    Both,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute allocations
    Optimize {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long, value_enum, default_value_t = Method::Both)]
        method: Method,
        /// Annual target return in percent, overrides the config
        #[arg(long)]
        target_return: Option<f64>,
        /// Capital to invest, overrides the config
        #[arg(long)]
        capital: Option<f64>,
        #[arg(long)]
        prices_dir: Option<PathBuf>,
        #[arg(long)]
        backup: Option<PathBuf>,
    },
    /// Show metrics of the equally weighted portfolio
    Metrics {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        prices_dir: Option<PathBuf>,
        #[arg(long)]
        backup: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Optimize {
            config,
            method,
            target_return,
            capital,
            prices_dir,
            backup,
        } => run_optimize(
            &config,
            method,
            target_return,
            capital,
            prices_dir.as_deref(),
            backup.as_deref(),
        ),
        Command::Metrics {
            config,
            prices_dir,
            backup,
        } => run_metrics(&config, prices_dir.as_deref(), backup.as_deref()),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Builds the model request. The annual target return (percent) is
/// converted to the compounded daily rate the solver expects.
pub fn build_model_request(
    config: &dyn ConfigPort,
    target_return_override: Option<f64>,
    backup_override: Option<&Path>,
) -> Result<ModelRequest, MarkowitzError> {
    let tickers_str = config.get_string("portfolio", "tickers").ok_or_else(|| {
        MarkowitzError::ConfigMissing {
            section: "portfolio".into(),
            key: "tickers".into(),
        }
    })?;
    let tickers = parse_tickers(&tickers_str).map_err(|e| MarkowitzError::ConfigInvalid {
        section: "portfolio".into(),
        key: "tickers".into(),
        reason: e.to_string(),
    })?;

    let start_date = parse_date(
        config.get_string("portfolio", "start_date").as_deref(),
        "start_date",
    )?;
    let end_date = parse_date(
        config.get_string("portfolio", "end_date").as_deref(),
        "end_date",
    )?;

    let annual_pct = match target_return_override {
        Some(pct) => pct,
        None => read_number(config, "portfolio", "target_return", DEFAULT_TARGET_RETURN_PCT)?,
    };
    if !annual_pct.is_finite() || annual_pct < 0.0 {
        return Err(MarkowitzError::ConfigInvalid {
            section: "portfolio".into(),
            key: "target_return".into(),
            reason: "target_return must be a non-negative annual percentage".into(),
        });
    }

    let backup_path = backup_override
        .map(Path::to_path_buf)
        .or_else(|| config.get_path("portfolio", "backup_file"))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_BACKUP_FILE));

    Ok(ModelRequest {
        tickers,
        start_date,
        end_date,
        backup_path,
        target_return: annual_to_period_return(annual_pct / 100.0, TRADING_DAYS_PER_YEAR),
        risk_free_rate: read_number(
            config,
            "portfolio",
            "risk_free_rate",
            DEFAULT_RISK_FREE_RATE,
        )?,
    })
}

pub fn build_retry_policy(config: &dyn ConfigPort) -> Result<RetryPolicy, MarkowitzError> {
    let defaults = RetryPolicy::default();
    let attempts: i64 = read_number(config, "data", "retries", defaults.max_attempts as i64)?;
    let delay: i64 = read_number(
        config,
        "data",
        "retry_delay_secs",
        defaults.delay.as_secs() as i64,
    )?;
    Ok(RetryPolicy {
        max_attempts: attempts.clamp(1, u32::MAX as i64) as u32,
        delay: Duration::from_secs(delay.max(0) as u64),
    })
}

/// Capital from `--capital` or the config, rejected unless finite and positive.
pub fn resolve_capital(
    config: &dyn ConfigPort,
    capital_override: Option<f64>,
) -> Result<f64, MarkowitzError> {
    let capital = match capital_override {
        Some(c) => c,
        None => read_number(config, "portfolio", "capital", DEFAULT_CAPITAL)?,
    };
    check_capital(capital)
}

pub fn methods_for(method: Method, target_return: f64) -> Vec<(&'static str, SolveMethod)> {
    let min_risk = ("Minimum Risk", SolveMethod::MinRisk);
    let target = ("Target Return", SolveMethod::TargetReturn(target_return));
    match method {
        Method::MinRisk => vec![min_risk],
        Method::TargetReturn => vec![target],
        Method::Both => vec![min_risk, target],
    }
}

/// Solves every requested method against `model` and renders the report.
/// Any solver failure aborts the whole report.
pub fn run_optimize_pipeline(
    model: &PortfolioModel,
    method: Method,
    capital: f64,
) -> Result<String, MarkowitzError> {
    let mut report = String::new();
    for (title, solve) in methods_for(method, model.target_return()) {
        let allocation = model.allocation(solve)?;
        let weights = allocation.weights();
        let summary = SolveSummary {
            title,
            allocation: &allocation,
            annual_return: model.portfolio_return(&weights)?,
            risk: model.risk(&weights)?,
            capital,
        };
        report.push_str(&format_summary(&summary));
        report.push('\n');
    }
    Ok(report)
}

fn load_model(
    config: &dyn ConfigPort,
    request: &ModelRequest,
    prices_dir: Option<&Path>,
) -> Result<PortfolioModel, MarkowitzError> {
    let dir = prices_dir
        .map(Path::to_path_buf)
        .or_else(|| config.get_path("data", "prices_dir"))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PRICES_DIR));
    let retriever = CsvPriceDirectory::new(dir);
    let backup = CsvBackupSheet::new();
    let policy = build_retry_policy(config)?;
    load_model_with(request, &retriever, &backup, &policy, &ThreadSleeper)
}

pub fn load_model_with(
    request: &ModelRequest,
    retriever: &dyn PriceRetriever,
    backup: &dyn BackupLoader,
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
) -> Result<PortfolioModel, MarkowitzError> {
    eprintln!(
        "Loading prices for {} tickers, {} to {}",
        request.tickers.len(),
        request.start_date,
        request.end_date
    );
    let (model, source) = PortfolioModel::load(request, retriever, backup, policy, sleeper)?;
    match source {
        PriceSource::Retriever { attempt } => {
            eprintln!("  price source: retriever (attempt {})", attempt)
        }
        PriceSource::Backup => eprintln!(
            "  price source: backup {}",
            request.backup_path.display()
        ),
    }
    if let Some(returns) = model.returns() {
        eprintln!(
            "  {} assets, {} return observations",
            model.asset_count(),
            returns.observations()
        );
    }
    Ok(model)
}

fn prepare(
    config_path: &Path,
    target_return: Option<f64>,
    backup: Option<&Path>,
) -> Result<(FileConfigAdapter, ModelRequest), ExitCode> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;

    if let Err(e) = validate_portfolio_config(&adapter) {
        eprintln!("error: {e}");
        return Err((&e).into());
    }

    match build_model_request(&adapter, target_return, backup) {
        Ok(request) => Ok((adapter, request)),
        Err(e) => {
            eprintln!("error: {e}");
            Err((&e).into())
        }
    }
}

fn run_optimize(
    config_path: &Path,
    method: Method,
    target_return: Option<f64>,
    capital: Option<f64>,
    prices_dir: Option<&Path>,
    backup: Option<&Path>,
) -> ExitCode {
    let (adapter, request) = match prepare(config_path, target_return, backup) {
        Ok(v) => v,
        Err(code) => return code,
    };

    let capital = match resolve_capital(&adapter, capital) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let model = match load_model(&adapter, &request, prices_dir) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    match run_optimize_pipeline(&model, method, capital) {
        Ok(report) => {
            print!("{report}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_metrics(config_path: &Path, prices_dir: Option<&Path>, backup: Option<&Path>) -> ExitCode {
    let (adapter, request) = match prepare(config_path, None, backup) {
        Ok(v) => v,
        Err(code) => return code,
    };

    let result = load_model(&adapter, &request, prices_dir).and_then(|m| m.calculate_metrics());
    match result {
        Ok(metrics) => {
            println!("=== Equal Weight Portfolio ===");
            println!("{}", format_metrics(&metrics));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let (_adapter, request) = match prepare(config_path, None, None) {
        Ok(v) => v,
        Err(code) => return code,
    };

    eprintln!("\nUniverse:");
    eprintln!("  tickers: {}", request.tickers.join(", "));
    eprintln!("  period:  {} to {}", request.start_date, request.end_date);
    eprintln!("  backup:  {}", request.backup_path.display());
    eprintln!("  daily target return: {:.6}", request.target_return);
    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}
