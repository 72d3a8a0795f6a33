//! FinPulse CLI: market snapshot, daily report and export inspection.
//!
//! Commands:
//! - `analyze`: fetch prices, compute returns/volatility/correlation, optionally export Parquet
//! - `summary`: short-horizon daily report with a volatility alert
//! - `show`: print a previously exported table

mod report;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use finpulse_core::config::DEFAULT_OUTPUT_DIR;
use finpulse_core::{
    CorrelationMatrix, ExportTable, InstrumentSet, Lookback, ParquetExporter, Pipeline,
    PipelineConfig, PipelineOutput, VolatilityVector, YahooProvider,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "finpulse",
    version,
    about = "FinPulse: daily market returns, volatility and correlation"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch prices and print returns, volatility and correlation.
    Analyze {
        /// Symbols to analyze (e.g., AAPL BTC-USD or AAPL,GC=F). Defaults to the config list.
        #[arg(value_delimiter = ',')]
        symbols: Vec<String>,

        /// Lookback period: 5d, 1mo, 6mo, 1y, 2y, 5y.
        #[arg(long)]
        period: Option<Lookback>,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Tables to export as Parquet: prices, daily_returns, rebased, volatility, correlation.
        #[arg(long, value_delimiter = ',')]
        export: Vec<ExportTable>,

        /// Output directory for exported tables.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print machine-readable JSON instead of tables.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Short daily report: last price, change and the most volatile instrument.
    Summary {
        /// Symbols to report on. Defaults to the config list.
        #[arg(value_delimiter = ',')]
        symbols: Vec<String>,

        /// Lookback period used for the report.
        #[arg(long, default_value = "5d")]
        period: Lookback,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the tail of an exported table.
    Show {
        /// Table name: prices, daily_returns, rebased, volatility or correlation.
        name: String,

        /// Directory the table was exported to.
        #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
        output_dir: PathBuf,

        /// Number of trailing rows to print for date-indexed tables.
        #[arg(long, default_value_t = 10)]
        rows: usize,
    },
}

fn main() -> Result<()> {
    init_logging()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            symbols,
            period,
            config,
            export,
            output_dir,
            json,
        } => {
            let mut cfg = load_config(config.as_deref(), &symbols)?;
            if let Some(period) = period {
                cfg.lookback = period;
            }
            if !export.is_empty() {
                cfg.export.tables = export;
            }
            if let Some(dir) = output_dir {
                cfg.export.output_dir = dir;
            }
            run_analyze(cfg, json)
        }
        Commands::Summary {
            symbols,
            period,
            config,
        } => {
            let mut cfg = load_config(config.as_deref(), &symbols)?;
            cfg.lookback = period;
            cfg.export.tables.clear();
            run_summary(cfg)
        }
        Commands::Show {
            name,
            output_dir,
            rows,
        } => run_show(&name, &output_dir, rows),
    }
}

/// Logs go to stderr so `--json` output on stdout stays parseable.
/// `RUST_LOG` overrides the default level.
fn init_logging() -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new("finpulse=info,finpulse_core=info")?,
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init()?;
    Ok(())
}

/// Config file (or defaults), with positional symbols taking precedence.
fn load_config(path: Option<&Path>, symbols: &[String]) -> Result<PipelineConfig> {
    let mut cfg = match path {
        Some(p) => PipelineConfig::from_file(p)
            .with_context(|| format!("loading config {}", p.display()))?,
        None => PipelineConfig::default(),
    };
    if !symbols.is_empty() {
        cfg.instruments = InstrumentSet::new(symbols);
    }
    Ok(cfg)
}

fn run_pipeline(cfg: PipelineConfig) -> Result<PipelineOutput> {
    let provider = YahooProvider::new(&cfg.provider).context("building market data client")?;
    tracing::info!(
        instruments = %cfg.instruments,
        lookback = %cfg.lookback,
        "starting pipeline"
    );
    let output = Pipeline::new(&provider, cfg).run()?;
    Ok(output)
}

#[derive(Serialize)]
struct JsonReport<'a> {
    dataset_hash: &'a str,
    start: Option<chrono::NaiveDate>,
    end: Option<chrono::NaiveDate>,
    rows: usize,
    day_change_pct: Vec<(String, f64)>,
    /// Latest base-100 level per instrument.
    rebased_last: Vec<(String, f64)>,
    volatility: &'a VolatilityVector,
    correlation: &'a CorrelationMatrix,
    exported: &'a [(ExportTable, PathBuf)],
}

fn run_analyze(cfg: PipelineConfig, json: bool) -> Result<()> {
    let output = run_pipeline(cfg)?;
    let analytics = &output.analytics;

    if json {
        let doc = JsonReport {
            dataset_hash: &output.dataset_hash,
            start: output.prices.dates().first().copied(),
            end: output.prices.dates().last().copied(),
            rows: output.prices.height(),
            day_change_pct: finpulse_core::analytics::day_change_pct(&output.prices),
            rebased_last: analytics
                .rebased
                .instruments()
                .iter()
                .cloned()
                .zip(analytics.rebased.last_row().unwrap_or_default())
                .collect(),
            volatility: &analytics.volatility,
            correlation: &analytics.correlation,
            exported: &output.exported,
        };
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    let dates = output.prices.dates();
    if let (Some(first), Some(last)) = (dates.first(), dates.last()) {
        println!(
            "{} trading days, {first} to {last} (dataset {})",
            dates.len(),
            &output.dataset_hash[..12]
        );
        println!();
    }

    println!("=== Market Summary ===");
    print!("{}", report::market_summary(&output.prices));
    println!();
    println!("=== Relative Performance ===");
    print!("{}", report::performance_table(&analytics.rebased));
    println!();
    println!("=== Annualized Volatility ===");
    print!("{}", report::volatility_table(&analytics.volatility));
    println!();
    println!("=== Return Correlation ===");
    print!("{}", report::correlation_table(&analytics.correlation));

    if let Some(alert) = report::volatility_alert(&analytics.volatility) {
        println!();
        println!("{alert}");
    }

    if !output.exported.is_empty() {
        println!();
        for (table, path) in &output.exported {
            println!("Exported {table} to {}", path.display());
        }
    }

    Ok(())
}

fn run_summary(cfg: PipelineConfig) -> Result<()> {
    let output = run_pipeline(cfg)?;
    print!(
        "{}",
        report::daily_report(&output.prices, &output.analytics.volatility)
    );
    Ok(())
}

fn run_show(name: &str, output_dir: &Path, rows: usize) -> Result<()> {
    let exporter = ParquetExporter::new(output_dir);
    let path = exporter.path_for(name)?;
    if !path.exists() {
        anyhow::bail!("no exported table at {}", path.display());
    }

    match name.parse::<ExportTable>() {
        Ok(ExportTable::Volatility) => {
            let vol = exporter.load_volatility(name)?;
            print!("{}", report::volatility_table(&vol));
        }
        Ok(ExportTable::Correlation) => {
            let corr = exporter.load_correlation(name)?;
            print!("{}", report::correlation_table(&corr));
        }
        // Prices, returns, rebased and any custom-named date table.
        _ => {
            let table = exporter
                .load_table(name)
                .with_context(|| format!("reading {}", path.display()))?;
            println!(
                "{} ({} rows x {} instruments)",
                path.display(),
                table.height(),
                table.width()
            );
            print!("{}", report::table_tail(&table, rows));
        }
    }
    Ok(())
}
