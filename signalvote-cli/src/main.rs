//! SignalVote CLI: backtest, live signal, and config commands.
//!
//! Commands:
//! - `backtest`: replay one or more symbols and save report artifacts
//! - `signal`: aggregate the four models' opinions on the latest row of a price CSV
//! - `config`: print the default configuration as TOML

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use signalvote_core::models::LinearTrendPredictor;
use signalvote_core::Opinion;
use signalvote_runner::{
    live_signal, load_options, load_predictions, load_prices, render_summary, run_many,
    save_artifacts, AppConfig, PredictionInput,
};

#[derive(Parser)]
#[command(
    name = "signalvote",
    about = "SignalVote: weighted model voting and single-position backtesting"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay historical prices and report performance per symbol.
    Backtest {
        /// Path to a TOML config file. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Symbols to run, overriding the config list. Repeatable.
        #[arg(long = "symbol")]
        symbols: Vec<String>,

        /// Directory holding `{SYMBOL}.csv` price files.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// CSV of `date,predicted_close` used instead of the bundled predictor.
        /// Only valid with a single symbol.
        #[arg(long)]
        predictions: Option<PathBuf>,

        /// Generate deterministic synthetic prices when a file is missing.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Output directory for report artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Print summaries only; write no artifacts.
        #[arg(long, default_value_t = false)]
        no_save: bool,
    },
    /// Decide BUY/SELL/HOLD for the most recent row of a price file.
    Signal {
        /// Price CSV (date, open, high, low, close, volume).
        #[arg(long)]
        data: PathBuf,

        /// Path to a TOML config file. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the decision as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the default configuration.
    Config,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Backtest {
            config,
            symbols,
            data_dir,
            predictions,
            synthetic,
            output_dir,
            no_save,
        } => run_backtest_cmd(
            config.as_deref(),
            symbols,
            data_dir,
            predictions.as_deref(),
            synthetic,
            (!no_save).then_some(output_dir.as_path()),
        ),
        Commands::Signal { data, config, json } => run_signal_cmd(&data, config.as_deref(), json),
        Commands::Config => {
            print!("{}", AppConfig::default().to_toml()?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(p) => AppConfig::load(p).with_context(|| format!("loading {}", p.display())),
        None => Ok(AppConfig::default()),
    }
}

fn run_backtest_cmd(
    config_path: Option<&Path>,
    symbols: Vec<String>,
    data_dir: Option<PathBuf>,
    predictions_path: Option<&Path>,
    synthetic: bool,
    output_dir: Option<&Path>,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if !symbols.is_empty() {
        config.backtest.symbols = symbols;
    }
    if let Some(dir) = data_dir {
        config.backtest.data_dir = dir;
    }
    if config.backtest.symbols.is_empty() {
        bail!("no symbols to run; pass --symbol or list them in the config");
    }

    let predictions = match predictions_path {
        Some(path) => {
            if config.backtest.symbols.len() != 1 {
                bail!("--predictions requires exactly one symbol");
            }
            Some(load_predictions(path)?)
        }
        None => None,
    };
    let input = match &predictions {
        Some(p) => PredictionInput::Precomputed(p.as_slice()),
        None => PredictionInput::default_model(&config),
    };

    let opts = load_options(&config, synthetic);
    let config_hash = config.config_hash()?;
    tracing::info!(
        symbols = config.backtest.symbols.len(),
        %config_hash,
        "running backtests"
    );
    let results = run_many(&config, &config.backtest.symbols, &input, &opts);

    let mut failures = 0;
    for (symbol, outcome) in &results {
        match outcome {
            Ok(report) => {
                println!("{}", render_summary(report));
                if report.degraded_predictions > 0 {
                    println!(
                        "         {} prediction windows failed and held",
                        report.degraded_predictions
                    );
                }
                if let Some(dir) = output_dir {
                    let run_dir = save_artifacts(report, dir)?;
                    println!("         artifacts: {}", run_dir.display());
                }
            }
            Err(e) => {
                failures += 1;
                eprintln!("{symbol:<8} error: {e}");
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} symbols failed", results.len());
    }
    Ok(())
}

fn run_signal_cmd(data: &Path, config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let points = load_prices(data)?;
    let Some(last) = points.last() else {
        bail!("{} has no usable rows", data.display());
    };
    let last_date = last.date;

    let predictor = Arc::new(LinearTrendPredictor::new(config.backtest.window_length));
    let decision = live_signal(&config, &points, predictor)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&decision)?);
        return Ok(());
    }

    println!("{last_date}: {}", decision.signal);
    println!(
        "  score  buy {}  sell {}",
        decision.tally.buy_score, decision.tally.sell_score
    );
    for (model, opinion) in &decision.opinions {
        let name = model.as_str();
        match opinion {
            Opinion::Voted { signal } => println!("  {name:<15} {signal}"),
            Opinion::Degraded { reason } => println!("  {name:<15} HOLD (degraded: {reason})"),
        }
    }
    Ok(())
}
