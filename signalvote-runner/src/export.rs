//! Report persistence: JSON manifest, trade CSV, Markdown summary.
//!
//! Persisted reports carry `schema_version`; newer versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use signalvote_core::{ClosedTrade, Side};

use crate::runner::{BacktestReport, SCHEMA_VERSION};

// ─── JSON ───────────────────────────────────────────────────────────

pub fn export_json(report: &BacktestReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize BacktestReport to JSON")
}

/// Deserialize a report, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestReport> {
    let report: BacktestReport =
        serde_json::from_str(json).context("failed to deserialize BacktestReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV ────────────────────────────────────────────────────────────

/// Columns: side, entry_date, entry_price, exit_date, exit_price, return_pct, forced
pub fn export_trades_csv(trades: &[ClosedTrade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "side",
        "entry_date",
        "entry_price",
        "exit_date",
        "exit_price",
        "return_pct",
        "forced",
    ])?;

    for t in trades {
        let side = match t.side {
            Side::Long => "long",
            Side::Short => "short",
        };
        wtr.write_record([
            side,
            &t.entry_date.to_string(),
            &format!("{:.6}", t.entry_price),
            &t.exit_date.to_string(),
            &format!("{:.6}", t.exit_price),
            &format!("{:.4}", t.return_pct),
            &t.forced.to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write `{symbol}_{timestamp}_{config}/` under `output_dir` with `report.json`,
/// `trades.csv` and `report.md`. Returns the created directory.
///
/// `{config}` is the first 8 hex digits of the config hash. A run that would
/// land in an existing directory gets a `_2`, `_3`, ... suffix instead.
pub fn save_artifacts(report: &BacktestReport, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;

    let short_hash = report
        .config_hash
        .get(..8)
        .unwrap_or(&report.config_hash);
    let base = format!(
        "{}_{}_{}",
        report.symbol,
        chrono::Local::now().format("%Y%m%d_%H%M%S"),
        short_hash
    );
    let run_dir = claim_run_dir(output_dir, &base)?;

    std::fs::write(run_dir.join("report.json"), export_json(report)?)?;
    std::fs::write(
        run_dir.join("trades.csv"),
        export_trades_csv(&report.result.trades)?,
    )?;
    std::fs::write(run_dir.join("report.md"), generate_report(report))?;

    tracing::info!(dir = %run_dir.display(), "artifacts saved");
    Ok(run_dir)
}

/// Create the first free directory among `base`, `base_2`, `base_3`, ...
fn claim_run_dir(output_dir: &Path, base: &str) -> Result<PathBuf> {
    for n in 1u32.. {
        let name = if n == 1 {
            base.to_string()
        } else {
            format!("{base}_{n}")
        };
        let candidate = output_dir.join(name);
        match std::fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("failed to create artifact dir: {}", candidate.display())
                })
            }
        }
    }
    bail!("no free artifact directory for {base}")
}

pub fn load_artifacts(dir: &Path) -> Result<BacktestReport> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

// ─── Text reports ───────────────────────────────────────────────────

pub fn generate_report(report: &BacktestReport) -> String {
    let r = &report.result;
    let mut md = String::with_capacity(1024);

    md.push_str("# Backtest Report\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Symbol | {} |\n", report.symbol));
    md.push_str(&format!(
        "| Period | {} to {} |\n",
        report.start_date, report.end_date
    ));
    md.push_str(&format!("| Predictions | {} |\n", report.prediction_source));
    md.push_str(&format!("| Window | {} |\n", report.window_length));
    md.push_str(&format!("| Threshold | {} |\n", report.threshold));
    md.push_str(&format!("| Rows | {} |\n", report.rows_used));
    md.push_str(&format!("| Dataset Hash | {} |\n", report.dataset_hash));
    if report.synthetic {
        md.push_str("| Data | **SYNTHETIC** |\n");
    }
    md.push('\n');

    md.push_str("## Signals\n\n");
    md.push_str(&format!(
        "BUY {} / SELL {} / HOLD {}",
        report.signals.buy, report.signals.sell, report.signals.hold
    ));
    if report.degraded_predictions > 0 {
        md.push_str(&format!(
            " ({} failed predictions held)",
            report.degraded_predictions
        ));
    }
    md.push_str("\n\n");

    md.push_str("## Performance\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Initial Cash | {:.2} |\n", r.initial_cash));
    md.push_str(&format!("| Final Value | {:.2} |\n", r.final_value));
    md.push_str(&format!("| Profit/Loss | {:.2} |\n", r.profit_loss()));
    md.push_str(&format!("| Return | {:.2}% |\n", r.total_return_pct()));
    md.push_str(&format!("| Trades | {} |\n", r.trade_count));
    md.push_str(&format!("| Win Rate | {:.1}% |\n", r.win_rate));
    md.push_str(&format!("| Sharpe | {:.3} |\n", r.sharpe_ratio));
    md
}

/// One line per symbol for terminal output.
pub fn render_summary(report: &BacktestReport) -> String {
    let r = &report.result;
    format!(
        "{:<8} final {:>14.2}  p/l {:>12.2}  trades {:>4}  win {:>5.1}%  sharpe {:>7.3}{}",
        report.symbol,
        r.final_value,
        r.profit_loss(),
        r.trade_count,
        r.win_rate,
        r.sharpe_ratio,
        if report.synthetic { "  [synthetic]" } else { "" }
    )
}
