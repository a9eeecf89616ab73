//! Price and prediction loading for the runner.
//!
//! Prices come from `{data_dir}/{SYMBOL}.csv`. Resolution policy:
//! 1. If the CSV exists → parse it
//! 2. If not and synthetic data is allowed → generate a seeded random walk (tagged)
//! 3. Otherwise → fail with a clear error
//!
//! Header names are matched case-insensitively. `date` and `close` are required;
//! `open`, `high`, `low` and `volume` default to the close (volume to 0).

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use signalvote_core::{PredictedPricePoint, PricePoint};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no price file for '{symbol}' at {} (use --synthetic for synthetic data)", .path.display())]
    NotFound { symbol: String, path: PathBuf },

    #[error("failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("'{source_name}' has no '{column}' column")]
    MissingColumn { source_name: String, column: String },

    #[error("'{source_name}' has more than one row dated {date}")]
    DuplicateDate { source_name: String, date: NaiveDate },

    #[error("no usable rows for '{symbol}' in the requested date range")]
    NoData { symbol: String },
}

/// Where a series came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataSource {
    Csv { path: PathBuf },
    Synthetic,
}

/// Options controlling how prices are loaded.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub data_dir: PathBuf,
    /// Inclusive.
    pub start: Option<NaiveDate>,
    /// Inclusive.
    pub end: Option<NaiveDate>,
    /// Generate synthetic prices when a file is missing.
    pub synthetic: bool,
}

/// One symbol's loaded series with provenance.
#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub symbol: String,
    pub points: Vec<PricePoint>,
    pub source: DataSource,
    /// BLAKE3 over every loaded row.
    pub dataset_hash: String,
}

impl LoadedSeries {
    pub fn is_synthetic(&self) -> bool {
        self.source == DataSource::Synthetic
    }
}

// ─── Synthetic range when no dates are configured ──────────────────

const SYNTHETIC_START: (i32, u32, u32) = (2022, 1, 3);
const SYNTHETIC_END: (i32, u32, u32) = (2024, 12, 31);

/// Resolve one symbol according to the fallback policy.
pub fn load_symbol(symbol: &str, opts: &LoadOptions) -> Result<LoadedSeries, LoadError> {
    let path = opts.data_dir.join(format!("{symbol}.csv"));

    let (points, source) = if path.is_file() {
        let points = load_prices(&path)?;
        (points, DataSource::Csv { path })
    } else if opts.synthetic {
        tracing::warn!(%symbol, "no price file, generating synthetic data; results are tagged synthetic");
        let start = opts.start.unwrap_or_else(|| ymd(SYNTHETIC_START));
        let end = opts.end.unwrap_or_else(|| ymd(SYNTHETIC_END));
        (generate_synthetic_points(symbol, start, end), DataSource::Synthetic)
    } else {
        return Err(LoadError::NotFound {
            symbol: symbol.to_string(),
            path,
        });
    };

    let points = filter_dates(points, opts.start, opts.end);
    if points.is_empty() {
        return Err(LoadError::NoData {
            symbol: symbol.to_string(),
        });
    }

    tracing::debug!(%symbol, rows = points.len(), ?source, "loaded prices");
    Ok(LoadedSeries {
        symbol: symbol.to_string(),
        dataset_hash: dataset_hash(&points),
        points,
        source,
    })
}

/// Read a price CSV from disk.
pub fn load_prices(path: &Path) -> Result<Vec<PricePoint>, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_prices(file, &path.display().to_string())
}

/// Parse price rows, skipping unusable ones, sorted by date.
pub fn read_prices<R: Read>(reader: R, source_name: &str) -> Result<Vec<PricePoint>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let columns = column_index(rdr.headers()?);
    let required = |name: &str| {
        columns.get(name).copied().ok_or_else(|| LoadError::MissingColumn {
            source_name: source_name.to_string(),
            column: name.to_string(),
        })
    };
    let date_col = required("date")?;
    let close_col = required("close")?;

    let mut points = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record?;
        let field = |col: Option<usize>| col.and_then(|c| record.get(c)).and_then(parse_number);

        let date = record.get(date_col).and_then(parse_date);
        let close = field(Some(close_col)).filter(|c| *c > 0.0);
        let (Some(date), Some(close)) = (date, close) else {
            tracing::warn!(source = source_name, row = line + 1, "skipping row without a usable date and close");
            continue;
        };

        points.push(PricePoint {
            date,
            open: field(columns.get("open").copied()).unwrap_or(close),
            high: field(columns.get("high").copied()).unwrap_or(close),
            low: field(columns.get("low").copied()).unwrap_or(close),
            close,
            volume: field(columns.get("volume").copied()).unwrap_or(0.0),
        });
    }

    points.sort_by_key(|p| p.date);
    if let Some(w) = points.windows(2).find(|w| w[0].date == w[1].date) {
        return Err(LoadError::DuplicateDate {
            source_name: source_name.to_string(),
            date: w[0].date,
        });
    }
    Ok(points)
}

/// Read a `date,predicted_close` CSV.
pub fn load_predictions(path: &Path) -> Result<Vec<PredictedPricePoint>, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_predictions(file, &path.display().to_string())
}

pub fn read_predictions<R: Read>(
    reader: R,
    source_name: &str,
) -> Result<Vec<PredictedPricePoint>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let columns = column_index(rdr.headers()?);
    let column = |name: &str| {
        columns.get(name).copied().ok_or_else(|| LoadError::MissingColumn {
            source_name: source_name.to_string(),
            column: name.to_string(),
        })
    };
    let date_col = column("date")?;
    let pred_col = column("predicted_close")?;

    let mut predictions = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record?;
        let date = record.get(date_col).and_then(parse_date);
        let predicted = record.get(pred_col).and_then(parse_number);
        match (date, predicted) {
            (Some(date), Some(predicted_close)) => predictions.push(PredictedPricePoint {
                date,
                predicted_close,
            }),
            _ => tracing::warn!(source = source_name, row = line + 1, "skipping unusable prediction row"),
        }
    }
    predictions.sort_by_key(|p| p.date);
    Ok(predictions)
}

fn column_index(headers: &csv::StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_ascii_lowercase().replace(' ', "_"), i))
        .collect()
}

/// `YYYY-MM-DD`, optionally followed by a time part.
fn parse_date(s: &str) -> Option<NaiveDate> {
    let day = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn parse_number(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn ymd((y, m, d): (i32, u32, u32)) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}

fn filter_dates(
    points: Vec<PricePoint>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Vec<PricePoint> {
    points
        .into_iter()
        .filter(|p| start.map_or(true, |s| p.date >= s) && end.map_or(true, |e| p.date <= e))
        .collect()
}

/// BLAKE3 over the little-endian bytes of every row.
pub fn dataset_hash(points: &[PricePoint]) -> String {
    let mut hasher = blake3::Hasher::new();
    for p in points {
        hasher.update(&p.date.num_days_from_ce().to_le_bytes());
        for v in [p.open, p.high, p.low, p.close, p.volume] {
            hasher.update(&v.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}

/// Seeded random walk on weekdays between `start` and `end`.
///
/// The seed is the BLAKE3 hash of the symbol, so each symbol gets its own
/// reproducible series.
pub fn generate_synthetic_points(symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<PricePoint> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut points = Vec::new();
    let mut price = 100.0_f64;
    let mut current = start;

    while current <= end {
        if matches!(current.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun) {
            current += chrono::Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.025..0.025);
        let open = price;
        let close = price * (1.0 + daily_return);
        points.push(PricePoint {
            date: current,
            open,
            high: open.max(close) * (1.0 + rng.gen_range(0.0..0.01)),
            low: open.min(close) * (1.0 - rng.gen_range(0.0..0.01)),
            close,
            volume: rng.gen_range(500_000.0..5_000_000.0),
        });

        price = close;
        current += chrono::Duration::days(1);
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parses_capitalised_headers_and_sorts() {
        let csv = "Date,Open,High,Low,Close,Volume\n\
                   2024-01-03,101,103,100,102,2000\n\
                   2024-01-02,99,101,98,100,1000\n";
        let points = read_prices(csv.as_bytes(), "test").unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, d(2024, 1, 2));
        assert_eq!(points[1].close, 102.0);
        assert_eq!(points[1].volume, 2000.0);
    }

    #[test]
    fn close_only_file_defaults_other_columns() {
        let csv = "date,close\n2024-01-02 00:00:00,50.5\n";
        let points = read_prices(csv.as_bytes(), "test").unwrap();
        assert_eq!(points[0], PricePoint::from_close(d(2024, 1, 2), 50.5));
    }

    #[test]
    fn bad_rows_are_skipped() {
        let csv = "date,close\n2024-01-02,10\nnot-a-date,11\n2024-01-04,\n2024-01-05,-3\n2024-01-08,12\n";
        let points = read_prices(csv.as_bytes(), "test").unwrap();
        let dates: Vec<NaiveDate> = points.iter().map(|p| p.date).collect();
        assert_eq!(dates, [d(2024, 1, 2), d(2024, 1, 8)]);
    }

    #[test]
    fn missing_close_column_is_an_error() {
        let err = read_prices("date,open\n2024-01-02,1\n".as_bytes(), "prices.csv").unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn { ref column, .. } if column == "close"));
    }

    #[test]
    fn duplicate_dates_are_rejected() {
        let csv = "date,close\n2024-01-02,10\n2024-01-02,11\n";
        let err = read_prices(csv.as_bytes(), "dup.csv").unwrap_err();
        assert!(matches!(err, LoadError::DuplicateDate { date, .. } if date == d(2024, 1, 2)));
    }

    #[test]
    fn predictions_parse() {
        let csv = "date,predicted_close\n2024-02-01,100.5\n2024-01-31,99.0\nbad,1\n";
        let preds = read_predictions(csv.as_bytes(), "p.csv").unwrap();
        assert_eq!(preds.len(), 2);
        assert_eq!(preds[0].date, d(2024, 1, 31));
        assert_eq!(preds[1].predicted_close, 100.5);
    }

    #[test]
    fn synthetic_is_deterministic_per_symbol() {
        let a = generate_synthetic_points("AAA", d(2024, 1, 1), d(2024, 3, 31));
        let b = generate_synthetic_points("AAA", d(2024, 1, 1), d(2024, 3, 31));
        let c = generate_synthetic_points("BBB", d(2024, 1, 1), d(2024, 3, 31));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.iter().all(|p| p.is_sane()));
        assert!(a.iter().all(|p| p.date.weekday().number_from_monday() <= 5));
    }

    #[test]
    fn dataset_hash_is_content_addressed() {
        let a = generate_synthetic_points("AAA", d(2024, 1, 1), d(2024, 2, 1));
        let mut b = a.clone();
        assert_eq!(dataset_hash(&a), dataset_hash(&b));
        b[3].close += 0.01;
        assert_ne!(dataset_hash(&a), dataset_hash(&b));
    }

    #[test]
    fn missing_file_without_synthetic_fails() {
        let dir = tempfile::tempdir().unwrap();
        let opts = LoadOptions {
            data_dir: dir.path().to_path_buf(),
            start: None,
            end: None,
            synthetic: false,
        };
        assert!(matches!(load_symbol("ZZZ", &opts), Err(LoadError::NotFound { .. })));
    }

    #[test]
    fn date_range_filters_rows() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("XYZ.csv"),
            "date,close\n2024-01-02,1\n2024-01-03,2\n2024-01-04,3\n",
        )
        .unwrap();
        let opts = LoadOptions {
            data_dir: dir.path().to_path_buf(),
            start: Some(d(2024, 1, 3)),
            end: Some(d(2024, 1, 3)),
            synthetic: false,
        };
        let loaded = load_symbol("XYZ", &opts).unwrap();
        assert_eq!(loaded.points.len(), 1);
        assert!(!loaded.is_synthetic());

        let opts = LoadOptions {
            start: Some(d(2025, 1, 1)),
            end: None,
            ..opts
        };
        assert!(matches!(load_symbol("XYZ", &opts), Err(LoadError::NoData { .. })));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn loaded_rows_are_sorted_and_positive(
                rows in proptest::collection::btree_map(0u32..400, -50.0f64..500.0, 1..60)
            ) {
                let base = d(2023, 1, 1);
                // write in reverse to exercise sorting
                let mut csv = String::from("date,close\n");
                for (offset, close) in rows.iter().rev() {
                    let date = base + chrono::Duration::days(i64::from(*offset));
                    csv.push_str(&format!("{date},{close}\n"));
                }
                let points = read_prices(csv.as_bytes(), "prop.csv").unwrap();
                prop_assert!(points.windows(2).all(|w| w[0].date < w[1].date));
                prop_assert!(points.iter().all(|p| p.close > 0.0));
                let expected = rows.values().filter(|c| **c > 0.0).count();
                prop_assert_eq!(points.len(), expected);
            }

            #[test]
            fn synthetic_rows_are_sane(symbol in "[A-Z]{1,5}", days in 1i64..200) {
                let start = d(2024, 1, 1);
                let points = generate_synthetic_points(&symbol, start, start + chrono::Duration::days(days));
                prop_assert!(points.iter().all(|p| p.is_sane()));
                prop_assert!(points.windows(2).all(|w| w[0].date < w[1].date));
            }
        }
    }
}
