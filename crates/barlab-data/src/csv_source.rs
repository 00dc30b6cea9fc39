//! CSV data source.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use barlab_core::error::DataError;
use barlab_core::traits::DataSource;
use barlab_core::types::{validate_series, Bar};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Deserialize;
use tracing::{debug, info};

const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];

/// CSV record format.
///
/// Covers backtrader-style files (`Date,Open,High,Low,Close,Volume,OpenInterest`,
/// optionally a separate `Time` column) and generic lowercase OHLCV exports.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(
        alias = "Date",
        alias = "Datetime",
        alias = "datetime",
        alias = "timestamp",
        alias = "Timestamp"
    )]
    date: String,
    #[serde(alias = "Time", default)]
    time: Option<String>,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close")]
    close: f64,
    #[serde(alias = "Volume", default)]
    volume: Option<f64>,
    #[serde(
        alias = "OpenInterest",
        alias = "openinterest",
        alias = "Open Interest",
        default
    )]
    open_interest: Option<f64>,
}

/// CSV data source for historical bars.
///
/// Rows are taken in file order: a file that is not strictly ascending in
/// time is rejected rather than sorted.
#[derive(Debug, Clone)]
pub struct CsvDataSource {
    path: PathBuf,
    name: String,
    date_format: Option<String>,
}

impl CsvDataSource {
    /// Create a new CSV data source.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DataError::NoDataAvailable);
        }
        Ok(Self {
            path: path.to_path_buf(),
            name: path.display().to_string(),
            date_format: None,
        })
    }

    /// Parse the date column with this chrono format instead of guessing.
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = Some(format.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse bars from any CSV input.
    fn parse<R: Read>(&self, input: R) -> Result<Vec<Bar>, DataError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(input);

        let mut headers = reader.headers().map_err(parse_error)?.clone();
        // yfinance writes "Price" over the date column, then Ticker/Date filler rows
        let yfinance = headers.get(0) == Some("Price");
        if yfinance {
            headers = headers
                .iter()
                .enumerate()
                .map(|(i, h)| if i == 0 { "Date" } else { h })
                .collect::<StringRecord>();
        }

        let mut bars = Vec::new();
        for (row, result) in reader.records().enumerate() {
            let row = row + 1;
            let record = result.map_err(|e| DataError::ParseError(format!("row {row}: {e}")))?;
            if yfinance && matches!(record.get(0), Some("Ticker" | "Date")) {
                continue;
            }

            let raw: CsvRecord = record
                .deserialize(Some(&headers))
                .map_err(|e| DataError::ParseError(format!("row {row}: {e}")))?;
            let timestamp = self.parse_timestamp(&raw.date, raw.time.as_deref())?;

            let mut bar = Bar::new(
                timestamp,
                raw.open,
                raw.high,
                raw.low,
                raw.close,
                raw.volume.unwrap_or(0.0),
            );
            if let Some(open_interest) = raw.open_interest {
                bar = bar.with_open_interest(open_interest);
            }
            bars.push(bar);
        }

        if bars.is_empty() {
            return Err(DataError::NoDataAvailable);
        }
        validate_series(&bars)?;
        debug!(bars = bars.len(), "parsed csv");
        Ok(bars)
    }

    /// Parse various timestamp formats into Unix milliseconds (UTC).
    fn parse_timestamp(&self, date: &str, time: Option<&str>) -> Result<i64, DataError> {
        let text = match time.filter(|t| !t.is_empty()) {
            Some(time) => format!("{date} {time}"),
            None => date.to_string(),
        };

        if let Some(format) = &self.date_format {
            return parse_with(&text, format).ok_or_else(|| {
                DataError::ParseError(format!("Date '{text}' does not match format '{format}'"))
            });
        }

        for format in DATETIME_FORMATS.iter().chain(DATE_FORMATS.iter()) {
            if let Some(ts) = parse_with(&text, format) {
                return Ok(ts);
            }
        }

        // Offset-aware, e.g. intraday yfinance exports
        if let Ok(dt) = DateTime::parse_from_rfc3339(&text)
            .or_else(|_| DateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S%:z"))
        {
            return Ok(dt.timestamp_millis());
        }

        // Unix timestamp, milliseconds if more than 10 digits
        if let Ok(ts) = text.parse::<i64>() {
            return Ok(if ts > 10_000_000_000 { ts } else { ts * 1000 });
        }

        Err(DataError::ParseError(format!("Could not parse date: {text}")))
    }
}

fn parse_with(text: &str, format: &str) -> Option<i64> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
        return Some(dt.and_utc().timestamp_millis());
    }
    NaiveDate::parse_from_str(text, format)
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN).and_utc().timestamp_millis())
}

fn parse_error(e: csv::Error) -> DataError {
    DataError::ParseError(e.to_string())
}

impl DataSource for CsvDataSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> Result<Vec<Bar>, DataError> {
        let file = File::open(&self.path)?;
        let bars = self.parse(file)?;
        info!(path = %self.name, bars = bars.len(), "loaded bars from csv");
        Ok(bars)
    }
}
