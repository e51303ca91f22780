//! CSV file data adapter.

use crate::domain::error::ScalptraderError;
use crate::domain::ohlcv::Bar;
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use std::path::PathBuf;
use tracing::info;

const TIME_COLUMNS: [&str; 6] = ["time", "timestamp", "date", "datetime", "gmt time", "local time"];

const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d.%m.%Y %H:%M:%S%.3f",
];

pub struct CsvAdapter {
    path: PathBuf,
}

/// Column positions resolved from the header row.
struct Columns {
    time: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self, ScalptraderError> {
        let names: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
        let find = |wanted: &str| -> Result<usize, ScalptraderError> {
            names
                .iter()
                .position(|n| n == wanted)
                .ok_or_else(|| ScalptraderError::DataLoad {
                    reason: format!("missing {} column", wanted),
                })
        };

        let time = names
            .iter()
            .position(|n| TIME_COLUMNS.contains(&n.as_str()))
            .ok_or_else(|| ScalptraderError::DataLoad {
                reason: "missing time column".into(),
            })?;

        Ok(Columns {
            time,
            open: find("open")?,
            high: find("high")?,
            low: find("low")?,
            close: find("close")?,
            volume: find("volume")?,
        })
    }
}

pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_field(record: &StringRecord, index: usize, name: &str, line: usize) -> Result<f64, ScalptraderError> {
    let raw = record.get(index).ok_or_else(|| ScalptraderError::DataLoad {
        reason: format!("row {}: missing {} value", line, name),
    })?;
    raw.trim().parse().map_err(|e| ScalptraderError::DataLoad {
        reason: format!("row {}: invalid {} value '{}': {}", line, name, raw, e),
    })
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self) -> Result<Vec<Bar>, ScalptraderError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|e| ScalptraderError::DataLoad {
                reason: format!("failed to read {}: {}", self.path.display(), e),
            })?;

        let columns = Columns::from_headers(rdr.headers()?)?;
        let mut bars = Vec::new();
        let mut dropped = 0usize;

        for (row, result) in rdr.records().enumerate() {
            let record = result?;
            // header is line 1
            let line = row + 2;

            let time_str = record.get(columns.time).unwrap_or_default();
            let timestamp = parse_timestamp(time_str).ok_or_else(|| ScalptraderError::DataLoad {
                reason: format!("row {}: unrecognised timestamp '{}'", line, time_str),
            })?;

            let volume = parse_field(&record, columns.volume, "volume", line)?;
            if volume == 0.0 {
                dropped += 1;
                continue;
            }

            bars.push(Bar::new(
                timestamp,
                parse_field(&record, columns.open, "open", line)?,
                parse_field(&record, columns.high, "high", line)?,
                parse_field(&record, columns.low, "low", line)?,
                parse_field(&record, columns.close, "close", line)?,
                volume,
            ));
        }

        bars.sort_by_key(|b| b.timestamp);
        info!(
            path = %self.path.display(),
            bars = bars.len(),
            dropped_zero_volume = dropped,
            "loaded bars"
        );
        Ok(bars)
    }
}
