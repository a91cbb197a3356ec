use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use chrono_tz::Tz;
use csv::StringRecord;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::data::{localize, Bar};
use crate::error::PipelineError;
use crate::symbol::{exchange_timezone, fallback_symbol};

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("unable to infer timestamp from value '{0}'")]
    Timestamp(String),

    #[error("failed to parse numeric field '{field}' from value '{value}'")]
    ParseNumber { field: &'static str, value: String },

    #[error("field '{field}' is out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
}

/// One closing price, used by comparison mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Tz>,
    pub value: f64,
}

/// Supplier of raw daily OHLCV history.
pub trait BarSource {
    /// Bars for `symbol` dated on or after `start`; an unknown symbol yields no bars.
    fn fetch(&self, symbol: &str, start: NaiveDate) -> Result<Vec<Bar>>;

    /// Closing prices for `symbol`, adjusted for corporate actions when available.
    fn fetch_closes(&self, symbol: &str, start: NaiveDate) -> Result<Vec<PricePoint>> {
        Ok(self
            .fetch(symbol, start)?
            .into_iter()
            .map(|bar| PricePoint {
                timestamp: bar.timestamp,
                value: bar.close,
            })
            .collect())
    }
}

/// Reads `<dir>/<SYMBOL>.csv` files exported from the upstream data source.
#[derive(Debug, Clone)]
pub struct CsvDirectorySource {
    dir: PathBuf,
}

impl CsvDirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }

    fn load(&self, symbol: &str) -> Result<Option<Vec<ParsedRow>>> {
        let path = self.path_for(symbol);
        if !path.exists() {
            debug!(symbol, path = %path.display(), "no data file for symbol");
            return Ok(None);
        }
        let rows = load_rows_from_csv(&path, exchange_timezone(symbol))
            .with_context(|| format!("failed to load data for {symbol} from {:?}", path))?;
        Ok(Some(rows))
    }
}

impl BarSource for CsvDirectorySource {
    fn fetch(&self, symbol: &str, start: NaiveDate) -> Result<Vec<Bar>> {
        let Some(rows) = self.load(symbol)? else {
            return Ok(Vec::new());
        };
        let bars: Vec<Bar> = rows
            .into_iter()
            .map(|row| row.bar)
            .filter(|bar| bar.date() >= start)
            .collect();
        Ok(into_series(bars, |bar| bar.timestamp))
    }

    fn fetch_closes(&self, symbol: &str, start: NaiveDate) -> Result<Vec<PricePoint>> {
        let Some(rows) = self.load(symbol)? else {
            return Ok(Vec::new());
        };
        let points: Vec<PricePoint> = rows
            .into_iter()
            .filter(|row| row.bar.date() >= start)
            .map(|row| PricePoint {
                value: row.adj_close.unwrap_or(row.bar.close),
                timestamp: row.bar.timestamp,
            })
            .collect();
        Ok(into_series(points, |point| point.timestamp))
    }
}

/// Result of a fetch, naming the symbol that actually produced data.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub symbol: String,
    pub bars: Vec<Bar>,
}

/// Fetch `symbol`, retrying once against its fallback contract when the
/// primary query is empty.
pub fn fetch_with_fallback(
    source: &dyn BarSource,
    symbol: &str,
    start: NaiveDate,
) -> Result<Fetched> {
    let bars = source.fetch(symbol, start)?;
    if !bars.is_empty() {
        info!(symbol, bars = bars.len(), %start, "fetched daily bars");
        return Ok(Fetched {
            symbol: symbol.to_string(),
            bars,
        });
    }

    if let Some(alternate) = fallback_symbol(symbol) {
        warn!(symbol, alternate, "primary query returned no rows, retrying with fallback");
        let bars = source.fetch(alternate, start)?;
        if !bars.is_empty() {
            info!(symbol = alternate, bars = bars.len(), %start, "fetched daily bars");
            return Ok(Fetched {
                symbol: alternate.to_string(),
                bars,
            });
        }
    }

    Err(PipelineError::FetchEmpty {
        symbol: symbol.to_string(),
    }
    .into())
}

/// Sort by timestamp and keep the first row of any duplicated timestamp.
fn into_series<T, F>(mut rows: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> DateTime<Tz>,
{
    rows.sort_by_key(|row| key(row));
    let before = rows.len();
    rows.dedup_by(|later, earlier| key(later) == key(earlier));
    if rows.len() < before {
        warn!(removed = before - rows.len(), "dropped rows with duplicate timestamps");
    }
    rows
}

#[derive(Debug, Clone)]
struct ParsedRow {
    bar: Bar,
    adj_close: Option<f64>,
}

/// Column positions taken from a named header row.
///
/// Multi-row headers keep only their first row; the trailing header rows
/// (ticker names, an empty `Date` row) fail numeric coercion and are dropped
/// like any other malformed row.
#[derive(Debug, Clone, Copy)]
struct ColumnLayout {
    timestamp: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    adj_close: Option<usize>,
    volume: usize,
}

impl ColumnLayout {
    fn from_header(record: &StringRecord) -> Option<Self> {
        let find = |names: &[&str]| {
            record
                .iter()
                .position(|field| names.iter().any(|name| field.eq_ignore_ascii_case(name)))
        };
        Some(Self {
            timestamp: find(&["date", "datetime", "timestamp"]).unwrap_or(0),
            open: find(&["open"])?,
            high: find(&["high"])?,
            low: find(&["low"])?,
            close: find(&["close"])?,
            adj_close: find(&["adj close", "adj_close", "adjclose"]),
            volume: find(&["volume"])?,
        })
    }

    fn parse(&self, record: &StringRecord, tz: Tz) -> Result<ParsedRow, LoaderError> {
        let field = |idx: usize| record.get(idx).map(str::trim);
        let timestamp = parse_timestamp(field(self.timestamp).unwrap_or_default(), tz)?;
        let bar = Bar {
            timestamp,
            open: parse_price(field(self.open), "open")?,
            high: parse_non_negative(field(self.high), "high")?,
            low: parse_non_negative(field(self.low), "low")?,
            close: parse_price(field(self.close), "close")?,
            volume: parse_non_negative(field(self.volume), "volume")?,
        };
        let adj_close = match self.adj_close {
            Some(idx) => Some(parse_price(field(idx), "adj close")?),
            None => None,
        };
        Ok(ParsedRow { bar, adj_close })
    }
}

fn load_rows_from_csv<P: AsRef<Path>>(path: P, tz: Tz) -> Result<Vec<ParsedRow>> {
    let path_ref = path.as_ref();
    let file = File::open(path_ref).with_context(|| format!("failed to open {:?}", path_ref))?;
    read_rows(file, tz)
}

fn read_rows<R: Read>(input: R, tz: Tz) -> Result<Vec<ParsedRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(input);

    let mut layout: Option<ColumnLayout> = None;
    let mut seen_content = false;
    let mut rows = Vec::new();
    let mut dropped = 0usize;
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        if !seen_content {
            seen_content = true;
            layout = ColumnLayout::from_header(&record);
            if layout.is_some() {
                continue;
            }
        }

        let parsed = match &layout {
            Some(layout) => layout.parse(&record, tz).map(Some),
            None => parse_positional(&record, tz),
        };
        match parsed {
            Ok(Some(row)) => rows.push(row),
            Ok(None) => continue,
            Err(err) => {
                debug!(%err, "dropping row");
                dropped += 1;
            }
        }
    }

    if dropped > 0 {
        warn!(dropped, kept = rows.len(), "dropped rows that failed numeric coercion");
    }
    Ok(rows)
}

/// Headerless `date[,time],open,high,low,close,volume` rows.
fn parse_positional(record: &StringRecord, tz: Tz) -> Result<Option<ParsedRow>, LoaderError> {
    // Skip header rows by checking the first field.
    if let Some(first) = record.get(0) {
        if first.eq_ignore_ascii_case("date") {
            return Ok(None);
        }
    }

    let fields: Vec<&str> = record.iter().filter(|f| !f.is_empty()).collect();
    if fields.len() < 6 {
        return Ok(None);
    }

    let (timestamp, offset) = if fields.len() >= 7 {
        let date = parse_date(fields[0])?;
        let time = parse_time(fields[1])?;
        (localize(tz, NaiveDateTime::new(date, time)), 2)
    } else {
        (parse_timestamp(fields[0], tz)?, 1)
    };

    let field = |idx: usize| fields.get(offset + idx).copied();
    let bar = Bar {
        timestamp,
        open: parse_price(field(0), "open")?,
        high: parse_non_negative(field(1), "high")?,
        low: parse_non_negative(field(2), "low")?,
        close: parse_price(field(3), "close")?,
        volume: parse_non_negative(field(4), "volume")?,
    };
    Ok(Some(ParsedRow {
        bar,
        adj_close: None,
    }))
}

/// Parse a numeric cell, treating blanks, text and non-finite values as failures.
fn parse_number(value: Option<&str>, field: &'static str) -> Result<f64, LoaderError> {
    let value = value.unwrap_or_default();
    value
        .replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
        .ok_or_else(|| LoaderError::ParseNumber {
            field,
            value: value.to_string(),
        })
}

/// Open and close must be strictly positive.
fn parse_price(value: Option<&str>, field: &'static str) -> Result<f64, LoaderError> {
    match parse_number(value, field)? {
        number if number > 0.0 => Ok(number),
        number => Err(LoaderError::OutOfRange { field, value: number }),
    }
}

fn parse_non_negative(value: Option<&str>, field: &'static str) -> Result<f64, LoaderError> {
    match parse_number(value, field)? {
        number if number >= 0.0 => Ok(number),
        number => Err(LoaderError::OutOfRange { field, value: number }),
    }
}

fn parse_timestamp(value: &str, tz: Tz) -> Result<DateTime<Tz>, LoaderError> {
    let trimmed = value.trim();
    if let Ok(datetime) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(datetime.with_timezone(&tz));
    }
    if let Ok(datetime) = DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%:z") {
        return Ok(datetime.with_timezone(&tz));
    }

    let patterns = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
    ];
    for pattern in &patterns {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, pattern) {
            return Ok(localize(tz, datetime));
        }
    }

    let date = parse_date(trimmed)?;
    Ok(localize(tz, date.and_time(NaiveTime::MIN)))
}

fn parse_date(value: &str) -> Result<NaiveDate, LoaderError> {
    let patterns = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%Y%m%d"];
    for pattern in &patterns {
        if let Ok(date) = NaiveDate::parse_from_str(value, pattern) {
            return Ok(date);
        }
    }
    Err(LoaderError::Timestamp(value.to_string()))
}

fn parse_time(value: &str) -> Result<NaiveTime, LoaderError> {
    let patterns = ["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"];
    for pattern in &patterns {
        if let Ok(time) = NaiveTime::parse_from_str(value, pattern) {
            return Ok(time);
        }
    }
    Err(LoaderError::Timestamp(value.to_string()))
}
