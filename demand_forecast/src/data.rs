//! Demand series storage and loading
//!
//! A [`DemandSeries`] is a contiguous daily series of non-negative sales. The
//! [`SeriesStore`] loads one from JSON, CSV or in-memory records and falls back to a
//! synthetic series when the source file is missing, unreadable or not parseable at all.
//! Records that parse structurally but carry bad values are fatal.

use crate::error::{ForecastError, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::f64::consts::PI;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Where a series came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeriesOrigin {
    /// Loaded from real sales records
    Historical,
    /// Generated because no usable historical data was supplied
    Synthetic,
}

/// One observed (or predicted) day of demand
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemandPoint {
    pub date: NaiveDate,
    pub sales: f64,
}

/// A raw (date, quantity) record supplied by a caller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub quantity: f64,
}

/// Daily demand series: strictly increasing, gap-free dates with finite, non-negative sales
#[derive(Debug, Clone, PartialEq)]
pub struct DemandSeries {
    dates: Vec<NaiveDate>,
    sales: Vec<f64>,
    origin: SeriesOrigin,
}

impl DemandSeries {
    /// Build a historical series from points in date order
    pub fn new(points: Vec<DemandPoint>) -> Result<Self> {
        Self::with_origin(points, SeriesOrigin::Historical)
    }

    /// Build a series from points, tagging where it came from
    pub fn with_origin(points: Vec<DemandPoint>, origin: SeriesOrigin) -> Result<Self> {
        if points.is_empty() {
            return Err(ForecastError::DataError(
                "Demand series must contain at least one observation".to_string(),
            ));
        }

        let mut series = Self {
            dates: Vec::with_capacity(points.len()),
            sales: Vec::with_capacity(points.len()),
            origin,
        };

        for point in points {
            if let Some(last) = series.last_date() {
                if point.date <= last {
                    return Err(ForecastError::DataError(format!(
                        "Dates must be strictly increasing: {} follows {}",
                        point.date, last
                    )));
                }
                if point.date != last + Duration::days(1) {
                    return Err(ForecastError::DataError(format!(
                        "Gap in daily series between {} and {}",
                        last, point.date
                    )));
                }
            }
            validate_sales(point.date, point.sales)?;
            series.dates.push(point.date);
            series.sales.push(point.sales);
        }

        Ok(series)
    }

    /// Build a series of consecutive days starting at `start`
    pub fn from_values(start: NaiveDate, sales: Vec<f64>) -> Result<Self> {
        let points = sales
            .into_iter()
            .enumerate()
            .map(|(i, sales)| DemandPoint {
                date: start + Duration::days(i as i64),
                sales,
            })
            .collect();
        Self::new(points)
    }

    /// Number of days in the series
    pub fn len(&self) -> usize {
        self.sales.len()
    }

    /// Check if the series is empty
    pub fn is_empty(&self) -> bool {
        self.sales.is_empty()
    }

    /// The dates, oldest first
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// The sales values, aligned with [`dates`](Self::dates)
    pub fn values(&self) -> &[f64] {
        &self.sales
    }

    /// Where this series came from
    pub fn origin(&self) -> SeriesOrigin {
        self.origin
    }

    /// True when the series was generated rather than loaded
    pub fn is_synthetic(&self) -> bool {
        self.origin == SeriesOrigin::Synthetic
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// The day after the last observation
    pub fn next_date(&self) -> Option<NaiveDate> {
        self.last_date().map(|d| d + Duration::days(1))
    }

    /// Sales on a given date, if the series covers it
    pub fn sales_on(&self, date: NaiveDate) -> Option<f64> {
        let first = self.first_date()?;
        let offset = (date - first).num_days();
        if offset < 0 {
            return None;
        }
        self.sales.get(offset as usize).copied()
    }

    /// Iterate over the points in date order
    pub fn iter(&self) -> impl Iterator<Item = DemandPoint> + '_ {
        self.dates
            .iter()
            .zip(self.sales.iter())
            .map(|(&date, &sales)| DemandPoint { date, sales })
    }

    /// The last `n` days as a new series (the whole series if shorter)
    pub fn tail(&self, n: usize) -> Self {
        let start = self.len().saturating_sub(n);
        Self {
            dates: self.dates[start..].to_vec(),
            sales: self.sales[start..].to_vec(),
            origin: self.origin,
        }
    }

    /// Append the next consecutive day, returning its date
    pub(crate) fn append_next(&mut self, sales: f64) -> Result<NaiveDate> {
        let date = self.next_date().ok_or_else(|| {
            ForecastError::DataError("Cannot extend an empty series".to_string())
        })?;
        validate_sales(date, sales)?;
        self.dates.push(date);
        self.sales.push(sales);
        Ok(date)
    }
}

fn validate_sales(date: NaiveDate, sales: f64) -> Result<()> {
    if !sales.is_finite() {
        return Err(ForecastError::DataError(format!(
            "Sales on {} is not a finite number",
            date
        )));
    }
    if sales < 0.0 {
        return Err(ForecastError::DataError(format!(
            "Sales on {} is negative ({})",
            date, sales
        )));
    }
    Ok(())
}

/// Source of a historical demand series
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesSource {
    /// JSON document of the form `{"sales": [{"date": "YYYY-MM-DD", "quantity": 12}, ...]}`
    JsonFile(PathBuf),
    /// CSV table with a `date` column and a `quantity` (or `sales`) column
    CsvFile(PathBuf),
    /// Records already in memory
    Records(Vec<SalesRecord>),
    /// No historical data; generate the synthetic series
    Synthetic,
}

/// First day of the synthetic fallback range
pub const SYNTHETIC_START: (i32, u32, u32) = (2023, 1, 1);
/// Last day (inclusive) of the synthetic fallback range
pub const SYNTHETIC_END: (i32, u32, u32) = (2025, 5, 29);

/// Loads demand series, falling back to synthetic data when the source is unusable
#[derive(Debug, Clone, Default)]
pub struct SeriesStore {
    fallback_seed: Option<u64>,
}

impl SeriesStore {
    /// Create a store whose synthetic fallback is entropy-seeded
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose synthetic fallback is reproducible
    pub fn with_fallback_seed(seed: Option<u64>) -> Self {
        Self {
            fallback_seed: seed,
        }
    }

    /// Load a series from the given source
    pub fn load(&self, source: SeriesSource) -> Result<DemandSeries> {
        let series = match source {
            SeriesSource::JsonFile(path) => match read_source(&path) {
                Some(text) => match serde_json::from_str::<Value>(&text) {
                    Ok(doc) => parse_json_document(&doc)?,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Corrupt JSON sales data, using synthetic series");
                        self.synthetic()?
                    }
                },
                None => self.synthetic()?,
            },
            SeriesSource::CsvFile(path) => match read_csv_frame(&path) {
                Some(df) => parse_csv_frame(&df)?,
                None => self.synthetic()?,
            },
            SeriesSource::Records(records) => series_from_records(records)?,
            SeriesSource::Synthetic => self.synthetic()?,
        };

        info!(
            days = series.len(),
            origin = ?series.origin(),
            first = ?series.first_date(),
            last = ?series.last_date(),
            "Loaded demand series"
        );
        Ok(series)
    }

    /// Generate the synthetic fallback series
    pub fn synthetic(&self) -> Result<DemandSeries> {
        let start = ymd(SYNTHETIC_START)?;
        let end = ymd(SYNTHETIC_END)?;
        let mut rng = match self.fallback_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        synthetic_series(start, end, &mut rng)
    }
}

/// Sinusoid over the whole range (two full cycles) plus N(100, 20) noise, clamped at zero
pub fn synthetic_series<R: Rng>(
    start: NaiveDate,
    end: NaiveDate,
    rng: &mut R,
) -> Result<DemandSeries> {
    if end < start {
        return Err(ForecastError::InvalidParameter(format!(
            "Synthetic range ends ({}) before it starts ({})",
            end, start
        )));
    }

    let days = (end - start).num_days() as usize + 1;
    let noise = Normal::new(100.0, 20.0)
        .map_err(|e| ForecastError::InvalidParameter(e.to_string()))?;
    let step = if days > 1 {
        4.0 * PI / (days - 1) as f64
    } else {
        0.0
    };

    let points = (0..days)
        .map(|i| {
            let seasonal = 50.0 * (step * i as f64).sin();
            DemandPoint {
                date: start + Duration::days(i as i64),
                sales: (rng.sample(noise) + seasonal).max(0.0),
            }
        })
        .collect();

    DemandSeries::with_origin(points, SeriesOrigin::Synthetic)
}

fn ymd((y, m, d): (i32, u32, u32)) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
        .ok_or_else(|| ForecastError::InvalidParameter(format!("Invalid date {}-{}-{}", y, m, d)))
}

/// Read a whole file, treating any IO failure as "no historical data"
fn read_source(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Sales data unavailable, using synthetic series");
            None
        }
    }
}

fn read_csv_frame(path: &Path) -> Option<DataFrame> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Sales data unavailable, using synthetic series");
            return None;
        }
    };

    match CsvReader::new(file).infer_schema(None).has_header(true).finish() {
        Ok(df) => Some(df),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Corrupt CSV sales data, using synthetic series");
            None
        }
    }
}

/// Parse a date as `YYYY-MM-DD`, also accepting a trailing time of day
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    let text = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(date);
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(dt.date());
        }
    }
    Err(ForecastError::ParseError(format!(
        "Unparseable date '{}'",
        text
    )))
}

fn parse_json_document(doc: &Value) -> Result<DemandSeries> {
    let records = doc
        .get("sales")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            ForecastError::DataError("JSON sales data must contain a 'sales' array".to_string())
        })?;

    let parsed = records
        .iter()
        .enumerate()
        .map(|(idx, record)| parse_json_record(idx, record))
        .collect::<Result<Vec<_>>>()?;

    series_from_records(parsed)
}

fn parse_json_record(idx: usize, record: &Value) -> Result<SalesRecord> {
    let date = record
        .get("date")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            ForecastError::DataError(format!("Sales record {} has no 'date' string", idx))
        })?;
    let quantity = record
        .get("quantity")
        .or_else(|| record.get("sales"))
        .ok_or_else(|| {
            ForecastError::DataError(format!("Sales record {} has no 'quantity'", idx))
        })?;
    let quantity = quantity.as_f64().ok_or_else(|| {
        ForecastError::ParseError(format!(
            "Sales record {} has non-numeric quantity {}",
            idx, quantity
        ))
    })?;

    Ok(SalesRecord {
        date: parse_date(date)?,
        quantity,
    })
}

fn parse_csv_frame(df: &DataFrame) -> Result<DemandSeries> {
    let date_col = df
        .column("date")
        .map_err(|e| ForecastError::DataError(format!("Column 'date' not found: {}", e)))?;
    let quantity_col = df
        .column("quantity")
        .or_else(|_| df.column("sales"))
        .map_err(|e| {
            ForecastError::DataError(format!("Column 'quantity' or 'sales' not found: {}", e))
        })?;

    let dates = match date_col.dtype() {
        DataType::Utf8 => date_col
            .utf8()?
            .into_iter()
            .enumerate()
            .map(|(idx, d)| match d {
                Some(d) => parse_date(d),
                None => Err(ForecastError::DataError(format!(
                    "Row {} has no date",
                    idx
                ))),
            })
            .collect::<Result<Vec<_>>>()?,
        other => {
            return Err(ForecastError::DataError(format!(
                "Column 'date' must hold text dates, found {}",
                other
            )))
        }
    };

    let quantities: Vec<Option<f64>> = match quantity_col.dtype() {
        DataType::Float64 => quantity_col.f64()?.into_iter().collect(),
        DataType::Float32 => quantity_col
            .f32()?
            .into_iter()
            .map(|v| v.map(f64::from))
            .collect(),
        DataType::Int64 => quantity_col
            .i64()?
            .into_iter()
            .map(|v| v.map(|v| v as f64))
            .collect(),
        DataType::Int32 => quantity_col
            .i32()?
            .into_iter()
            .map(|v| v.map(f64::from))
            .collect(),
        other => {
            return Err(ForecastError::ParseError(format!(
                "Quantity column is not numeric (found {})",
                other
            )))
        }
    };

    let records = dates
        .into_iter()
        .zip(quantities)
        .enumerate()
        .map(|(idx, (date, quantity))| {
            quantity
                .map(|quantity| SalesRecord { date, quantity })
                .ok_or_else(|| ForecastError::DataError(format!("Row {} has no quantity", idx)))
        })
        .collect::<Result<Vec<_>>>()?;

    series_from_records(records)
}

/// Order records by date and validate them into a historical series
pub fn series_from_records(mut records: Vec<SalesRecord>) -> Result<DemandSeries> {
    records.sort_by_key(|r| r.date);
    let points = records
        .into_iter()
        .map(|r| DemandPoint {
            date: r.date,
            sales: r.quantity,
        })
        .collect();
    DemandSeries::new(points)
}
