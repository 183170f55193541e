use std::path::PathBuf;

use core_sim::{PriceBar, PriceGenerator};
use serde::Deserialize;
use thiserror::Error;
use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime,
};

/// Calendar range of bars to fetch, end-exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: Date,
    pub end: Date,
}

impl DateRange {
    pub fn new(start: Date, end: Date) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, timestamp: OffsetDateTime) -> bool {
        let date = timestamp.date();
        date >= self.start && date < self.end
    }

    pub fn days(&self) -> usize {
        usize::try_from((self.end - self.start).whole_days()).unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("price data unavailable for {instrument}: {reason}")]
    DataUnavailable { instrument: String, reason: String },
}

impl SourceError {
    fn unavailable(instrument: &str, reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            instrument: instrument.to_owned(),
            reason: reason.into(),
        }
    }
}

/// Produces closing prices for one instrument over a date range, in the
/// order the provider delivers them. Ordering is checked downstream.
pub trait PriceSource {
    fn fetch(&self, instrument: &str, range: DateRange) -> Result<Vec<PriceBar>, SourceError>;
}

/// Reads `<data_dir>/<instrument>.csv`. Needs a `timestamp`/`date`/`Date`
/// column and a `close`/`Close` column; anything else is ignored, so
/// Yahoo-style exports load as-is.
#[derive(Debug, Clone)]
pub struct CsvPriceSource {
    data_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct PriceRow {
    #[serde(alias = "date", alias = "Date")]
    timestamp: String,
    #[serde(alias = "Close")]
    close: f64,
}

impl CsvPriceSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn path_for(&self, instrument: &str) -> PathBuf {
        self.data_dir.join(format!("{instrument}.csv"))
    }
}

impl PriceSource for CsvPriceSource {
    fn fetch(&self, instrument: &str, range: DateRange) -> Result<Vec<PriceBar>, SourceError> {
        let path = self.path_for(instrument);
        let mut reader = csv::Reader::from_path(&path).map_err(|err| {
            SourceError::unavailable(instrument, format!("{}: {err}", path.display()))
        })?;

        let mut bars = Vec::new();
        for (row_index, row) in reader.deserialize::<PriceRow>().enumerate() {
            let row = row.map_err(|err| {
                SourceError::unavailable(instrument, format!("row {}: {err}", row_index + 1))
            })?;
            let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| {
                SourceError::unavailable(
                    instrument,
                    format!("row {}: unrecognised timestamp {:?}", row_index + 1, row.timestamp),
                )
            })?;
            if range.contains(timestamp) {
                bars.push(PriceBar::new(timestamp, row.close));
            }
        }

        if bars.is_empty() {
            return Err(SourceError::unavailable(
                instrument,
                format!("no rows between {} and {}", range.start, range.end),
            ));
        }

        tracing::debug!(instrument, rows = bars.len(), path = %path.display(), "loaded price csv");
        Ok(bars)
    }
}

/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates (taken as
/// midnight UTC).
pub fn parse_timestamp(value: &str) -> Option<OffsetDateTime> {
    let value = value.trim();
    OffsetDateTime::parse(value, &Rfc3339).ok().or_else(|| {
        Date::parse(value, format_description!("[year]-[month]-[day]"))
            .ok()
            .map(|date| date.midnight().assume_utc())
    })
}

/// Deterministic random-walk source, one bar per calendar day. Every
/// instrument gets the same walk for a given seed.
#[derive(Debug, Clone)]
pub struct SyntheticPriceSource {
    generator: PriceGenerator,
}

impl SyntheticPriceSource {
    pub fn new(seed: u64, start_price: f64, max_step_pct: f64) -> Self {
        Self {
            generator: PriceGenerator::new(seed, start_price, max_step_pct),
        }
    }
}

impl PriceSource for SyntheticPriceSource {
    fn fetch(&self, instrument: &str, range: DateRange) -> Result<Vec<PriceBar>, SourceError> {
        let days = range.days();
        if days == 0 {
            return Err(SourceError::unavailable(
                instrument,
                format!("empty date range {} to {}", range.start, range.end),
            ));
        }

        let mut generator = self.generator.clone();
        Ok(generator.daily_bars(range.start.midnight().assume_utc(), days))
    }
}
