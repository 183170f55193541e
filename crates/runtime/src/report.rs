use std::io::{Read, Write};

use strategy::PricePoint;

use crate::engine::{LedgerRow, StrategyResult};

pub const LEDGER_COLUMNS: [&str; 11] = [
    "open_datetime",
    "open_price",
    "order_type",
    "volume",
    "sl",
    "tp",
    "close_datetime",
    "close_price",
    "profit",
    "status",
    "pnl",
];

pub const SERIES_COLUMNS: [&str; 6] = [
    "timestamp",
    "price",
    "fast_sma",
    "slow_sma",
    "prev_fast_sma",
    "crossover",
];

/// Writes ledger and annotated-series tables. The header is always written,
/// so an empty ledger still produces a file with the full column set. Nulls
/// are empty fields.
pub struct ReportCsvWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReportCsvWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(writer),
        }
    }

    pub fn write_ledger(&mut self, result: &StrategyResult) -> Result<(), csv::Error> {
        self.writer.write_record(LEDGER_COLUMNS)?;
        for row in &result.rows {
            self.writer.serialize(row)?;
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn write_series(&mut self, points: &[PricePoint]) -> Result<(), csv::Error> {
        self.writer.write_record(SERIES_COLUMNS)?;
        for point in points {
            self.writer.serialize(point)?;
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> Result<W, csv::Error> {
        self.writer
            .into_inner()
            .map_err(|err| csv::Error::from(err.into_error()))
    }
}

pub fn read_ledger_csv<R: Read>(reader: R) -> Result<Vec<LedgerRow>, csv::Error> {
    let mut reader = csv::Reader::from_reader(reader);
    let rows = reader
        .deserialize()
        .collect::<Result<Vec<LedgerRow>, csv::Error>>()?;
    Ok(rows)
}
