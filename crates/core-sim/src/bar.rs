use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::BacktestError;

/// One closing price observation, as handed over by a price source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub close: f64,
}

impl PriceBar {
    pub fn new(timestamp: OffsetDateTime, close: f64) -> Self {
        Self { timestamp, close }
    }
}

/// Fails with `DataOrder` on the first timestamp that does not strictly
/// follow its predecessor.
pub fn ensure_chronological<I>(timestamps: I) -> Result<(), BacktestError>
where
    I: IntoIterator<Item = OffsetDateTime>,
{
    let mut previous: Option<OffsetDateTime> = None;
    for (index, current) in timestamps.into_iter().enumerate() {
        if let Some(previous) = previous {
            if current <= previous {
                return Err(BacktestError::DataOrder {
                    index,
                    previous,
                    current,
                });
            }
        }
        previous = Some(current);
    }

    Ok(())
}
