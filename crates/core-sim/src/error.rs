use thiserror::Error;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BacktestError {
    #[error("insufficient data: {available} points supplied, slow window needs {required}")]
    InsufficientData { required: usize, available: usize },

    #[error("data out of order at index {index}: {current} does not follow {previous}")]
    DataOrder {
        index: usize,
        previous: OffsetDateTime,
        current: OffsetDateTime,
    },

    #[error("position opened at {open_time} is already closed")]
    AlreadyClosed { open_time: OffsetDateTime },

    #[error("fast window ({fast}) must be non-zero and shorter than slow window ({slow})")]
    InvalidWindows { fast: usize, slow: usize },

    #[error("price at index {index} must be finite and positive, got {price}")]
    InvalidPrice { index: usize, price: f64 },

    #[error("volume must be finite and positive, got {0}")]
    InvalidVolume(f64),

    #[error("starting balance must be finite and positive, got {0}")]
    InvalidStartingBalance(f64),
}
