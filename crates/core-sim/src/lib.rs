mod bar;
mod config;
mod error;
mod generators;
mod ledger;
mod position;

pub use bar::{ensure_chronological, PriceBar};
pub use config::BacktestConfig;
pub use error::BacktestError;
pub use generators::PriceGenerator;
pub use ledger::Ledger;
pub use position::{OrderType, Position, PositionRecord, PositionStatus};
