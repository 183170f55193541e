//! Indicator engine: trailing SMAs and crossover labelling of a closing
//! price series.

pub mod crossover;
pub mod indicators;
pub mod sma;

pub use crossover::{classify_crossover, Crossover};
pub use indicators::{compute_indicators, PricePoint};
pub use sma::moving_average;
