pub mod engine;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod source;

pub use engine::{run_strategy, run_strategy_with_log, LedgerRow, StrategyResult, StrategySimulator};
pub use metrics::LedgerSummary;
pub use pipeline::{run_backtest, BacktestReport};
