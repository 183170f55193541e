use serde::Serialize;

use crate::engine::StrategyResult;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerSummary {
    pub opened: usize,
    pub closed: usize,
    pub still_open: usize,
    pub winners: usize,
    pub losers: usize,
    pub realized_profit: f64,
    pub final_pnl: f64,
}

impl LedgerSummary {
    pub fn from_result(result: &StrategyResult) -> Self {
        let profits: Vec<f64> = result.rows.iter().filter_map(|row| row.profit).collect();

        Self {
            opened: result.rows.len(),
            closed: profits.len(),
            still_open: result.rows.len() - profits.len(),
            winners: profits.iter().filter(|profit| **profit > 0.0).count(),
            losers: profits.iter().filter(|profit| **profit < 0.0).count(),
            realized_profit: profits.iter().sum(),
            final_pnl: result.final_pnl,
        }
    }
}
