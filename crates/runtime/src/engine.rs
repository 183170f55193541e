use core_sim::{BacktestError, Ledger, OrderType, PositionRecord, PositionStatus};
use serde::{Deserialize, Serialize};
use strategy::{Crossover, PricePoint};
use time::OffsetDateTime;

use crate::logging::{RunLogEvent, RunLogEventKind, RunLogWriter, TracingRunLogWriter};

/// A ledger position plus the cumulative PnL at its row.
///
/// `pnl` is null for a position that is still open; the running sum skips it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    #[serde(with = "time::serde::rfc3339")]
    pub open_datetime: OffsetDateTime,
    pub open_price: f64,
    pub order_type: OrderType,
    pub volume: f64,
    pub sl: f64,
    pub tp: f64,
    #[serde(with = "time::serde::rfc3339::option")]
    pub close_datetime: Option<OffsetDateTime>,
    pub close_price: Option<f64>,
    pub profit: Option<f64>,
    pub status: PositionStatus,
    pub pnl: Option<f64>,
}

impl LedgerRow {
    pub fn new(record: PositionRecord, pnl: Option<f64>) -> Self {
        Self {
            open_datetime: record.open_datetime,
            open_price: record.open_price,
            order_type: record.order_type,
            volume: record.volume,
            sl: record.sl,
            tp: record.tp,
            close_datetime: record.close_datetime,
            close_price: record.close_price,
            profit: record.profit,
            status: record.status,
            pnl,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyResult {
    pub starting_balance: f64,
    pub rows: Vec<LedgerRow>,
    pub final_pnl: f64,
}

/// Forward-only crossover simulator. Owns the ledger for the duration of a
/// run; feed it points in chronological order, then call [`finish`].
///
/// [`finish`]: StrategySimulator::finish
#[derive(Debug)]
pub struct StrategySimulator {
    starting_balance: f64,
    volume: f64,
    ledger: Ledger,
    steps: usize,
    last_timestamp: Option<OffsetDateTime>,
}

impl StrategySimulator {
    pub fn new(starting_balance: f64, volume: f64) -> Result<Self, BacktestError> {
        if !starting_balance.is_finite() || starting_balance <= 0.0 {
            return Err(BacktestError::InvalidStartingBalance(starting_balance));
        }
        if !volume.is_finite() || volume <= 0.0 {
            return Err(BacktestError::InvalidVolume(volume));
        }

        Ok(Self {
            starting_balance,
            volume,
            ledger: Ledger::new(),
            steps: 0,
            last_timestamp: None,
        })
    }

    pub fn step(
        &mut self,
        point: &PricePoint,
        log: &mut dyn RunLogWriter,
    ) -> Result<(), BacktestError> {
        if let Some(previous) = self.last_timestamp {
            if point.timestamp <= previous {
                return Err(BacktestError::DataOrder {
                    index: self.steps,
                    previous,
                    current: point.timestamp,
                });
            }
        }
        let step = self.steps;
        self.last_timestamp = Some(point.timestamp);
        self.steps += 1;

        match point.crossover {
            Some(Crossover::BearishCrossover) => {
                let closed = self.ledger.close_open(point.timestamp, point.close)?;
                let kind = if closed == 0 {
                    RunLogEventKind::BearishWithoutOpenPositions
                } else {
                    RunLogEventKind::PositionsClosed
                };
                log.write(RunLogEvent::new(step, point.timestamp, kind, point.close, closed));
            }
            Some(Crossover::BullishCrossover) => {
                self.ledger.open(
                    point.timestamp,
                    point.close,
                    OrderType::Buy,
                    self.volume,
                    0.0,
                    0.0,
                )?;
                log.write(RunLogEvent::new(
                    step,
                    point.timestamp,
                    RunLogEventKind::PositionOpened,
                    point.close,
                    1,
                ));
            }
            None => {}
        }

        Ok(())
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn finish(self) -> StrategyResult {
        let mut running = self.starting_balance;
        let rows = self
            .ledger
            .records()
            .into_iter()
            .map(|record| {
                let pnl = record.profit.map(|profit| {
                    running += profit;
                    running
                });
                LedgerRow::new(record, pnl)
            })
            .collect();

        StrategyResult {
            starting_balance: self.starting_balance,
            rows,
            final_pnl: running,
        }
    }
}

pub fn run_strategy(
    series: &[PricePoint],
    starting_balance: f64,
    volume: f64,
) -> Result<StrategyResult, BacktestError> {
    run_strategy_with_log(series, starting_balance, volume, &mut TracingRunLogWriter)
}

pub fn run_strategy_with_log(
    series: &[PricePoint],
    starting_balance: f64,
    volume: f64,
    log: &mut dyn RunLogWriter,
) -> Result<StrategyResult, BacktestError> {
    let mut simulator = StrategySimulator::new(starting_balance, volume)?;
    for point in series {
        simulator.step(point, log)?;
    }

    Ok(simulator.finish())
}
