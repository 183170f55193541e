use time::OffsetDateTime;

use crate::error::BacktestError;
use crate::position::{OrderType, Position, PositionRecord};

/// Ordered collection of every position opened during a run, in creation
/// order. Positions are never removed or reordered.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Ledger {
    positions: Vec<Position>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(
        &mut self,
        open_time: OffsetDateTime,
        open_price: f64,
        order_type: OrderType,
        volume: f64,
        stop_loss: f64,
        take_profit: f64,
    ) -> Result<(), BacktestError> {
        if let Some(last) = self.positions.last() {
            if open_time < last.open_time() {
                return Err(BacktestError::DataOrder {
                    index: self.positions.len(),
                    previous: last.open_time(),
                    current: open_time,
                });
            }
        }

        let position = Position::open(
            open_time,
            open_price,
            order_type,
            volume,
            stop_loss,
            take_profit,
        )?;
        self.positions.push(position);

        Ok(())
    }

    /// Closes every open position in ledger order and returns how many were
    /// closed.
    pub fn close_open(
        &mut self,
        close_time: OffsetDateTime,
        close_price: f64,
    ) -> Result<usize, BacktestError> {
        let mut closed = 0;
        for position in self.positions.iter_mut().filter(|position| position.is_open()) {
            position.close(close_time, close_price)?;
            closed += 1;
        }

        Ok(closed)
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn open_count(&self) -> usize {
        self.positions.iter().filter(|position| position.is_open()).count()
    }

    pub fn records(&self) -> Vec<PositionRecord> {
        self.positions.iter().map(Position::to_record).collect()
    }
}
