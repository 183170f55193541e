use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::BacktestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Buy,
    Sell,
}

impl OrderType {
    pub fn profit(self, open_price: f64, close_price: f64, volume: f64) -> f64 {
        match self {
            Self::Buy => (close_price - open_price) * volume,
            Self::Sell => (open_price - close_price) * volume,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ClosedLeg {
    time: OffsetDateTime,
    price: f64,
    profit: f64,
}

/// A single simulated trade.
///
/// Close fields are set together, once, by [`Position::close`]. Stop-loss and
/// take-profit are carried for reporting only and never evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    open_time: OffsetDateTime,
    open_price: f64,
    order_type: OrderType,
    volume: f64,
    stop_loss: f64,
    take_profit: f64,
    closed: Option<ClosedLeg>,
}

impl Position {
    pub fn open(
        open_time: OffsetDateTime,
        open_price: f64,
        order_type: OrderType,
        volume: f64,
        stop_loss: f64,
        take_profit: f64,
    ) -> Result<Self, BacktestError> {
        if !volume.is_finite() || volume <= 0.0 {
            return Err(BacktestError::InvalidVolume(volume));
        }

        Ok(Self {
            open_time,
            open_price,
            order_type,
            volume,
            stop_loss,
            take_profit,
            closed: None,
        })
    }

    pub fn close(
        &mut self,
        close_time: OffsetDateTime,
        close_price: f64,
    ) -> Result<f64, BacktestError> {
        if self.closed.is_some() {
            return Err(BacktestError::AlreadyClosed {
                open_time: self.open_time,
            });
        }

        let profit = self
            .order_type
            .profit(self.open_price, close_price, self.volume);
        self.closed = Some(ClosedLeg {
            time: close_time,
            price: close_price,
            profit,
        });

        Ok(profit)
    }

    pub fn status(&self) -> PositionStatus {
        match self.closed {
            Some(_) => PositionStatus::Closed,
            None => PositionStatus::Open,
        }
    }

    pub fn is_open(&self) -> bool {
        self.closed.is_none()
    }

    pub fn open_time(&self) -> OffsetDateTime {
        self.open_time
    }

    pub fn open_price(&self) -> f64 {
        self.open_price
    }

    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn close_time(&self) -> Option<OffsetDateTime> {
        self.closed.map(|leg| leg.time)
    }

    pub fn close_price(&self) -> Option<f64> {
        self.closed.map(|leg| leg.price)
    }

    pub fn profit(&self) -> Option<f64> {
        self.closed.map(|leg| leg.profit)
    }

    pub fn to_record(&self) -> PositionRecord {
        PositionRecord {
            open_datetime: self.open_time,
            open_price: self.open_price,
            order_type: self.order_type,
            volume: self.volume,
            sl: self.stop_loss,
            tp: self.take_profit,
            close_datetime: self.close_time(),
            close_price: self.close_price(),
            profit: self.profit(),
            status: self.status(),
        }
    }
}

/// Flat reporting row for a position. Absent close fields stay as explicit
/// nulls so open and closed rows share one schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
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
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::datetime;

    use super::{OrderType, Position, PositionStatus};
    use crate::BacktestError;

    fn buy_at(price: f64, volume: f64) -> Position {
        Position::open(
            datetime!(2020-03-02 0:00 UTC),
            price,
            OrderType::Buy,
            volume,
            0.0,
            0.0,
        )
        .unwrap()
    }

    #[test]
    fn opened_position_has_no_close_fields() {
        let position = buy_at(100.0, 1.0);

        assert_eq!(position.status(), PositionStatus::Open);
        assert!(position.is_open());
        assert_eq!(position.close_time(), None);
        assert_eq!(position.close_price(), None);
        assert_eq!(position.profit(), None);
    }

    #[test]
    fn closing_buy_realizes_price_gain_times_volume() {
        let mut position = buy_at(100.0, 3.0);

        let profit = position.close(datetime!(2020-06-01 0:00 UTC), 110.0).unwrap();

        assert_eq!(profit, 30.0);
        assert_eq!(position.profit(), Some(30.0));
        assert_eq!(position.status(), PositionStatus::Closed);
        assert_eq!(position.close_time(), Some(datetime!(2020-06-01 0:00 UTC)));
        assert_eq!(position.close_price(), Some(110.0));
    }

    #[test]
    fn closing_buy_below_entry_is_a_loss() {
        let mut position = buy_at(100.0, 2.0);

        let profit = position.close(datetime!(2020-06-01 0:00 UTC), 95.0).unwrap();

        assert_eq!(profit, -10.0);
    }

    #[test]
    fn closing_sell_realizes_price_drop_times_volume() {
        let mut position = Position::open(
            datetime!(2020-03-02 0:00 UTC),
            100.0,
            OrderType::Sell,
            2.0,
            0.0,
            0.0,
        )
        .unwrap();

        let profit = position.close(datetime!(2020-06-01 0:00 UTC), 90.0).unwrap();

        assert_eq!(profit, 20.0);
    }

    #[test]
    fn second_close_fails_and_keeps_first_close() {
        let mut position = buy_at(100.0, 1.0);
        position.close(datetime!(2020-06-01 0:00 UTC), 110.0).unwrap();

        let error = position
            .close(datetime!(2020-07-01 0:00 UTC), 50.0)
            .unwrap_err();

        assert_eq!(
            error,
            BacktestError::AlreadyClosed {
                open_time: datetime!(2020-03-02 0:00 UTC),
            }
        );
        assert_eq!(position.close_price(), Some(110.0));
        assert_eq!(position.profit(), Some(10.0));
    }

    #[test]
    fn rejects_non_positive_or_non_finite_volume() {
        for volume in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result = Position::open(
                datetime!(2020-03-02 0:00 UTC),
                100.0,
                OrderType::Buy,
                volume,
                0.0,
                0.0,
            );
            assert!(matches!(result, Err(BacktestError::InvalidVolume(_))));
        }
    }

    #[test]
    fn open_record_serializes_close_fields_as_explicit_nulls() {
        let record = buy_at(100.0, 1.0).to_record();
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(
            json,
            json!({
                "open_datetime": "2020-03-02T00:00:00Z",
                "open_price": 100.0,
                "order_type": "buy",
                "volume": 1.0,
                "sl": 0.0,
                "tp": 0.0,
                "close_datetime": null,
                "close_price": null,
                "profit": null,
                "status": "open",
            })
        );
    }

    #[test]
    fn closed_record_carries_close_fields() {
        let mut position = buy_at(100.0, 1.0);
        position.close(datetime!(2020-06-01 0:00 UTC), 110.0).unwrap();

        let record = position.to_record();

        assert_eq!(record.close_datetime, Some(datetime!(2020-06-01 0:00 UTC)));
        assert_eq!(record.close_price, Some(110.0));
        assert_eq!(record.profit, Some(10.0));
        assert_eq!(record.status, PositionStatus::Closed);
    }
}
