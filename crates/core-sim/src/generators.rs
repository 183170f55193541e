use time::{Duration, OffsetDateTime};

use crate::bar::PriceBar;

/// Seeded multiplicative random walk of daily closes. Same seed, same series.
#[derive(Debug, Clone)]
pub struct PriceGenerator {
    state: u64,
    price: f64,
    max_step_pct: f64,
}

impl PriceGenerator {
    pub fn new(seed: u64, start_price: f64, max_step_pct: f64) -> Self {
        assert!(
            start_price.is_finite() && start_price > 0.0,
            "start_price must be finite and positive"
        );
        assert!(
            max_step_pct.is_finite() && (0.0..1.0).contains(&max_step_pct),
            "max_step_pct must be finite and in [0, 1)"
        );

        Self {
            state: seed,
            price: start_price,
            max_step_pct,
        }
    }

    pub fn next_close(&mut self) -> f64 {
        let unit = next_unit(&mut self.state);
        let step = (unit * 2.0 - 1.0) * self.max_step_pct;
        self.price *= 1.0 + step;
        self.price
    }

    pub fn daily_bars(&mut self, start: OffsetDateTime, count: usize) -> Vec<PriceBar> {
        (0..count)
            .map(|day| PriceBar::new(start + Duration::days(day as i64), self.next_close()))
            .collect()
    }
}

fn next_u64(state: &mut u64) -> u64 {
    *state = state
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    *state
}

fn next_unit(state: &mut u64) -> f64 {
    let value = next_u64(state);
    (value as f64) / (u64::MAX as f64)
}
