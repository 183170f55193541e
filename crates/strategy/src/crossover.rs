use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Crossover {
    BullishCrossover,
    BearishCrossover,
}

impl Crossover {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BullishCrossover => "bullish_crossover",
            Self::BearishCrossover => "bearish_crossover",
        }
    }
}

impl fmt::Display for Crossover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single-step crossover rule.
///
/// Both comparisons are made against the *current* slow average: the previous
/// fast average is compared with `slow`, not with the previous slow average.
/// Backtest output depends on this, so it is kept even though a textbook
/// crossover would use the previous slow value. A consequence is that a sharp
/// move can label two consecutive steps with the same crossover.
pub fn classify_crossover(fast: f64, prev_fast: f64, slow: f64) -> Option<Crossover> {
    if fast > slow && prev_fast < slow {
        Some(Crossover::BullishCrossover)
    } else if fast < slow && prev_fast > slow {
        Some(Crossover::BearishCrossover)
    } else {
        None
    }
}
