use serde::{Deserialize, Serialize};

use crate::error::BacktestError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub fast_window: usize,
    pub slow_window: usize,
    pub starting_balance: f64,
    pub volume: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            fast_window: 50,
            slow_window: 200,
            starting_balance: 10_000.0,
            volume: 1.0,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), BacktestError> {
        if self.fast_window == 0 || self.fast_window >= self.slow_window {
            return Err(BacktestError::InvalidWindows {
                fast: self.fast_window,
                slow: self.slow_window,
            });
        }
        if !self.starting_balance.is_finite() || self.starting_balance <= 0.0 {
            return Err(BacktestError::InvalidStartingBalance(self.starting_balance));
        }
        if !self.volume.is_finite() || self.volume <= 0.0 {
            return Err(BacktestError::InvalidVolume(self.volume));
        }

        Ok(())
    }
}
