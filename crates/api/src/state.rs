use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, PoisonError,
    },
};

use core_sim::{BacktestConfig, BacktestError, PriceBar};
use runtime::{run_backtest, BacktestReport};
use serde::Deserialize;
use thiserror::Error;

/// Default cap on finished runs kept in memory.
pub const DEFAULT_MAX_RUNS: usize = 64;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StartRunError {
    #[error("run id space exhausted")]
    RunIdOverflow,
    #[error(transparent)]
    Backtest(#[from] BacktestError),
}

/// Partial config sent with `POST /runs`; unset fields fall back to the
/// server defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunOverrides {
    pub fast_window: Option<usize>,
    pub slow_window: Option<usize>,
    pub starting_balance: Option<f64>,
    pub volume: Option<f64>,
}

impl RunOverrides {
    pub fn apply(&self, defaults: BacktestConfig) -> BacktestConfig {
        BacktestConfig {
            fast_window: self.fast_window.unwrap_or(defaults.fast_window),
            slow_window: self.slow_window.unwrap_or(defaults.slow_window),
            starting_balance: self.starting_balance.unwrap_or(defaults.starting_balance),
            volume: self.volume.unwrap_or(defaults.volume),
        }
    }
}

#[derive(Debug)]
struct Shared {
    instrument: String,
    bars: Vec<PriceBar>,
    defaults: BacktestConfig,
    max_runs: usize,
    runs: Mutex<BTreeMap<u64, Arc<BacktestReport>>>,
}

/// Loaded price history plus the most recent `max_runs` finished runs,
/// shared across handlers. Older runs are evicted by id order.
#[derive(Clone, Debug)]
pub struct AppState {
    next_run_id: Arc<AtomicU64>,
    shared: Arc<Shared>,
}

impl AppState {
    pub fn new(
        instrument: impl Into<String>,
        bars: Vec<PriceBar>,
        defaults: BacktestConfig,
    ) -> Self {
        Self::with_max_runs(instrument, bars, defaults, DEFAULT_MAX_RUNS)
    }

    pub fn with_max_runs(
        instrument: impl Into<String>,
        bars: Vec<PriceBar>,
        defaults: BacktestConfig,
        max_runs: usize,
    ) -> Self {
        assert!(max_runs > 0, "max_runs must be positive");

        Self {
            next_run_id: Arc::new(AtomicU64::new(0)),
            shared: Arc::new(Shared {
                instrument: instrument.into(),
                bars,
                defaults,
                max_runs,
                runs: Mutex::new(BTreeMap::new()),
            }),
        }
    }

    pub fn instrument(&self) -> &str {
        &self.shared.instrument
    }

    pub fn defaults(&self) -> BacktestConfig {
        self.shared.defaults
    }

    pub fn max_runs(&self) -> usize {
        self.shared.max_runs
    }

    pub fn stored_runs(&self) -> usize {
        self.shared
            .runs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn start_run(&self, overrides: RunOverrides) -> Result<u64, StartRunError> {
        let config = overrides.apply(self.shared.defaults);
        let report = run_backtest(&self.shared.bars, &config)?;
        self.record_run(report)
    }

    /// Registers a report computed elsewhere (e.g. the startup run).
    pub fn record_run(&self, report: BacktestReport) -> Result<u64, StartRunError> {
        let previous = self
            .next_run_id
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                current.checked_add(1)
            })
            .map_err(|_| StartRunError::RunIdOverflow)?;
        let run_id = previous + 1;

        let mut runs = self
            .shared
            .runs
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        runs.insert(run_id, Arc::new(report));
        while runs.len() > self.shared.max_runs {
            if let Some((evicted, _)) = runs.pop_first() {
                tracing::debug!(run_id = evicted, "run evicted");
            }
        }
        drop(runs);
        tracing::info!(run_id, instrument = %self.shared.instrument, "run recorded");

        Ok(run_id)
    }

    pub fn run(&self, run_id: u64) -> Option<Arc<BacktestReport>> {
        self.shared
            .runs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&run_id)
            .cloned()
    }
}
