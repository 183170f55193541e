use core_sim::{ensure_chronological, BacktestError, PriceBar};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::crossover::{classify_crossover, Crossover};
use crate::sma::moving_average;

/// A price step with both averages defined, labelled with its crossover.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(rename = "price")]
    pub close: f64,
    pub fast_sma: f64,
    pub slow_sma: f64,
    pub prev_fast_sma: f64,
    pub crossover: Option<Crossover>,
}

/// Annotates `series` with fast/slow SMAs and crossover labels.
///
/// Steps without a fast, previous-fast and slow average are dropped, so the
/// output starts at index `slow_window - 1`. Fewer than `slow_window` input
/// points is an error rather than an empty series.
///
/// Window pairs are restricted on purpose: the fast window must be non-zero
/// and strictly shorter than the slow one, otherwise `InvalidWindows`. A
/// plain two-average comparison would accept any pair, but with swapped or
/// equal windows "fast" and "slow" lose their meaning and the first output
/// index is no longer `slow_window - 1`.
pub fn compute_indicators(
    series: &[PriceBar],
    fast_window: usize,
    slow_window: usize,
) -> Result<Vec<PricePoint>, BacktestError> {
    if fast_window == 0 || fast_window >= slow_window {
        return Err(BacktestError::InvalidWindows {
            fast: fast_window,
            slow: slow_window,
        });
    }
    if series.len() < slow_window {
        return Err(BacktestError::InsufficientData {
            required: slow_window,
            available: series.len(),
        });
    }
    ensure_chronological(series.iter().map(|bar| bar.timestamp))?;
    if let Some((index, bar)) = series
        .iter()
        .enumerate()
        .find(|(_, bar)| !bar.close.is_finite() || bar.close <= 0.0)
    {
        return Err(BacktestError::InvalidPrice {
            index,
            price: bar.close,
        });
    }

    let closes: Vec<f64> = series.iter().map(|bar| bar.close).collect();
    let fast = moving_average(&closes, fast_window);
    let slow = moving_average(&closes, slow_window);

    let mut points = Vec::with_capacity(series.len() + 1 - slow_window);
    let mut prev_fast: Option<f64> = None;
    for ((bar, fast_sma), slow_sma) in series.iter().zip(fast).zip(slow) {
        if let (Some(fast_sma), Some(prev_fast_sma), Some(slow_sma)) =
            (fast_sma, prev_fast, slow_sma)
        {
            points.push(PricePoint {
                timestamp: bar.timestamp,
                close: bar.close,
                fast_sma,
                slow_sma,
                prev_fast_sma,
                crossover: classify_crossover(fast_sma, prev_fast_sma, slow_sma),
            });
        }
        prev_fast = fast_sma;
    }

    Ok(points)
}
