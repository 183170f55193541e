use core_sim::{BacktestConfig, BacktestError, PriceBar};
use serde::Serialize;
use strategy::{compute_indicators, PricePoint};

use crate::engine::{run_strategy, StrategyResult};
use crate::metrics::LedgerSummary;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestReport {
    pub config: BacktestConfig,
    pub series: Vec<PricePoint>,
    pub result: StrategyResult,
    pub summary: LedgerSummary,
}

/// Indicator engine followed by the simulator, over already-fetched bars.
pub fn run_backtest(
    bars: &[PriceBar],
    config: &BacktestConfig,
) -> Result<BacktestReport, BacktestError> {
    config.validate()?;
    let series = compute_indicators(bars, config.fast_window, config.slow_window)?;
    let result = run_strategy(&series, config.starting_balance, config.volume)?;
    let summary = LedgerSummary::from_result(&result);

    tracing::info!(
        bars = bars.len(),
        points = series.len(),
        opened = summary.opened,
        closed = summary.closed,
        final_pnl = summary.final_pnl,
        "backtest finished"
    );

    Ok(BacktestReport {
        config: *config,
        series,
        result,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use core_sim::{BacktestConfig, BacktestError, OrderType, PriceBar, PriceGenerator};
    use strategy::Crossover;
    use time::{macros::datetime, Duration};

    use super::run_backtest;

    fn sine_bars(len: i64, period: f64) -> Vec<PriceBar> {
        let start = datetime!(2015-01-01 0:00 UTC);
        (0..len)
            .map(|i| {
                let close = 100.0 + 10.0 * (2.0 * std::f64::consts::PI * i as f64 / period).sin();
                PriceBar::new(start + Duration::days(i), close)
            })
            .collect()
    }

    fn small_windows() -> BacktestConfig {
        BacktestConfig {
            fast_window: 5,
            slow_window: 20,
            ..BacktestConfig::default()
        }
    }

    #[test]
    fn ledger_length_equals_bullish_label_count() {
        let bars = PriceGenerator::new(21, 100.0, 0.03)
            .daily_bars(datetime!(2015-01-01 0:00 UTC), 2_000);

        let report = run_backtest(&bars, &BacktestConfig::default()).unwrap();
        let bullish = report
            .series
            .iter()
            .filter(|point| point.crossover == Some(Crossover::BullishCrossover))
            .count();

        assert_eq!(report.result.rows.len(), bullish);
        assert_eq!(report.summary.opened, bullish);
    }

    #[test]
    fn closed_buy_profit_matches_price_move_times_volume() {
        let config = BacktestConfig {
            volume: 3.0,
            ..small_windows()
        };

        let report = run_backtest(&sine_bars(400, 40.0), &config).unwrap();

        assert!(report.summary.closed > 0);
        for row in report.result.rows.iter().filter(|row| row.profit.is_some()) {
            let close_price = row.close_price.unwrap();
            let profit = row.profit.unwrap();
            assert_eq!(row.order_type, OrderType::Buy);
            assert_eq!(profit, (close_price - row.open_price) * 3.0);
            assert_eq!(
                profit.partial_cmp(&0.0),
                (close_price - row.open_price).partial_cmp(&0.0)
            );
        }
    }

    #[test]
    fn oscillating_series_opens_on_every_bullish_and_leaves_last_open() {
        let report = run_backtest(&sine_bars(400, 40.0), &small_windows()).unwrap();

        assert_eq!(report.summary.opened, 10);
        assert_eq!(report.summary.closed, 9);
        assert_eq!(report.summary.still_open, 1);
        let realized: f64 = report.result.rows.iter().filter_map(|row| row.profit).sum();
        assert!((report.result.final_pnl - (10_000.0 + realized)).abs() < 1e-9);
    }

    #[test]
    fn short_history_surfaces_insufficient_data() {
        let bars = sine_bars(199, 40.0);

        let error = run_backtest(&bars, &BacktestConfig::default()).unwrap_err();

        assert_eq!(
            error,
            BacktestError::InsufficientData {
                required: 200,
                available: 199,
            }
        );
    }

    #[test]
    fn invalid_config_is_rejected_before_computing() {
        let config = BacktestConfig {
            volume: -1.0,
            ..small_windows()
        };

        let error = run_backtest(&sine_bars(10, 40.0), &config).unwrap_err();

        assert_eq!(error, BacktestError::InvalidVolume(-1.0));
    }
}
