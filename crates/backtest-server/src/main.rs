mod config;
mod wiring;

use std::fs::{self, File};
use std::path::Path;

use anyhow::Context;
use api::AppState;
use core_sim::PriceBar;
use runtime::{
    report::ReportCsvWriter,
    run_backtest,
    source::{CsvPriceSource, PriceSource, SyntheticPriceSource},
    BacktestReport,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, RunMode, SourceKind};

const SYNTHETIC_SEED: u64 = 7;
const SYNTHETIC_START_PRICE: f64 = 100.0;
const SYNTHETIC_MAX_STEP_PCT: f64 = 0.02;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("reading configuration")?;
    tracing::info!(
        mode = config.mode.as_str(),
        source = config.source.as_str(),
        instrument = %config.instrument,
        start = %config.range.start,
        end = %config.range.end,
        "starting backtest"
    );

    let bars = fetch_bars(&config)?;
    let report = run_backtest(&bars, &config.backtest)
        .with_context(|| format!("backtesting {}", config.instrument))?;
    write_reports(&report, &config.ledger_output_path, &config.series_output_path)?;
    tracing::info!(
        ledger = %config.ledger_output_path,
        series = %config.series_output_path,
        final_pnl = report.summary.final_pnl,
        "reports written"
    );

    if config.mode == RunMode::Batch {
        return Ok(());
    }

    let state = AppState::with_max_runs(
        config.instrument.clone(),
        bars,
        config.backtest,
        config.max_runs,
    );
    state.record_run(report)?;

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "serving");
    axum::serve(listener, wiring::build_app(state)).await?;
    Ok(())
}

fn fetch_bars(config: &Config) -> anyhow::Result<Vec<PriceBar>> {
    let source: Box<dyn PriceSource> = match config.source {
        SourceKind::Csv => Box::new(CsvPriceSource::new(&config.data_dir)),
        SourceKind::Synthetic => Box::new(SyntheticPriceSource::new(
            SYNTHETIC_SEED,
            SYNTHETIC_START_PRICE,
            SYNTHETIC_MAX_STEP_PCT,
        )),
    };

    let bars = source.fetch(&config.instrument, config.range)?;
    tracing::info!(bars = bars.len(), "price history loaded");
    Ok(bars)
}

fn write_reports(
    report: &BacktestReport,
    ledger_path: &str,
    series_path: &str,
) -> anyhow::Result<()> {
    let mut ledger = ReportCsvWriter::new(create_output(ledger_path)?);
    ledger.write_ledger(&report.result)?;
    ledger.into_inner()?;

    let mut series = ReportCsvWriter::new(create_output(series_path)?);
    series.write_series(&report.series)?;
    series.into_inner()?;
    Ok(())
}

fn create_output(path: &str) -> anyhow::Result<File> {
    let path = Path::new(path);

    if let Some(parent) = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
    {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }

    File::create(path).with_context(|| format!("creating {}", path.display()))
}
