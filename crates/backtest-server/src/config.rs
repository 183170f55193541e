use std::{
    env,
    net::{AddrParseError, SocketAddr},
};

use core_sim::{BacktestConfig, BacktestError};
use runtime::source::DateRange;
use thiserror::Error;
use time::{macros::date, macros::format_description, Date};

const DEFAULT_LISTEN_ADDR: SocketAddr = SocketAddr::V4(std::net::SocketAddrV4::new(
    std::net::Ipv4Addr::UNSPECIFIED,
    8080,
));
const DEFAULT_MODE: RunMode = RunMode::Serve;
const DEFAULT_SOURCE: SourceKind = SourceKind::Csv;
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_INSTRUMENT: &str = "AAPL";
const DEFAULT_START: Date = date!(2015 - 01 - 01);
const DEFAULT_END: Date = date!(2023 - 08 - 01);
const DEFAULT_LEDGER_OUTPUT_PATH: &str = "artifacts/ledger.csv";
const DEFAULT_SERIES_OUTPUT_PATH: &str = "artifacts/series.csv";
const DEFAULT_MAX_RUNS: usize = api::DEFAULT_MAX_RUNS;

const ENV_ADDR: &str = "BACKTEST_ADDR";
const ENV_MODE: &str = "BACKTEST_MODE";
const ENV_SOURCE: &str = "BACKTEST_SOURCE";
const ENV_DATA_DIR: &str = "BACKTEST_DATA_DIR";
const ENV_INSTRUMENT: &str = "BACKTEST_INSTRUMENT";
const ENV_START: &str = "BACKTEST_START";
const ENV_END: &str = "BACKTEST_END";
const ENV_FAST_WINDOW: &str = "BACKTEST_FAST_WINDOW";
const ENV_SLOW_WINDOW: &str = "BACKTEST_SLOW_WINDOW";
const ENV_STARTING_BALANCE: &str = "BACKTEST_STARTING_BALANCE";
const ENV_VOLUME: &str = "BACKTEST_VOLUME";
const ENV_LEDGER_OUTPUT: &str = "BACKTEST_LEDGER_OUTPUT";
const ENV_SERIES_OUTPUT: &str = "BACKTEST_SERIES_OUTPUT";
const ENV_MAX_RUNS: &str = "BACKTEST_MAX_RUNS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Run once, write the reports, then keep serving the API.
    Serve,
    /// Run once, write the reports and exit.
    Batch,
}

impl RunMode {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "serve" => Some(Self::Serve),
            "batch" => Some(Self::Batch),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Serve => "serve",
            Self::Batch => "batch",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Csv,
    Synthetic,
}

impl SourceKind {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "csv" => Some(Self::Csv),
            "synthetic" => Some(Self::Synthetic),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Synthetic => "synthetic",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub mode: RunMode,
    pub source: SourceKind,
    pub data_dir: String,
    pub instrument: String,
    pub range: DateRange,
    pub backtest: BacktestConfig,
    pub ledger_output_path: String,
    pub series_output_path: String,
    pub max_runs: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BACKTEST_ADDR is not a valid socket address: {0}")]
    InvalidListenAddr(#[source] AddrParseError),
    #[error("BACKTEST_MODE must be one of: serve, batch")]
    InvalidMode,
    #[error("BACKTEST_SOURCE must be one of: csv, synthetic")]
    InvalidSource,
    #[error("{0} must not be empty or whitespace")]
    Empty(&'static str),
    #[error("{0} must be a date formatted YYYY-MM-DD")]
    InvalidDate(&'static str),
    #[error("BACKTEST_START ({start}) must be before BACKTEST_END ({end})")]
    InvalidDateRange { start: Date, end: Date },
    #[error("{0} must be a number")]
    InvalidNumber(&'static str),
    #[error("BACKTEST_MAX_RUNS must be a positive integer")]
    InvalidMaxRuns,
    #[error("{0} contains non-unicode data")]
    NonUnicode(&'static str),
    #[error("invalid backtest settings: {0}")]
    Backtest(#[from] BacktestError),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let listen_addr = match read_env(ENV_ADDR)? {
            Some(value) => value.parse().map_err(ConfigError::InvalidListenAddr)?,
            None => DEFAULT_LISTEN_ADDR,
        };

        let mode = match read_env(ENV_MODE)? {
            Some(value) => RunMode::parse(value.as_str()).ok_or(ConfigError::InvalidMode)?,
            None => DEFAULT_MODE,
        };

        let source = match read_env(ENV_SOURCE)? {
            Some(value) => SourceKind::parse(value.as_str()).ok_or(ConfigError::InvalidSource)?,
            None => DEFAULT_SOURCE,
        };

        let start = parse_date_env(ENV_START, DEFAULT_START)?;
        let end = parse_date_env(ENV_END, DEFAULT_END)?;
        if start >= end {
            return Err(ConfigError::InvalidDateRange { start, end });
        }

        let defaults = BacktestConfig::default();
        let backtest = BacktestConfig {
            fast_window: parse_number_env(ENV_FAST_WINDOW, defaults.fast_window)?,
            slow_window: parse_number_env(ENV_SLOW_WINDOW, defaults.slow_window)?,
            starting_balance: parse_number_env(ENV_STARTING_BALANCE, defaults.starting_balance)?,
            volume: parse_number_env(ENV_VOLUME, defaults.volume)?,
        };
        backtest.validate()?;

        let max_runs = match read_env(ENV_MAX_RUNS)? {
            Some(value) => match value.trim().parse::<usize>() {
                Ok(max_runs) if max_runs > 0 => max_runs,
                _ => return Err(ConfigError::InvalidMaxRuns),
            },
            None => DEFAULT_MAX_RUNS,
        };

        Ok(Self {
            listen_addr,
            mode,
            source,
            data_dir: parse_text_env(ENV_DATA_DIR, DEFAULT_DATA_DIR)?,
            instrument: parse_text_env(ENV_INSTRUMENT, DEFAULT_INSTRUMENT)?,
            range: DateRange::new(start, end),
            backtest,
            ledger_output_path: parse_text_env(ENV_LEDGER_OUTPUT, DEFAULT_LEDGER_OUTPUT_PATH)?,
            series_output_path: parse_text_env(ENV_SERIES_OUTPUT, DEFAULT_SERIES_OUTPUT_PATH)?,
            max_runs,
        })
    }
}

fn read_env(key: &'static str) -> Result<Option<String>, ConfigError> {
    match env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::NonUnicode(key)),
    }
}

fn parse_text_env(key: &'static str, default_value: &str) -> Result<String, ConfigError> {
    match read_env(key)? {
        Some(value) if value.trim().is_empty() => Err(ConfigError::Empty(key)),
        Some(value) => Ok(value),
        None => Ok(default_value.to_owned()),
    }
}

fn parse_date_env(key: &'static str, default_value: Date) -> Result<Date, ConfigError> {
    match read_env(key)? {
        Some(value) => Date::parse(value.trim(), format_description!("[year]-[month]-[day]"))
            .map_err(|_| ConfigError::InvalidDate(key)),
        None => Ok(default_value),
    }
}

fn parse_number_env<T: std::str::FromStr>(
    key: &'static str,
    default_value: T,
) -> Result<T, ConfigError> {
    match read_env(key)? {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber(key)),
        None => Ok(default_value),
    }
}
