use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use core_sim::BacktestConfig;
use runtime::{LedgerSummary, StrategyResult};
use serde::Serialize;
use strategy::PricePoint;

use crate::state::{AppState, RunOverrides, StartRunError};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/runs", post(start_run))
        .route("/runs/:run_id", get(get_run))
        .route("/runs/:run_id/series", get(get_series))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct StartRunResponse<'a> {
    run_id: u64,
    summary: &'a LedgerSummary,
}

#[derive(Debug, Serialize)]
struct RunResponse<'a> {
    run_id: u64,
    instrument: &'a str,
    config: &'a BacktestConfig,
    summary: &'a LedgerSummary,
    result: &'a StrategyResult,
}

#[derive(Debug, Serialize)]
struct SeriesResponse<'a> {
    run_id: u64,
    instrument: &'a str,
    series: &'a [PricePoint],
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    NotFound(u64),
    Unprocessable(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            Self::BadRequest(error) => (StatusCode::BAD_REQUEST, error),
            Self::NotFound(run_id) => (StatusCode::NOT_FOUND, format!("run {run_id} not found")),
            Self::Unprocessable(error) => (StatusCode::UNPROCESSABLE_ENTITY, error),
            Self::Internal(error) => (StatusCode::INTERNAL_SERVER_ERROR, error),
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

async fn start_run(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let overrides = if body.iter().all(u8::is_ascii_whitespace) {
        RunOverrides::default()
    } else {
        serde_json::from_slice(&body).map_err(|err| ApiError::BadRequest(err.to_string()))?
    };

    let run_id = state.start_run(overrides).map_err(|err| match err {
        StartRunError::Backtest(err) => {
            tracing::warn!(error = %err, "run rejected");
            ApiError::Unprocessable(err.to_string())
        }
        other @ StartRunError::RunIdOverflow => ApiError::Internal(other.to_string()),
    })?;
    let report = state.run(run_id).ok_or(ApiError::NotFound(run_id))?;
    let location = format!("/runs/{run_id}");

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(StartRunResponse {
            run_id,
            summary: &report.summary,
        }),
    )
        .into_response())
}

async fn get_run(
    State(state): State<AppState>,
    Path(run_id): Path<u64>,
) -> Result<Response, ApiError> {
    let report = state.run(run_id).ok_or(ApiError::NotFound(run_id))?;

    Ok(Json(RunResponse {
        run_id,
        instrument: state.instrument(),
        config: &report.config,
        summary: &report.summary,
        result: &report.result,
    })
    .into_response())
}

async fn get_series(
    State(state): State<AppState>,
    Path(run_id): Path<u64>,
) -> Result<Response, ApiError> {
    let report = state.run(run_id).ok_or(ApiError::NotFound(run_id))?;

    Ok(Json(SeriesResponse {
        run_id,
        instrument: state.instrument(),
        series: &report.series,
    })
    .into_response())
}
