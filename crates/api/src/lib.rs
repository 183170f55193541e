pub mod routes;
pub mod state;

use axum::Router;

pub use state::{AppState, RunOverrides, StartRunError, DEFAULT_MAX_RUNS};

pub fn app(state: AppState) -> Router {
    routes::router(state)
}

#[cfg(test)]
pub(crate) mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        Router,
    };
    use core_sim::{BacktestConfig, PriceBar};
    use serde_json::Value;
    use time::{macros::datetime, Duration};
    use tower::ServiceExt;

    use crate::{app, AppState};

    pub(crate) fn sine_bars(len: i64) -> Vec<PriceBar> {
        let start = datetime!(2015-01-01 0:00 UTC);
        (0..len)
            .map(|i| {
                let close = 100.0 + 10.0 * (2.0 * std::f64::consts::PI * i as f64 / 40.0).sin();
                PriceBar::new(start + Duration::days(i), close)
            })
            .collect()
    }

    pub(crate) fn small_windows() -> BacktestConfig {
        BacktestConfig {
            fast_window: 5,
            slow_window: 20,
            ..BacktestConfig::default()
        }
    }

    fn test_app() -> Router {
        app(AppState::new("AAPL", sine_bars(400), small_windows()))
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn post_runs_with_empty_body_uses_defaults() {
        let response = test_app()
            .oneshot(Request::post("/runs").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::LOCATION], "/runs/1");
        let body = json_body(response).await;
        assert_eq!(body["run_id"], 1);
        assert_eq!(body["summary"]["opened"], 10);
        assert_eq!(body["summary"]["still_open"], 1);
    }

    #[tokio::test]
    async fn get_run_returns_ledger_with_null_close_fields_for_open_rows() {
        let app = test_app();
        let created = app
            .clone()
            .oneshot(Request::post("/runs").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);

        let response = app
            .oneshot(Request::get("/runs/1").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let rows = body["result"]["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 10);
        let last = rows.last().unwrap();
        assert_eq!(last["status"], "open");
        assert!(last["close_datetime"].is_null());
        assert!(last["profit"].is_null());
        assert!(last["pnl"].is_null());
        assert_eq!(body["config"]["fast_window"], 5);
        assert_eq!(body["instrument"], "AAPL");
    }

    #[tokio::test]
    async fn get_series_returns_annotated_points() {
        let app = test_app();
        app.clone()
            .oneshot(Request::post("/runs").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let response = app
            .oneshot(Request::get("/runs/1/series").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let series = body["series"].as_array().unwrap();
        assert_eq!(series.len(), 381);
        assert_eq!(series[19]["crossover"], "bullish_crossover");
    }

    #[tokio::test]
    async fn unknown_run_is_not_found() {
        let response = test_app()
            .oneshot(Request::get("/runs/42").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"], "run 42 not found");
    }

    #[tokio::test]
    async fn evicted_run_is_not_found() {
        let app = app(AppState::with_max_runs(
            "AAPL",
            sine_bars(100),
            small_windows(),
            2,
        ));
        for _ in 0..3 {
            let created = app
                .clone()
                .oneshot(Request::post("/runs").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(created.status(), StatusCode::CREATED);
        }

        let evicted = app
            .clone()
            .oneshot(Request::get("/runs/1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let latest = app
            .oneshot(Request::get("/runs/3/series").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(evicted.status(), StatusCode::NOT_FOUND);
        assert_eq!(latest.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn invalid_windows_are_unprocessable() {
        let response = test_app()
            .oneshot(
                Request::post("/runs")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"fast_window": 30, "slow_window": 20}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("fast window (30)"));
    }

    #[tokio::test]
    async fn malformed_overrides_are_bad_request() {
        let response = test_app()
            .oneshot(
                Request::post("/runs")
                    .body(Body::from(r#"{"fast": "fifty"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn overrides_change_the_run_config() {
        let app = test_app();
        let created = app
            .clone()
            .oneshot(
                Request::post("/runs")
                    .body(Body::from(r#"{"volume": 4.0, "starting_balance": 500.0}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);

        let body = json_body(
            app.oneshot(Request::get("/runs/1").body(Body::empty()).unwrap())
                .await
                .unwrap(),
        )
        .await;

        assert_eq!(body["config"]["volume"], 4.0);
        assert_eq!(body["result"]["starting_balance"], 500.0);
        assert_eq!(body["result"]["rows"][0]["volume"], 4.0);
    }
}
