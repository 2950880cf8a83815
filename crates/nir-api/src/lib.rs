//! # nir-api: HTTP Surface for the NIR Bed Board
//!
//! | Prefix                        | Module                   |
//! |-------------------------------|--------------------------|
//! | `/sectors/*`                  | [`routes::sectors`]      |
//! | `/beds/*`                     | [`routes::beds`]         |
//! | `/doctors`, `/payers`, ...    | [`routes::reference`]    |
//! | `/history`, `/audit`, `/kpi`  | [`routes::board`]        |
//! | `/openapi.json`               | [`openapi`]              |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → LatencyMiddleware → Handler
//! ```

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::routing::get;
use axum::Router;

use crate::middleware::latency::SimulatedLatency;
use crate::state::AppState;

/// Assemble the application router with all routes and middleware.
///
/// Health checks are mounted outside the middleware stack.
pub fn app(state: AppState) -> Router {
    let latency = SimulatedLatency(state.config.simulated_latency);

    let api = Router::new()
        .merge(routes::sectors::router())
        .merge(routes::beds::router())
        .merge(routes::reference::router())
        .merge(routes::board::router())
        .merge(openapi::router())
        .layer(from_fn(middleware::latency::latency_middleware))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(middleware::tracing_layer::layer())
        .layer(axum::Extension(state.metrics.clone()))
        .layer(axum::Extension(latency))
        .with_state(state.clone());

    let health = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .with_state(state);

    Router::new().merge(health).merge(api)
}

/// Liveness check: 200 while the process runs.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness check: 200 once the store can be read.
async fn readiness(State(state): State<AppState>) -> (StatusCode, &'static str) {
    match state.run(|service| service.snapshot()).await {
        Ok(_) => (StatusCode::OK, "ready"),
        Err(err) => {
            tracing::warn!(error = %err, "readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    }
}
