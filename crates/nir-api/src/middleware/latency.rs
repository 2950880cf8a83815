//! # Simulated Latency
//!
//! Adds a fixed delay before each request reaches its handler, to make a
//! local board behave like one served over a slow network. Disabled when
//! the delay is zero.

use std::time::Duration;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

/// Request extension carrying the configured delay.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedLatency(pub Duration);

pub async fn latency_middleware(request: Request, next: Next) -> Response {
    let delay = request
        .extensions()
        .get::<SimulatedLatency>()
        .map(|latency| latency.0)
        .unwrap_or_default();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    next.run(request).await
}
