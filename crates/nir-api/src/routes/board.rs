//! # Board Reads
//!
//! Discharge history, the audit trail and the management indicators.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use nir_kpi::KpiSnapshot;
use nir_ledger::{AuditEntry, HistoryEntry};

use crate::error::AppError;
use crate::extractors::extract_query;
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct HistoryQuery {
    /// Only return stays that have been discharged.
    #[serde(default)]
    pub discharged: bool,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TurnoverQuery {
    pub year: i32,
    /// 1 to 12.
    pub month: u32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TurnoverResponse {
    pub year: i32,
    pub month: u32,
    /// Admissions dated in the month per bed on the board.
    pub turnover: f64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/history", get(list_history))
        .route("/audit", get(list_audit))
        .route("/kpi", get(get_kpi))
        .route("/kpi/turnover", get(get_turnover))
}

/// GET /history: Every stay, open or discharged, in admission order.
#[utoipa::path(
    get,
    path = "/history",
    params(HistoryQuery),
    responses((status = 200, description = "History entries")),
    tag = "board"
)]
async fn list_history(
    State(state): State<AppState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<Vec<HistoryEntry>>, AppError> {
    let query = extract_query(query)?;
    let mut entries = state.run(move |service| service.history()).await?;
    if query.discharged {
        entries.retain(|entry| !entry.is_open());
    }
    Ok(Json(entries))
}

/// GET /audit: Most recent audit entries, newest first.
#[utoipa::path(
    get,
    path = "/audit",
    responses((status = 200, description = "Audit trail, newest first")),
    tag = "board"
)]
async fn list_audit(State(state): State<AppState>) -> Result<Json<Vec<AuditEntry>>, AppError> {
    state.run(move |service| service.audit()).await.map(Json)
}

/// GET /kpi: Occupancy, turnover, average stay and mismatch indicators.
#[utoipa::path(
    get,
    path = "/kpi",
    responses((status = 200, description = "Current indicators")),
    tag = "board"
)]
async fn get_kpi(State(state): State<AppState>) -> Result<Json<KpiSnapshot>, AppError> {
    state.run(move |service| service.kpi()).await.map(Json)
}

/// GET /kpi/turnover: Bed turnover for one calendar month.
#[utoipa::path(
    get,
    path = "/kpi/turnover",
    params(TurnoverQuery),
    responses(
        (status = 200, description = "Monthly turnover", body = TurnoverResponse),
        (status = 400, description = "Missing or malformed year or month", body = crate::error::ErrorBody),
        (status = 422, description = "Month out of range", body = crate::error::ErrorBody),
    ),
    tag = "board"
)]
async fn get_turnover(
    State(state): State<AppState>,
    query: Result<Query<TurnoverQuery>, QueryRejection>,
) -> Result<Json<TurnoverResponse>, AppError> {
    let query = extract_query(query)?;
    if !(1..=12).contains(&query.month) {
        return Err(AppError::Validation(format!(
            "month must be between 1 and 12, got {}",
            query.month
        )));
    }
    let (year, month) = (query.year, query.month);
    let turnover = state
        .run(move |service| service.monthly_turnover(year, month))
        .await?;
    Ok(Json(TurnoverResponse {
        year: query.year,
        month: query.month,
        turnover,
    }))
}
