//! # Beds
//!
//! Bed inventory and the lifecycle actions the board exposes:
//!
//! - `GET /beds`, `POST /beds`
//! - `GET /beds/{id}`, `DELETE /beds/{id}`
//! - `PATCH /beds/{id}/status`: discharge, cleaning, block/unblock, cancel
//! - `POST /beds/{id}/occupy`: admit a patient
//! - `POST /beds/{id}/reserve`: hold a free bed for an incoming patient
//! - `POST /beds/{id}/transfer`: move the occupant, or swap two occupants
//!
//! Mutating requests may carry `expected_version`; a stale value is
//! rejected with 409 and the current version in `details`.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use nir_core::{BedId, SectorId};
use nir_state::{AdmissionForm, Bed, BedStatus, ReservationForm};

use crate::error::AppError;
use crate::extractors::{
    extract_json, extract_query, extract_validated_json, parse_id, require_field, Validate,
};
use crate::state::AppState;

// ── Request/Response DTOs ───────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBedRequest {
    #[schema(value_type = String)]
    pub sector_id: SectorId,
    /// Board number, unique within the sector.
    pub number: String,
    /// Accommodation category, e.g. "Enfermaria" or "Apartamento".
    pub category: String,
    pub actor: Option<String>,
}

impl Validate for CreateBedRequest {
    fn validate(&self) -> Result<(), String> {
        require_field("number", &self.number)?;
        require_field("category", &self.category)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// Target status: FREE, OCCUPIED, CLEANING, BLOCKED or RESERVED.
    pub status: String,
    pub actor: Option<String>,
    pub expected_version: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OccupyRequest {
    #[schema(value_type = Object)]
    pub data: AdmissionForm,
    pub actor: Option<String>,
    pub expected_version: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReserveRequest {
    #[schema(value_type = Object)]
    pub data: ReservationForm,
    pub actor: Option<String>,
    pub expected_version: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TransferRequest {
    pub target_bed_id: String,
    pub actor: Option<String>,
    /// Expected version of the source bed.
    pub expected_version: Option<u64>,
}

impl Validate for TransferRequest {
    fn validate(&self) -> Result<(), String> {
        require_field("target_bed_id", &self.target_bed_id)
    }
}

/// Both beds after a transfer or swap.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransferResponse {
    #[schema(value_type = Object)]
    pub source: Bed,
    #[schema(value_type = Object)]
    pub target: Bed,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ActorQuery {
    pub actor: Option<String>,
}

// ── Router ──────────────────────────────────────────────────────────

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/beds", get(list_beds).post(create_bed))
        .route("/beds/{id}", get(get_bed).delete(remove_bed))
        .route("/beds/{id}/status", patch(update_status))
        .route("/beds/{id}/occupy", post(occupy_bed))
        .route("/beds/{id}/reserve", post(reserve_bed))
        .route("/beds/{id}/transfer", post(transfer_patient))
}

// ── Handlers ────────────────────────────────────────────────────────

/// GET /beds: List every bed with its current state.
#[utoipa::path(
    get,
    path = "/beds",
    responses((status = 200, description = "All beds")),
    tag = "beds"
)]
async fn list_beds(State(state): State<AppState>) -> Result<Json<Vec<Bed>>, AppError> {
    state.run(move |service| service.beds()).await.map(Json)
}

/// POST /beds: Add a free bed to a sector.
#[utoipa::path(
    post,
    path = "/beds",
    request_body = CreateBedRequest,
    responses(
        (status = 201, description = "Bed created"),
        (status = 404, description = "Sector not found", body = crate::error::ErrorBody),
        (status = 409, description = "Number already used in the sector", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "beds"
)]
async fn create_bed(
    State(state): State<AppState>,
    body: Result<Json<CreateBedRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Bed>), AppError> {
    let req = extract_validated_json(body)?;
    let bed = state.run(move |service| {
        service.add_bed(
            req.sector_id,
            &req.number,
            &req.category,
            req.actor.as_deref(),
        )
    })
    .await?;
    Ok((StatusCode::CREATED, Json(bed)))
}

/// GET /beds/{id}: Fetch one bed.
#[utoipa::path(
    get,
    path = "/beds/{id}",
    params(("id" = String, Path, description = "Bed ID")),
    responses(
        (status = 200, description = "Bed found"),
        (status = 404, description = "Bed not found", body = crate::error::ErrorBody),
    ),
    tag = "beds"
)]
async fn get_bed(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Bed>, AppError> {
    let id: BedId = parse_id(&id)?;
    state.run(move |service| service.bed(&id)).await.map(Json)
}

/// DELETE /beds/{id}: Remove a bed that holds no patient.
#[utoipa::path(
    delete,
    path = "/beds/{id}",
    params(("id" = String, Path, description = "Bed ID"), ActorQuery),
    responses(
        (status = 204, description = "Bed removed"),
        (status = 404, description = "Bed not found", body = crate::error::ErrorBody),
        (status = 409, description = "Bed is occupied or reserved", body = crate::error::ErrorBody),
    ),
    tag = "beds"
)]
async fn remove_bed(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<ActorQuery>, QueryRejection>,
) -> Result<StatusCode, AppError> {
    let id: BedId = parse_id(&id)?;
    let query: ActorQuery = extract_query(query)?;
    state.run(move |service| service.remove_bed(&id, query.actor.as_deref())).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /beds/{id}/status: Drive a status transition.
///
/// Admission and reservation carry patient data and have their own
/// endpoints; asking for OCCUPIED or RESERVED here is a conflict.
#[utoipa::path(
    patch,
    path = "/beds/{id}/status",
    params(("id" = String, Path, description = "Bed ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Bed after the transition"),
        (status = 404, description = "Bed not found", body = crate::error::ErrorBody),
        (status = 409, description = "Transition not allowed or stale version", body = crate::error::ErrorBody),
        (status = 422, description = "Unknown status", body = crate::error::ErrorBody),
    ),
    tag = "beds"
)]
async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<Bed>, AppError> {
    let id: BedId = parse_id(&id)?;
    let req = extract_json(body)?;
    let status: BedStatus = req.status.parse()?;
    state
        .run(move |service| {
            service.set_status(&id, status, req.actor.as_deref(), req.expected_version)
        })
        .await
        .map(Json)
}

/// POST /beds/{id}/occupy: Admit a patient to a free or reserved bed.
#[utoipa::path(
    post,
    path = "/beds/{id}/occupy",
    params(("id" = String, Path, description = "Bed ID")),
    request_body = OccupyRequest,
    responses(
        (status = 200, description = "Bed is now occupied"),
        (status = 404, description = "Bed or referenced record not found", body = crate::error::ErrorBody),
        (status = 409, description = "Bed cannot take an admission", body = crate::error::ErrorBody),
        (status = 422, description = "Admission form incomplete", body = crate::error::ErrorBody),
    ),
    tag = "beds"
)]
async fn occupy_bed(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<OccupyRequest>, JsonRejection>,
) -> Result<Json<Bed>, AppError> {
    let id: BedId = parse_id(&id)?;
    let req = extract_json(body)?;
    state
        .run(move |service| {
            service.occupy(&id, req.data, req.actor.as_deref(), req.expected_version)
        })
        .await
        .map(Json)
}

/// POST /beds/{id}/reserve: Reserve a free bed.
#[utoipa::path(
    post,
    path = "/beds/{id}/reserve",
    params(("id" = String, Path, description = "Bed ID")),
    request_body = ReserveRequest,
    responses(
        (status = 200, description = "Bed is now reserved"),
        (status = 404, description = "Bed not found", body = crate::error::ErrorBody),
        (status = 409, description = "Bed is not free", body = crate::error::ErrorBody),
        (status = 422, description = "Patient name missing", body = crate::error::ErrorBody),
    ),
    tag = "beds"
)]
async fn reserve_bed(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ReserveRequest>, JsonRejection>,
) -> Result<Json<Bed>, AppError> {
    let id: BedId = parse_id(&id)?;
    let req = extract_json(body)?;
    state
        .run(move |service| {
            service.reserve(&id, req.data, req.actor.as_deref(), req.expected_version)
        })
        .await
        .map(Json)
}

/// POST /beds/{id}/transfer: Move the occupant to another bed.
///
/// A free target receives the patient. An occupied or reserved target
/// swaps patients with the source. A cleaning or blocked target is
/// rejected with 409.
#[utoipa::path(
    post,
    path = "/beds/{id}/transfer",
    params(("id" = String, Path, description = "Source bed ID")),
    request_body = TransferRequest,
    responses(
        (status = 200, description = "Both beds after the move", body = TransferResponse),
        (status = 404, description = "Bed not found", body = crate::error::ErrorBody),
        (status = 409, description = "Move not allowed or stale version", body = crate::error::ErrorBody),
        (status = 422, description = "Source and target are the same bed", body = crate::error::ErrorBody),
    ),
    tag = "beds"
)]
async fn transfer_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<Json<TransferResponse>, AppError> {
    let source: BedId = parse_id(&id)?;
    let req = extract_validated_json(body)?;
    let target: BedId = parse_id(&req.target_bed_id)?;
    let (source, target) = state.run(move |service| {
        service.transfer(&source, &target, req.actor.as_deref(), req.expected_version)
    })
    .await?;
    Ok(Json(TransferResponse { source, target }))
}
