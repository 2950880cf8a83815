//! # Reference Tables
//!
//! Doctors, payers, CID diagnosis codes and surgical procedures. Each
//! table supports list, create and delete.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;

use nir_core::{Cid, CidId, Doctor, DoctorId, Payer, PayerId, Procedure, ProcedureId};

use crate::error::AppError;
use crate::extractors::{extract_validated_json, parse_id, require_field, Validate};
use crate::state::AppState;

// ── Request DTOs ────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDoctorRequest {
    pub name: String,
    pub specialty: Option<String>,
}

impl Validate for CreateDoctorRequest {
    fn validate(&self) -> Result<(), String> {
        require_field("name", &self.name)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePayerRequest {
    pub name: String,
}

impl Validate for CreatePayerRequest {
    fn validate(&self) -> Result<(), String> {
        require_field("name", &self.name)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCidRequest {
    /// ICD-10 code, e.g. "J18.9".
    pub code: String,
    pub description: String,
}

impl Validate for CreateCidRequest {
    fn validate(&self) -> Result<(), String> {
        require_field("code", &self.code)?;
        require_field("description", &self.description)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProcedureRequest {
    pub name: String,
}

impl Validate for CreateProcedureRequest {
    fn validate(&self) -> Result<(), String> {
        require_field("name", &self.name)
    }
}

// ── Router ──────────────────────────────────────────────────────────

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/doctors", get(list_doctors).post(create_doctor))
        .route("/doctors/{id}", delete(delete_doctor))
        .route("/payers", get(list_payers).post(create_payer))
        .route("/payers/{id}", delete(delete_payer))
        .route("/cids", get(list_cids).post(create_cid))
        .route("/cids/{id}", delete(delete_cid))
        .route("/procedures", get(list_procedures).post(create_procedure))
        .route("/procedures/{id}", delete(delete_procedure))
}

// ── Doctors ─────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/doctors",
    responses((status = 200, description = "Registered doctors")),
    tag = "reference"
)]
async fn list_doctors(State(state): State<AppState>) -> Result<Json<Vec<Doctor>>, AppError> {
    state.run(move |service| service.doctors()).await.map(Json)
}

#[utoipa::path(
    post,
    path = "/doctors",
    request_body = CreateDoctorRequest,
    responses(
        (status = 201, description = "Doctor registered"),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "reference"
)]
async fn create_doctor(
    State(state): State<AppState>,
    body: Result<Json<CreateDoctorRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Doctor>), AppError> {
    let req = extract_validated_json(body)?;
    let doctor = state.run(move |service| service.add_doctor(&req.name, req.specialty.as_deref())).await?;
    Ok((StatusCode::CREATED, Json(doctor)))
}

#[utoipa::path(
    delete,
    path = "/doctors/{id}",
    params(("id" = String, Path, description = "Doctor ID")),
    responses(
        (status = 204, description = "Doctor deleted"),
        (status = 404, description = "Doctor not found", body = crate::error::ErrorBody),
    ),
    tag = "reference"
)]
async fn delete_doctor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: DoctorId = parse_id(&id)?;
    state.run(move |service| service.delete_doctor(&id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Payers ──────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/payers",
    responses((status = 200, description = "Health plans and SUS")),
    tag = "reference"
)]
async fn list_payers(State(state): State<AppState>) -> Result<Json<Vec<Payer>>, AppError> {
    state.run(move |service| service.payers()).await.map(Json)
}

#[utoipa::path(
    post,
    path = "/payers",
    request_body = CreatePayerRequest,
    responses(
        (status = 201, description = "Payer registered"),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "reference"
)]
async fn create_payer(
    State(state): State<AppState>,
    body: Result<Json<CreatePayerRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Payer>), AppError> {
    let req = extract_validated_json(body)?;
    let payer = state.run(move |service| service.add_payer(&req.name)).await?;
    Ok((StatusCode::CREATED, Json(payer)))
}

#[utoipa::path(
    delete,
    path = "/payers/{id}",
    params(("id" = String, Path, description = "Payer ID")),
    responses(
        (status = 204, description = "Payer deleted"),
        (status = 404, description = "Payer not found", body = crate::error::ErrorBody),
    ),
    tag = "reference"
)]
async fn delete_payer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: PayerId = parse_id(&id)?;
    state.run(move |service| service.delete_payer(&id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── CIDs ────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/cids",
    responses((status = 200, description = "Diagnosis codes")),
    tag = "reference"
)]
async fn list_cids(State(state): State<AppState>) -> Result<Json<Vec<Cid>>, AppError> {
    state.run(move |service| service.cids()).await.map(Json)
}

#[utoipa::path(
    post,
    path = "/cids",
    request_body = CreateCidRequest,
    responses(
        (status = 201, description = "Code registered"),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "reference"
)]
async fn create_cid(
    State(state): State<AppState>,
    body: Result<Json<CreateCidRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Cid>), AppError> {
    let req = extract_validated_json(body)?;
    let cid = state.run(move |service| service.add_cid(&req.code, &req.description)).await?;
    Ok((StatusCode::CREATED, Json(cid)))
}

#[utoipa::path(
    delete,
    path = "/cids/{id}",
    params(("id" = String, Path, description = "CID ID")),
    responses(
        (status = 204, description = "Code deleted"),
        (status = 404, description = "Code not found", body = crate::error::ErrorBody),
    ),
    tag = "reference"
)]
async fn delete_cid(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: CidId = parse_id(&id)?;
    state.run(move |service| service.delete_cid(&id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Procedures ──────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/procedures",
    responses((status = 200, description = "Surgical procedures")),
    tag = "reference"
)]
async fn list_procedures(State(state): State<AppState>) -> Result<Json<Vec<Procedure>>, AppError> {
    state.run(move |service| service.procedures()).await.map(Json)
}

#[utoipa::path(
    post,
    path = "/procedures",
    request_body = CreateProcedureRequest,
    responses(
        (status = 201, description = "Procedure registered"),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "reference"
)]
async fn create_procedure(
    State(state): State<AppState>,
    body: Result<Json<CreateProcedureRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Procedure>), AppError> {
    let req = extract_validated_json(body)?;
    let procedure = state.run(move |service| service.add_procedure(&req.name)).await?;
    Ok((StatusCode::CREATED, Json(procedure)))
}

#[utoipa::path(
    delete,
    path = "/procedures/{id}",
    params(("id" = String, Path, description = "Procedure ID")),
    responses(
        (status = 204, description = "Procedure deleted"),
        (status = 404, description = "Procedure not found", body = crate::error::ErrorBody),
    ),
    tag = "reference"
)]
async fn delete_procedure(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: ProcedureId = parse_id(&id)?;
    state.run(move |service| service.delete_procedure(&id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
