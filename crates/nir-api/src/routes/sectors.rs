//! # Sectors
//!
//! - `GET /sectors`: list sectors in display order
//! - `POST /sectors`: create a sector
//! - `DELETE /sectors/{id}`: delete a sector with no beds

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;

use nir_core::{Sector, SectorId};

use crate::error::AppError;
use crate::extractors::{extract_validated_json, parse_id, require_field, Validate};
use crate::state::AppState;

// ── Request DTOs ────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSectorRequest {
    pub name: String,
    /// Short board code, e.g. "UTI-A".
    pub code: String,
    /// Display order; lower sorts first.
    #[serde(default)]
    pub order: i32,
    pub actor: Option<String>,
}

impl Validate for CreateSectorRequest {
    fn validate(&self) -> Result<(), String> {
        require_field("name", &self.name)?;
        require_field("code", &self.code)
    }
}

// ── Router ──────────────────────────────────────────────────────────

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sectors", get(list_sectors).post(create_sector))
        .route("/sectors/{id}", delete(delete_sector))
}

// ── Handlers ────────────────────────────────────────────────────────

/// GET /sectors: List sectors in display order.
#[utoipa::path(
    get,
    path = "/sectors",
    responses((status = 200, description = "Sectors ordered by `order`")),
    tag = "sectors"
)]
async fn list_sectors(State(state): State<AppState>) -> Result<Json<Vec<Sector>>, AppError> {
    state.run(move |service| service.sectors()).await.map(Json)
}

/// POST /sectors: Create a sector.
#[utoipa::path(
    post,
    path = "/sectors",
    request_body = CreateSectorRequest,
    responses(
        (status = 201, description = "Sector created"),
        (status = 409, description = "Sector code already in use", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "sectors"
)]
async fn create_sector(
    State(state): State<AppState>,
    body: Result<Json<CreateSectorRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Sector>), AppError> {
    let req = extract_validated_json(body)?;
    let sector = state.run(move |service| {
        service.create_sector(&req.name, &req.code, req.order, req.actor.as_deref())
    })
    .await?;
    Ok((StatusCode::CREATED, Json(sector)))
}

/// DELETE /sectors/{id}: Delete a sector that has no beds.
#[utoipa::path(
    delete,
    path = "/sectors/{id}",
    params(("id" = String, Path, description = "Sector ID")),
    responses(
        (status = 204, description = "Sector deleted"),
        (status = 404, description = "Sector not found", body = crate::error::ErrorBody),
        (status = 409, description = "Sector still has beds", body = crate::error::ErrorBody),
    ),
    tag = "sectors"
)]
async fn delete_sector(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: SectorId = parse_id(&id)?;
    state.run(move |service| service.delete_sector(&id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
