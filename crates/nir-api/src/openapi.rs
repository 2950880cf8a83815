//! # OpenAPI Document
//!
//! Collects every utoipa-annotated handler into one OpenAPI 3.1 document
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "NIR Bed Board API",
        version = "0.1.0",
        description = "Hospital bed board: sectors and beds, admissions, reservations, transfers, cleaning and blocking, discharge history, audit trail and occupancy indicators."
    ),
    paths(
        // Sectors
        crate::routes::sectors::list_sectors,
        crate::routes::sectors::create_sector,
        crate::routes::sectors::delete_sector,
        // Beds
        crate::routes::beds::list_beds,
        crate::routes::beds::create_bed,
        crate::routes::beds::get_bed,
        crate::routes::beds::remove_bed,
        crate::routes::beds::update_status,
        crate::routes::beds::occupy_bed,
        crate::routes::beds::reserve_bed,
        crate::routes::beds::transfer_patient,
        // Reference tables
        crate::routes::reference::list_doctors,
        crate::routes::reference::create_doctor,
        crate::routes::reference::delete_doctor,
        crate::routes::reference::list_payers,
        crate::routes::reference::create_payer,
        crate::routes::reference::delete_payer,
        crate::routes::reference::list_cids,
        crate::routes::reference::create_cid,
        crate::routes::reference::delete_cid,
        crate::routes::reference::list_procedures,
        crate::routes::reference::create_procedure,
        crate::routes::reference::delete_procedure,
        // Board
        crate::routes::board::list_history,
        crate::routes::board::list_audit,
        crate::routes::board::get_kpi,
        crate::routes::board::get_turnover,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::sectors::CreateSectorRequest,
        crate::routes::beds::CreateBedRequest,
        crate::routes::beds::UpdateStatusRequest,
        crate::routes::beds::OccupyRequest,
        crate::routes::beds::ReserveRequest,
        crate::routes::beds::TransferRequest,
        crate::routes::beds::TransferResponse,
        crate::routes::reference::CreateDoctorRequest,
        crate::routes::reference::CreatePayerRequest,
        crate::routes::reference::CreateCidRequest,
        crate::routes::reference::CreateProcedureRequest,
        crate::routes::board::TurnoverResponse,
    )),
    tags(
        (name = "sectors", description = "Hospital sectors"),
        (name = "beds", description = "Beds and their lifecycle"),
        (name = "reference", description = "Doctors, payers, CID codes and procedures"),
        (name = "board", description = "History, audit trail and indicators"),
    )
)]
pub struct ApiDoc;

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json: Return the generated OpenAPI document.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
