//! # Integration Tests for nir-api
//!
//! Drives the full router with `oneshot`: health checks, sector and bed
//! management, the admission/discharge/cleaning cycle, reservations,
//! transfers and swaps, error mapping, audit order, KPIs and the OpenAPI
//! document.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use nir_api::state::{AppConfig, AppState};

/// Helper: build the test app over an in-memory store.
fn test_app() -> axum::Router {
    nir_api::app(AppState::new())
}

/// Helper: read response body as string.
async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Helper: send a request, return the status and the JSON body (or `Null`).
async fn send(
    app: &axum::Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let text = body_string(response).await;
    let value = if text.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap()
    };
    (status, value)
}

/// A sector, one payer, one CID, and beds with the given numbers and
/// the "Enfermaria" category.
struct Ward {
    sector_id: String,
    payer_id: String,
    cid_id: String,
    beds: Vec<String>,
}

async fn seed_ward(app: &axum::Router, numbers: &[&str]) -> Ward {
    let (status, sector) = send(
        app,
        Method::POST,
        "/sectors",
        Some(json!({"name": "Clínica Médica", "code": "CM", "order": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let sector_id = sector["id"].as_str().unwrap().to_string();

    let (_, payer) = send(app, Method::POST, "/payers", Some(json!({"name": "SUS"}))).await;
    let (_, cid) = send(
        app,
        Method::POST,
        "/cids",
        Some(json!({"code": "J18.9", "description": "Pneumonia"})),
    )
    .await;

    let mut beds = Vec::new();
    for number in numbers {
        let (status, bed) = send(
            app,
            Method::POST,
            "/beds",
            Some(json!({
                "sector_id": sector_id,
                "number": number,
                "category": "Enfermaria",
                "actor": "admin",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        beds.push(bed["id"].as_str().unwrap().to_string());
    }

    Ward {
        sector_id,
        payer_id: payer["id"].as_str().unwrap().to_string(),
        cid_id: cid["id"].as_str().unwrap().to_string(),
        beds,
    }
}

fn admission(ward: &Ward, patient: &str) -> Value {
    json!({
        "patient_name": patient,
        "birth_date": "1950-06-15",
        "doctor_name": "Dr. Lima",
        "payer_id": ward.payer_id,
        "cid_id": ward.cid_id,
        "admission_type": "CLINICAL",
        "admission_date": "2024-01-01",
        "entitled_category": "Enfermaria",
    })
}

async fn occupy(app: &axum::Router, ward: &Ward, bed: &str, patient: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        &format!("/beds/{bed}/occupy"),
        Some(json!({"data": admission(ward, patient), "actor": "enf.ana"})),
    )
    .await
}

async fn set_status(app: &axum::Router, bed: &str, status: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::PATCH,
        &format!("/beds/{bed}/status"),
        Some(json!({"status": status})),
    )
    .await
}

// -- Health Checks ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_check() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health/liveness")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_check() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health/readiness")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");
}

// -- Sectors and Beds ---------------------------------------------------------

#[tokio::test]
async fn test_new_beds_start_free_at_version_zero() {
    let app = test_app();
    let ward = seed_ward(&app, &["101", "102"]).await;

    let (status, beds) = send(&app, Method::GET, "/beds", None).await;
    assert_eq!(status, StatusCode::OK);
    let beds = beds.as_array().unwrap();
    assert_eq!(beds.len(), 2);
    for bed in beds {
        assert_eq!(bed["status"], "FREE");
        assert_eq!(bed["version"], 0);
        assert_eq!(bed["sector_id"], ward.sector_id.as_str());
    }
}

#[tokio::test]
async fn test_duplicate_bed_number_in_sector_conflicts() {
    let app = test_app();
    let ward = seed_ward(&app, &["101"]).await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/beds",
        Some(json!({"sector_id": ward.sector_id, "number": "101", "category": "UTI"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_bed_in_unknown_sector_is_not_found() {
    let app = test_app();
    let (status, _) = send(
        &app,
        Method::POST,
        "/beds",
        Some(json!({
            "sector_id": "7f7c1e4e-0000-4000-8000-000000000000",
            "number": "1",
            "category": "UTI",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sector_with_beds_cannot_be_deleted() {
    let app = test_app();
    let ward = seed_ward(&app, &["101"]).await;
    let uri = format!("/sectors/{}", ward.sector_id);

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, Method::DELETE, &format!("/beds/{}", ward.beds[0]), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_blank_sector_name_is_validation_error() {
    let app = test_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/sectors",
        Some(json!({"name": "  ", "code": "X"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/sectors")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_turnover_without_year_is_json_bad_request() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/kpi/turnover?month=3", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (status, body) = send(&app, Method::GET, "/kpi/turnover?year=2024&month=march", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (status, _) = send(&app, Method::GET, "/kpi/turnover?year=2024&month=3", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_history_filter_is_json_bad_request() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/history?discharged=maybe", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_duplicate_sector_code_conflicts() {
    let app = test_app();
    seed_ward(&app, &[]).await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/sectors",
        Some(json!({"name": "Clínica Médica II", "code": "cm"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (_, sectors) = send(&app, Method::GET, "/sectors", None).await;
    assert_eq!(sectors.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_garbage_bed_id_is_bad_request() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/beds/leito-12", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_prefixed_bed_id_is_accepted() {
    let app = test_app();
    let ward = seed_ward(&app, &["101"]).await;
    let (status, bed) = send(&app, Method::GET, &format!("/beds/bed:{}", ward.beds[0]), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bed["number"], "101");
}

// -- Bed Lifecycle ------------------------------------------------------------

#[tokio::test]
async fn test_admission_discharge_cleaning_cycle() {
    let app = test_app();
    let ward = seed_ward(&app, &["101"]).await;
    let bed = &ward.beds[0];

    let (status, occupied) = occupy(&app, &ward, bed, "Maria Souza").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(occupied["status"], "OCCUPIED");
    assert_eq!(occupied["patient_name"], "Maria Souza");
    assert_eq!(occupied["version"], 1);

    let (status, cleaning) = set_status(&app, bed, "CLEANING").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cleaning["status"], "CLEANING");
    assert_eq!(cleaning["previous"]["patient_name"], "Maria Souza");

    let (status, free) = set_status(&app, bed, "free").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(free["status"], "FREE");
    assert!(free.get("previous").is_none());

    let (_, history) = send(&app, Method::GET, "/history?discharged=true", None).await;
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["patient_name"], "Maria Souza");
    assert!(!history[0]["release_date"].is_null());
}

#[tokio::test]
async fn test_occupied_to_free_is_rejected() {
    let app = test_app();
    let ward = seed_ward(&app, &["101"]).await;
    let bed = &ward.beds[0];
    occupy(&app, &ward, bed, "Maria").await;

    let (status, body) = set_status(&app, bed, "FREE").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("OCCUPIED -> FREE"));

    let (_, unchanged) = send(&app, Method::GET, &format!("/beds/{bed}"), None).await;
    assert_eq!(unchanged["status"], "OCCUPIED");
}

#[tokio::test]
async fn test_unknown_status_is_validation_error() {
    let app = test_app();
    let ward = seed_ward(&app, &["101"]).await;
    let (status, _) = set_status(&app, &ward.beds[0], "BROKEN").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_incomplete_admission_is_validation_error() {
    let app = test_app();
    let ward = seed_ward(&app, &["101"]).await;
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/beds/{}/occupy", ward.beds[0]),
        Some(json!({"data": {"patient_name": "Maria"}})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_admission_with_unknown_payer_is_not_found() {
    let app = test_app();
    let mut ward = seed_ward(&app, &["101"]).await;
    ward.payer_id = "7f7c1e4e-0000-4000-8000-000000000000".to_string();
    let bed = ward.beds[0].clone();
    let (status, _) = occupy(&app, &ward, &bed, "Maria").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stale_version_reports_current_version() {
    let app = test_app();
    let ward = seed_ward(&app, &["101"]).await;
    let bed = &ward.beds[0];
    occupy(&app, &ward, bed, "Maria").await;

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/beds/{bed}/status"),
        Some(json!({"status": "CLEANING", "expected_version": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["details"]["expected_version"], 0);
    assert_eq!(body["error"]["details"]["current_version"], 1);
}

#[tokio::test]
async fn test_reservation_then_admission() {
    let app = test_app();
    let ward = seed_ward(&app, &["101"]).await;
    let bed = &ward.beds[0];

    let (status, reserved) = send(
        &app,
        Method::POST,
        &format!("/beds/{bed}/reserve"),
        Some(json!({"data": {"patient_name": "João", "admission_date": "2024-01-02"}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reserved["status"], "RESERVED");
    assert_eq!(reserved["patient_name"], "João");

    let (_, history) = send(&app, Method::GET, "/history", None).await;
    assert!(history.as_array().unwrap().is_empty());

    let (status, occupied) = occupy(&app, &ward, bed, "João").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(occupied["status"], "OCCUPIED");
}

#[tokio::test]
async fn test_reservation_hold_is_kept_on_the_bed() {
    let app = test_app();
    let ward = seed_ward(&app, &["101"]).await;
    let bed = &ward.beds[0];
    let uri = format!("/beds/{bed}/reserve");

    let (status, _) = send(
        &app,
        Method::POST,
        &uri,
        Some(json!({"data": {
            "patient_name": "João",
            "admission_date": "2024-01-05",
            "reserved_until": "2024-01-04",
        }})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, reserved) = send(
        &app,
        Method::POST,
        &uri,
        Some(json!({"data": {
            "patient_name": "João",
            "admission_date": "2024-01-05",
            "reserved_until": "2024-01-07",
        }})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reserved["reserved_until"], "2024-01-07");
}

#[tokio::test]
async fn test_blocking_reserved_bed_cancels_reservation() {
    let app = test_app();
    let ward = seed_ward(&app, &["101"]).await;
    let bed = &ward.beds[0];
    send(
        &app,
        Method::POST,
        &format!("/beds/{bed}/reserve"),
        Some(json!({"data": {"patient_name": "João"}})),
    )
    .await;

    let (status, blocked) = set_status(&app, bed, "BLOCKED").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(blocked["status"], "BLOCKED");
    assert!(blocked.get("patient_name").is_none());

    let (_, audit) = send(&app, Method::GET, "/audit", None).await;
    let details = audit[0]["details"].as_str().unwrap();
    assert!(details.contains("João"), "{details}");
}

#[tokio::test]
async fn test_reserving_occupied_bed_conflicts() {
    let app = test_app();
    let ward = seed_ward(&app, &["101"]).await;
    let bed = &ward.beds[0];
    occupy(&app, &ward, bed, "Maria").await;
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/beds/{bed}/reserve"),
        Some(json!({"data": {"patient_name": "João"}})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_occupied_bed_cannot_be_removed() {
    let app = test_app();
    let ward = seed_ward(&app, &["101"]).await;
    let bed = &ward.beds[0];
    occupy(&app, &ward, bed, "Maria").await;
    let (status, _) = send(&app, Method::DELETE, &format!("/beds/{bed}?actor=admin"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

// -- Transfers ----------------------------------------------------------------

#[tokio::test]
async fn test_transfer_to_free_bed() {
    let app = test_app();
    let ward = seed_ward(&app, &["101", "102"]).await;
    let (source, target) = (&ward.beds[0], &ward.beds[1]);
    occupy(&app, &ward, source, "Maria").await;

    let (status, moved) = send(
        &app,
        Method::POST,
        &format!("/beds/{source}/transfer"),
        Some(json!({"target_bed_id": target, "actor": "nir"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["source"]["status"], "CLEANING");
    assert_eq!(moved["target"]["status"], "OCCUPIED");
    assert_eq!(moved["target"]["patient_name"], "Maria");

    let (_, history) = send(&app, Method::GET, "/history", None).await;
    let entry = &history.as_array().unwrap()[0];
    assert_eq!(entry["bed_number"], "101");
    assert_eq!(entry["transfers"].as_array().unwrap().len(), 1);
    assert_eq!(entry["transfers"][0]["to_bed_number"], "102");
}

#[tokio::test]
async fn test_transfer_between_occupied_beds_swaps() {
    let app = test_app();
    let ward = seed_ward(&app, &["101", "102"]).await;
    let (a, b) = (&ward.beds[0], &ward.beds[1]);
    occupy(&app, &ward, a, "Maria").await;
    occupy(&app, &ward, b, "João").await;

    let (status, swapped) = send(
        &app,
        Method::POST,
        &format!("/beds/{a}/transfer"),
        Some(json!({"target_bed_id": b})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(swapped["source"]["patient_name"], "João");
    assert_eq!(swapped["target"]["patient_name"], "Maria");

    let (_, audit) = send(&app, Method::GET, "/audit", None).await;
    assert_eq!(audit[0]["action"], "SWAP");
}

#[tokio::test]
async fn test_transfer_to_same_bed_is_validation_error() {
    let app = test_app();
    let ward = seed_ward(&app, &["101"]).await;
    let bed = &ward.beds[0];
    occupy(&app, &ward, bed, "Maria").await;
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/beds/{bed}/transfer"),
        Some(json!({"target_bed_id": bed})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

// -- Audit, KPIs, Reference Tables --------------------------------------------

#[tokio::test]
async fn test_audit_is_newest_first_with_actor() {
    let app = test_app();
    let ward = seed_ward(&app, &["101"]).await;
    let bed = &ward.beds[0];
    occupy(&app, &ward, bed, "Maria").await;
    set_status(&app, bed, "CLEANING").await;

    let (status, audit) = send(&app, Method::GET, "/audit", None).await;
    assert_eq!(status, StatusCode::OK);
    let audit = audit.as_array().unwrap();
    assert_eq!(audit.len(), 3);
    assert_eq!(audit[0]["action"], "DISCHARGE");
    assert_eq!(audit[0]["actor"], "SYSTEM");
    assert_eq!(audit[1]["action"], "ADMISSION");
    assert_eq!(audit[1]["actor"], "enf.ana");
    assert_eq!(audit[2]["action"], "BED_CREATED");
    assert_eq!(audit[2]["actor"], "admin");
}

#[tokio::test]
async fn test_kpi_reflects_board() {
    let app = test_app();
    let ward = seed_ward(&app, &["101", "102"]).await;
    occupy(&app, &ward, &ward.beds[0], "Maria").await;

    let (status, kpi) = send(&app, Method::GET, "/kpi", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(kpi["total_beds"], 2);
    assert_eq!(kpi["status_counts"]["occupied"], 1);
    assert_eq!(kpi["status_counts"]["free"], 1);
    assert_eq!(kpi["occupancy_rate"], 50.0);
    assert_eq!(kpi["clinical_count"], 1);
    assert_eq!(kpi["mismatch_count"], 0);

    let (status, turnover) = send(&app, Method::GET, "/kpi/turnover?year=2024&month=1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(turnover["turnover"], 0.5);

    let (status, _) = send(&app, Method::GET, "/kpi/turnover?year=2024&month=13", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_default_procedures_are_seeded() {
    let app = test_app();
    let (status, procedures) = send(&app, Method::GET, "/procedures", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(procedures.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_reference_table_create_and_delete() {
    let app = test_app();
    let (status, doctor) = send(
        &app,
        Method::POST,
        "/doctors",
        Some(json!({"name": "Dra. Costa", "specialty": "Cardiologia"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/doctors/{}", doctor["id"].as_str().unwrap());

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// -- Metrics, OpenAPI, File Store ---------------------------------------------

#[tokio::test]
async fn test_metrics_count_requests_and_errors() {
    let state = AppState::new();
    let metrics = state.metrics.clone();
    let app = nir_api::app(state);

    send(&app, Method::GET, "/beds", None).await;
    send(&app, Method::GET, "/beds/not-a-uuid", None).await;

    assert_eq!(metrics.requests(), 2);
    assert_eq!(metrics.errors(), 1);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = test_app();
    let (status, doc) = send(&app, Method::GET, "/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["openapi"].as_str().unwrap().starts_with("3."));
    assert!(doc["paths"]["/beds/{id}/occupy"].is_object());
}

#[tokio::test]
async fn test_file_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        data_dir: Some(dir.path().to_path_buf()),
        ..AppConfig::default()
    };

    let app = nir_api::app(AppState::with_config(config.clone()));
    let ward = seed_ward(&app, &["101"]).await;
    occupy(&app, &ward, &ward.beds[0], "Maria").await;
    drop(app);

    let reopened = nir_api::app(AppState::with_config(config));
    let (status, bed) = send(&reopened, Method::GET, &format!("/beds/{}", ward.beds[0]), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bed["status"], "OCCUPIED");
    assert!(dir.path().join("beds.json").exists());
}
