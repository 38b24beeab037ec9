//! # API REST
//!
//! REST API implementation for the clinic back-office core.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, header-based auth)
//!
//! Uses `api-shared` for common types and `clinic-core` for all domain logic.

#![warn(rust_2018_idioms)]

use api_shared::auth::{
    permissions_from_header, validate_api_key, API_KEY_HEADER, PERMISSIONS_HEADER,
};
use api_shared::dto::{AccessLevelRes, AccessLevelsRes, ErrorRes, HealthRes};
use api_shared::HealthService;
use axum::{
    extract::{rejection::JsonRejection, Path as AxumPath, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use clinic_core::{
    ClinicError, CoreConfig, ExaminationId, ExaminationSnapshot, ExaminationSource,
    InvoiceRecord, InvoiceService, PermissionResolver, PermissionSet, Tier,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Resource whose viewers may see invoices.
const INVOICE_RESOURCE: &str = "examination";

type ApiError = (StatusCode, Json<ErrorRes>);

/// Application state for the REST API server
///
/// Holds the core services shared by all request handlers. Everything here is immutable after
/// startup, so handlers never lock.
#[derive(Clone)]
pub struct AppState {
    resolver: PermissionResolver,
    invoices: InvoiceService,
    examinations: Arc<dyn ExaminationSource>,
    api_key: Option<Arc<str>>,
    clock: fn() -> DateTime<Utc>,
}

impl AppState {
    pub fn new(
        cfg: Arc<CoreConfig>,
        examinations: Arc<dyn ExaminationSource>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            resolver: PermissionResolver::new(cfg.clone()),
            invoices: InvoiceService::new(cfg),
            examinations,
            api_key: api_key.map(Arc::from),
            clock: Utc::now,
        }
    }

    /// Replace the wall clock used for "now" (age display).
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_access_levels,
        access_level,
        preview_invoice,
        examination_invoice,
    ),
    components(schemas(HealthRes, AccessLevelRes, AccessLevelsRes, ErrorRes))
)]
pub struct ApiDoc;

/// Build the REST router with Swagger UI mounted at `/swagger-ui`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/access", get(list_access_levels))
        .route("/access/:resource", get(access_level))
        .route("/invoices/preview", post(preview_invoice))
        .route("/examinations/:id/invoice", get(examination_invoice))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for load balancers and monitoring.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/access",
    responses(
        (status = 200, description = "Caller's level on every resource", body = AccessLevelsRes),
        (status = 401, description = "Invalid API key", body = ErrorRes)
    )
)]
/// List the caller's access level on every configured resource.
#[axum::debug_handler]
async fn list_access_levels(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AccessLevelsRes>, ApiError> {
    let granted = authorise(&state, &headers)?;
    Ok(Json(state.resolver.levels(&granted).into()))
}

#[utoipa::path(
    get,
    path = "/access/{resource}",
    params(("resource" = String, Path, description = "Resource key, e.g. medicine")),
    responses(
        (status = 200, description = "Caller's level on the resource", body = AccessLevelRes),
        (status = 401, description = "Invalid API key", body = ErrorRes)
    )
)]
/// Resolve the caller's access level on one resource.
///
/// Unknown resources are not an error: they simply resolve to no access (`level: null`).
#[axum::debug_handler]
async fn access_level(
    State(state): State<AppState>,
    AxumPath(resource): AxumPath<String>,
    headers: HeaderMap,
) -> Result<Json<AccessLevelRes>, ApiError> {
    let granted = authorise(&state, &headers)?;
    let level = state.resolver.level(&resource, &granted);
    Ok(Json(AccessLevelRes::new(resource, level)))
}

#[utoipa::path(
    post,
    path = "/invoices/preview",
    responses(
        (status = 200, description = "Invoice derived from the posted examination snapshot"),
        (status = 400, description = "Invalid snapshot", body = ErrorRes),
        (status = 401, description = "Invalid API key", body = ErrorRes),
        (status = 403, description = "Caller cannot view examinations", body = ErrorRes)
    )
)]
/// Derive an invoice from a snapshot supplied in the request body.
#[axum::debug_handler]
async fn preview_invoice(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ExaminationSnapshot>, JsonRejection>,
) -> Result<Json<InvoiceRecord>, ApiError> {
    let granted = authorise(&state, &headers)?;
    require(&state, &granted, INVOICE_RESOURCE, Tier::Viewer)?;

    let Json(snapshot) =
        payload.map_err(|rejection| clinic_error(ClinicError::Translation(rejection.body_text())))?;
    snapshot.validate().map_err(clinic_error)?;
    let invoice = state
        .invoices
        .derive(&snapshot, (state.clock)())
        .map_err(clinic_error)?;
    Ok(Json(invoice))
}

#[utoipa::path(
    get,
    path = "/examinations/{id}/invoice",
    params(("id" = String, Path, description = "Examination identifier")),
    responses(
        (status = 200, description = "Invoice derived from the stored examination snapshot"),
        (status = 400, description = "Invalid examination identifier", body = ErrorRes),
        (status = 401, description = "Invalid API key", body = ErrorRes),
        (status = 403, description = "Caller cannot view examinations", body = ErrorRes),
        (status = 404, description = "Examination not found", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Derive the invoice of a stored examination.
#[axum::debug_handler]
async fn examination_invoice(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    headers: HeaderMap,
) -> Result<Json<InvoiceRecord>, ApiError> {
    let granted = authorise(&state, &headers)?;
    require(&state, &granted, INVOICE_RESOURCE, Tier::Viewer)?;

    let id = ExaminationId::parse(&id).map_err(|e| clinic_error(e.into()))?;
    let snapshot = state.examinations.fetch(&id).map_err(clinic_error)?;
    let invoice = state
        .invoices
        .derive(&snapshot, (state.clock)())
        .map_err(clinic_error)?;
    Ok(Json(invoice))
}

fn api_error(status: StatusCode, message: &str) -> ApiError {
    (
        status,
        Json(ErrorRes {
            message: message.to_owned(),
        }),
    )
}

/// Check the API key and extract the caller's permission set.
fn authorise(state: &AppState, headers: &HeaderMap) -> Result<PermissionSet, ApiError> {
    let provided = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok());
    if let Err(e) = validate_api_key(state.api_key.as_deref(), provided) {
        tracing::warn!("rejected request: {}", e);
        return Err(api_error(StatusCode::UNAUTHORIZED, "Khóa API không hợp lệ"));
    }

    let permissions = headers
        .get(PERMISSIONS_HEADER)
        .and_then(|v| v.to_str().ok());
    Ok(permissions_from_header(permissions))
}

fn require(
    state: &AppState,
    granted: &PermissionSet,
    resource: &str,
    minimum: Tier,
) -> Result<(), ApiError> {
    if state.resolver.has_at_least(resource, granted, minimum) {
        Ok(())
    } else {
        Err(api_error(
            StatusCode::FORBIDDEN,
            "Bạn không có quyền thực hiện thao tác này",
        ))
    }
}

fn clinic_error(e: ClinicError) -> ApiError {
    let status = match &e {
        ClinicError::ExaminationNotFound(_) => StatusCode::NOT_FOUND,
        ClinicError::InvalidInput(_) | ClinicError::Translation(_) | ClinicError::Text(_) => {
            StatusCode::BAD_REQUEST
        }
        ClinicError::FileRead(_) | ClinicError::Serialization(_) | ClinicError::Overflow(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    if status.is_server_error() {
        tracing::error!("request failed: {:?}", e);
    } else {
        tracing::warn!("request rejected: {}", e);
    }

    api_error(status, e.user_message())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use clinic_core::{AccessLevelMap, ClinicTime, FileExaminationSource};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const SNAPSHOT_JSON: &str = r#"{
        "birthDate": "2026-08-09",
        "examinedAt": "2026-10-19T02:30:00Z",
        "examinationFee": 100000,
        "discounts": [{ "type": "percent", "value": 10, "description": "Khách quen" }]
    }"#;

    const SNAPSHOT_YAML: &str = r#"birthDate: 2026-08-09
examinedAt: 2026-10-19T02:30:00Z
services:
  - name: Khám tổng quát
    unitPrice: 100000
    quantity: 2
discounts:
  - type: fix
    value: 5000
"#;

    fn fixed_now() -> DateTime<Utc> {
        "2026-10-19T03:00:00Z"
            .parse::<DateTime<Utc>>()
            .expect("valid datetime")
    }

    fn app(data_dir: &TempDir, api_key: Option<&str>) -> Router {
        let cfg = Arc::new(
            CoreConfig::new(
                data_dir.path().to_path_buf(),
                AccessLevelMap::default_clinic(),
                ClinicTime::vietnam(),
            )
            .expect("valid config"),
        );
        let examinations = Arc::new(FileExaminationSource::new(data_dir.path()));
        let state = AppState::new(cfg, examinations, api_key.map(str::to_owned))
            .with_clock(fixed_now);
        router(state)
    }

    fn get_request(uri: &str, permissions: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(PERMISSIONS_HEADER, permissions)
            .body(Body::empty())
            .expect("build request")
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.expect("send request");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("read body")
            .to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn health_is_open() {
        let dir = TempDir::new().expect("create temp dir");
        let (status, body) = send(app(&dir, Some("secret")), get_request("/health", "")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn resolves_editor_level() {
        let dir = TempDir::new().expect("create temp dir");
        let request = get_request(
            "/access/medicine",
            "medicine:read,medicine:create,medicine:update",
        );
        let (status, body) = send(app(&dir, None), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["resource"], "medicine");
        assert_eq!(body["level"], "editor");
    }

    #[tokio::test]
    async fn unknown_resource_resolves_to_null() {
        let dir = TempDir::new().expect("create temp dir");
        let (status, body) =
            send(app(&dir, None), get_request("/access/warehouse", "all")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["level"], Value::Null);
    }

    #[tokio::test]
    async fn lists_levels_for_all_resources() {
        let dir = TempDir::new().expect("create temp dir");
        let (status, body) = send(app(&dir, None), get_request("/access", "role:read")).await;
        assert_eq!(status, StatusCode::OK);

        let levels = body["levels"].as_array().expect("levels array");
        let role = levels
            .iter()
            .find(|l| l["resource"] == "role")
            .expect("role entry");
        assert_eq!(role["level"], "viewer");
    }

    #[tokio::test]
    async fn rejects_wrong_api_key() {
        let dir = TempDir::new().expect("create temp dir");
        let request = Request::builder()
            .uri("/access/medicine")
            .header(API_KEY_HEADER, "guess")
            .body(Body::empty())
            .expect("build request");
        let (status, body) = send(app(&dir, Some("secret")), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Khóa API không hợp lệ");
    }

    #[tokio::test]
    async fn previews_invoice() {
        let dir = TempDir::new().expect("create temp dir");
        let request = Request::builder()
            .method("POST")
            .uri("/invoices/preview")
            .header("content-type", "application/json")
            .header(API_KEY_HEADER, "secret")
            .header(PERMISSIONS_HEADER, "examination:read")
            .body(Body::from(SNAPSHOT_JSON))
            .expect("build request");

        let (status, body) = send(app(&dir, Some("secret")), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["subTotal"], 100_000);
        assert_eq!(body["discountTotal"], 10_000);
        assert_eq!(body["finalTotal"], 90_000);
        assert_eq!(body["discounts"][0]["unit"], "%");
        assert_eq!(body["examineDate"], "19/10/2026");
        assert_eq!(body["examineTime"], "09:30");
        assert_eq!(body["kidAge"], "2 tháng 10 ngày");
    }

    #[tokio::test]
    async fn preview_requires_examination_viewer() {
        let dir = TempDir::new().expect("create temp dir");
        let request = Request::builder()
            .method("POST")
            .uri("/invoices/preview")
            .header("content-type", "application/json")
            .header(PERMISSIONS_HEADER, "medicine:read")
            .body(Body::from(SNAPSHOT_JSON))
            .expect("build request");

        let (status, _) = send(app(&dir, None), request).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn preview_rejects_invalid_snapshot() {
        let dir = TempDir::new().expect("create temp dir");
        let body = r#"{
            "birthDate": "2026-08-09",
            "examinedAt": "2026-10-19T02:30:00Z",
            "discounts": [{ "type": "percent", "value": 150 }]
        }"#;
        let request = Request::builder()
            .method("POST")
            .uri("/invoices/preview")
            .header("content-type", "application/json")
            .header(PERMISSIONS_HEADER, "examination:read")
            .body(Body::from(body))
            .expect("build request");

        let (status, body) = send(app(&dir, None), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Dữ liệu không hợp lệ");
    }

    #[tokio::test]
    async fn preview_rejects_undeserializable_body_in_vietnamese() {
        let dir = TempDir::new().expect("create temp dir");
        let bodies = [
            r#"{ "birthDate": "2026-02-30", "examinedAt": "2026-10-19T02:30:00Z" }"#,
            r#"{ "birthDate": "2026-08-09", "examinedAt": "2026-10-19T02:30:00Z", "note": "x" }"#,
            r#"{ "birthDate": "2026-08-09", "examinedAt": "2026-10-19T02:30:00Z",
                 "discounts": [{ "type": "voucher", "value": 1 }] }"#,
            r#"{ "birthDate": "#,
        ];

        for body in bodies {
            let request = Request::builder()
                .method("POST")
                .uri("/invoices/preview")
                .header("content-type", "application/json")
                .header(PERMISSIONS_HEADER, "examination:read")
                .body(Body::from(body))
                .expect("build request");

            let (status, json) = send(app(&dir, None), request).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
            assert_eq!(json["message"], "Dữ liệu không hợp lệ", "body: {body}");
        }
    }

    #[tokio::test]
    async fn preview_checks_permissions_before_body() {
        let dir = TempDir::new().expect("create temp dir");
        let request = Request::builder()
            .method("POST")
            .uri("/invoices/preview")
            .header("content-type", "application/json")
            .body(Body::from("not json"))
            .expect("build request");

        let (status, _) = send(app(&dir, None), request).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn derives_invoice_for_stored_examination() {
        let dir = TempDir::new().expect("create temp dir");
        let examinations = dir.path().join("examinations");
        std::fs::create_dir_all(&examinations).expect("create examinations dir");
        std::fs::write(examinations.join("exam-42.yaml"), SNAPSHOT_YAML).expect("write snapshot");

        let (status, body) = send(
            app(&dir, None),
            get_request("/examinations/exam-42/invoice", "examination:read"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["serviceTotal"], 200_000);
        assert_eq!(body["services"][0]["order"], 1);
        assert_eq!(body["services"][0]["sum"], 200_000);
        assert_eq!(body["discounts"][0]["unit"], "đ");
        assert_eq!(body["finalTotal"], 195_000);
    }

    #[tokio::test]
    async fn missing_examination_is_not_found() {
        let dir = TempDir::new().expect("create temp dir");
        let (status, body) = send(
            app(&dir, None),
            get_request("/examinations/nope/invoice", "examination:read"),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Không tìm thấy phiếu khám");
    }

    #[tokio::test]
    async fn malformed_examination_id_is_bad_request() {
        let dir = TempDir::new().expect("create temp dir");
        let (status, _) = send(
            app(&dir, None),
            get_request("/examinations/a.b/invoice", "examination:read"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
