use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use solicitud_contract::{Folio, SubmissionResponse, ValidationError};
use solicitud_mailer::Mailer;
use solicitud_storage::SubmissionStore;
use solicitud_uploads::StagedUploads;
use tracing::{debug, info};

use crate::error::IntakeError;
use crate::form::render_intake_form;
use crate::submit::{read_submission, record_submission};

pub const SUBMIT_PATH: &str = "/submit";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct IntakeConfig {
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub admin_email: String,
    pub cors_allowed_origins: Vec<String>,
}

impl IntakeConfig {
    pub fn new(admin_email: impl Into<String>) -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            admin_email: admin_email.into(),
            cors_allowed_origins: vec!["*".to_string()],
        }
    }

    pub fn allows_origin(&self, origin: &str) -> bool {
        self.cors_allowed_origins
            .iter()
            .any(|allowed| allowed == "*" || allowed == origin)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SubmissionStore>,
    pub mailer: Arc<dyn Mailer>,
    pub config: Arc<IntakeConfig>,
    pub form_page: Arc<String>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn SubmissionStore>,
        mailer: Arc<dyn Mailer>,
        config: IntakeConfig,
    ) -> Self {
        Self {
            store,
            mailer,
            config: Arc::new(config),
            form_page: Arc::new(render_intake_form(SUBMIT_PATH)),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(intake_form))
        .route(SUBMIT_PATH, post(submit))
        .route("/health/live", get(health_live))
        .route("/health/ready", get(health_ready))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(middleware::from_fn_with_state(state.clone(), cors))
        .with_state(state)
}

async fn intake_form(State(state): State<AppState>) -> Html<String> {
    Html(state.form_page.as_ref().clone())
}

async fn submit(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SubmissionResponse>, IntakeError> {
    let multipart = multipart.map_err(|rejection| {
        debug!(rejection = %rejection, "submit without a multipart body");
        ValidationError::MalformedBody
    })?;

    let mut uploads = StagedUploads::prepare(state.config.upload_dir.clone()).await?;
    let outcome = process_submission(&state, multipart, &mut uploads).await;
    let removed = uploads.discard().await;
    debug!(removed, "temporary uploads removed");

    let folio = outcome?;
    info!(folio = %folio, "submission accepted");
    Ok(Json(SubmissionResponse::accepted(folio)))
}

async fn process_submission(
    state: &AppState,
    multipart: Multipart,
    uploads: &mut StagedUploads,
) -> Result<Folio, IntakeError> {
    let submission = read_submission(multipart, uploads).await?;
    let folio = Folio::generate();
    record_submission(state, &submission, folio).await?;
    Ok(folio)
}

async fn health_live() -> impl IntoResponse {
    Json(json!({
        "status": "live",
        "timestamp": Utc::now().to_rfc3339()
    }))
}

async fn health_ready(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.store.check_connection().await.is_ok();
    let payload = Json(json!({
        "status": if ready { "ready" } else { "degraded" },
        "timestamp": Utc::now().to_rfc3339()
    }));

    if ready {
        (StatusCode::OK, payload).into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, payload).into_response()
    }
}

async fn cors(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let allowed_origin = req
        .headers()
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .filter(|origin| state.config.allows_origin(origin))
        .and_then(|origin| HeaderValue::from_str(origin).ok());

    if *req.method() == Method::OPTIONS {
        let mut resp = StatusCode::NO_CONTENT.into_response();
        if let Some(origin) = allowed_origin {
            let headers = resp.headers_mut();
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static("GET,POST,OPTIONS"),
            );
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static("content-type"),
            );
        }
        return resp;
    }

    let mut resp = next.run(req).await;
    if let Some(origin) = allowed_origin {
        let headers = resp.headers_mut();
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        headers.insert(header::VARY, HeaderValue::from_static("Origin"));
    }
    resp
}
