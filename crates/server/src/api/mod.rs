//! # HTTP API
//!
//! Thin adapter over `scribe_core`: every handler validates, calls one core
//! operation, and maps its error to a JSON response.

pub mod articles;
pub mod events;
pub mod settings;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use scribe_core::ScribeError;
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::assets;
use crate::state::SharedState;

#[derive(Serialize, ToSchema)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    /// `missing_credential`, `invalid_input`, `generation`, `export`, `config`, `io`
    pub kind: String,
}

/// Handler error: a core error rendered as `{ "error": ... }`.
#[derive(Debug)]
pub struct ApiError(pub ScribeError);

impl From<ScribeError> for ApiError {
    fn from(err: ScribeError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            ScribeError::MissingCredential { .. } => (StatusCode::UNAUTHORIZED, "missing_credential"),
            ScribeError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
            ScribeError::Generation(_) => (StatusCode::BAD_GATEWAY, "generation"),
            ScribeError::Export(_) => (StatusCode::INTERNAL_SERVER_ERROR, "export"),
            ScribeError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config"),
            ScribeError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        if status.is_server_error() {
            tracing::error!(kind, "{}", self.0);
        } else {
            tracing::warn!(kind, "{}", self.0);
        }
        let body = ErrorBody {
            error: self.0.to_string(),
            kind: kind.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Scribe API",
        version = "1.0.0",
        description = "Planner / Writer / Editor article crew"
    ),
    paths(
        articles::generate_article,
        articles::export_markdown,
        articles::export_docx,
        settings::get_status,
        settings::list_agents,
        settings::get_config,
        settings::update_config,
        settings::get_providers,
        settings::save_api_key,
    ),
    components(schemas(
        ApiResponse,
        ErrorBody,
        articles::GenerateRequest,
        articles::GenerateResponse,
        articles::Downloads,
        articles::ExportRequest,
        settings::StatusResponse,
        settings::AgentInfo,
        settings::ProviderInfo,
        settings::ProvidersResponse,
        settings::ApiKeyRequest,
        settings::ConfigUpdate,
        settings::ConfigResponse,
    )),
    tags(
        (name = "articles", description = "Generate and export articles"),
        (name = "config", description = "Provider, model, and API key settings")
    )
)]
pub struct ApiDoc;

async fn serve_openapi() -> impl IntoResponse {
    match ApiDoc::openapi().to_json() {
        Ok(doc) => (
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            doc,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// Full application router, UI included.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/v1/articles", post(articles::generate_article))
        .route("/api/v1/articles/export/markdown", post(articles::export_markdown))
        .route("/api/v1/articles/export/docx", post(articles::export_docx))
        .route("/api/v1/settings/api-key", post(settings::save_api_key))
        .route("/api/v1/status", get(settings::get_status))
        .route("/api/v1/agents", get(settings::list_agents))
        .route(
            "/api/v1/config",
            get(settings::get_config).patch(settings::update_config),
        )
        .route("/api/v1/providers", get(settings::get_providers))
        .route("/api/v1/events", get(events::events))
        .route("/api/v1/openapi.json", get(serve_openapi))
        .fallback(get(assets::serve_static))
        .with_state(state)
}
