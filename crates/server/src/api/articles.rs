//! # Article API
//!
//! Generate an article for a topic and download it. Exports are stateless:
//! the browser posts the raw text back, so a failed export never touches
//! the article already on screen.

use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use scribe_core::article::ArticleDetails;
use scribe_core::crew::{ArticleCrew, CrewEvent};
use scribe_core::export::{self, ExportFile};
use scribe_core::{render, ArticleResult, ScribeError, Topic};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use utoipa::ToSchema;

use super::{ApiResult, ErrorBody};
use crate::state::SharedState;

#[derive(Deserialize, ToSchema)]
pub struct GenerateRequest {
    topic: String,
}

#[derive(Serialize, ToSchema)]
pub struct Downloads {
    markdown: String,
    docx: String,
}

#[derive(Serialize, ToSchema)]
pub struct GenerateResponse {
    topic: String,
    raw: String,
    /// Styled HTML for the result panel
    html: String,
    char_count: usize,
    #[schema(value_type = Object)]
    details: ArticleDetails,
    downloads: Downloads,
}

#[derive(Deserialize, ToSchema)]
pub struct ExportRequest {
    topic: String,
    raw: String,
}

/// Run the crew on a topic and wait for the final article
#[utoipa::path(
    post,
    path = "/api/v1/articles",
    tag = "articles",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Article generated", body = GenerateResponse),
        (status = 400, description = "Empty topic", body = ErrorBody),
        (status = 401, description = "No API key configured", body = ErrorBody),
        (status = 502, description = "The crew failed", body = ErrorBody)
    )
)]
pub async fn generate_article(
    State(state): State<SharedState>,
    Json(req): Json<GenerateRequest>,
) -> ApiResult<Json<GenerateResponse>> {
    let topic = Topic::parse(&req.topic)?;

    let cached = state.credential.read().await.clone();
    let credential = match cached {
        Some(credential) => credential,
        None => {
            // The key may have been added to the file or environment since startup
            let credential = state.resolver().await.resolve()?;
            *state.credential.write().await = Some(credential.clone());
            credential
        }
    };

    let model = state.model_config().await;
    tracing::info!(topic = %topic, provider = ?model.provider, model = %model.model, "Generating article");
    let engine = state.build_engine(model, credential);

    // Bridge crew events into the broadcast channel and the status snapshot
    let (event_tx, mut event_rx) = mpsc::channel::<CrewEvent>(32);
    let bridge_state = state.clone();
    let bridge = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            bridge_state.progress.write().await.apply(&event);
            let _ = bridge_state.event_tx.send(event);
        }
    });

    let crew = ArticleCrew::new(engine).with_event_channel(event_tx);
    let outcome = crew.run(&topic).await;
    drop(crew);
    if let Err(e) = bridge.await {
        tracing::warn!("Event bridge ended abnormally: {}", e);
    }

    let article = outcome?;
    Ok(Json(GenerateResponse {
        topic: article.topic.to_string(),
        html: render::to_styled_html(&article.raw),
        char_count: article.char_count,
        details: article.details(),
        downloads: Downloads {
            markdown: export::markdown_filename(&article.topic),
            docx: export::docx_filename(&article.topic),
        },
        raw: article.raw,
    }))
}

/// Raw article as a `.md` download
#[utoipa::path(
    post,
    path = "/api/v1/articles/export/markdown",
    tag = "articles",
    request_body = ExportRequest,
    responses(
        (status = 200, description = "Markdown file", content_type = "text/markdown"),
        (status = 400, description = "Empty topic", body = ErrorBody)
    )
)]
pub async fn export_markdown(Json(req): Json<ExportRequest>) -> ApiResult<Response> {
    let article = ArticleResult::new(Topic::parse(&req.topic)?, req.raw);
    Ok(attachment(export::markdown(&article)))
}

/// Article as a Word document
#[utoipa::path(
    post,
    path = "/api/v1/articles/export/docx",
    tag = "articles",
    request_body = ExportRequest,
    responses(
        (status = 200, description = "Word document",
         content_type = "application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        (status = 400, description = "Empty topic", body = ErrorBody),
        (status = 500, description = "Document could not be built", body = ErrorBody)
    )
)]
pub async fn export_docx(Json(req): Json<ExportRequest>) -> ApiResult<Response> {
    let article = ArticleResult::new(Topic::parse(&req.topic)?, req.raw);
    let file = tokio::task::spawn_blocking(move || export::docx(&article))
        .await
        .map_err(ScribeError::export)??;
    Ok(attachment(file))
}

fn attachment(file: ExportFile) -> Response {
    let disposition = content_disposition(&file.filename);
    let mut response = (
        [(header::CONTENT_TYPE, HeaderValue::from_static(file.mime))],
        file.bytes,
    )
        .into_response();
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        response.headers_mut().insert(header::CONTENT_DISPOSITION, value);
    }
    response
}

/// ASCII fallback name plus the RFC 5987 UTF-8 form
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}
