//! Embedded browser UI.

use axum::{
    body::Body,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "assets"]
struct Assets;

pub async fn serve_static(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');
    let path = if path.is_empty() { "index.html" } else { path };

    if let Some(file) = Assets::get(path) {
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        return file_response(mime.as_ref(), file.data.into_owned());
    }

    // Unknown API paths are real 404s; everything else gets the page
    if path.starts_with("api/") {
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    }
    match Assets::get("index.html") {
        Some(file) => file_response("text/html; charset=utf-8", file.data.into_owned()),
        None => (StatusCode::NOT_FOUND, "Not Found").into_response(),
    }
}

fn file_response(mime: &str, bytes: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, mime.to_string())], Body::from(bytes)).into_response()
}
