use axum::{
    body::Body,
    extract::OriginalUri,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "ui"]
struct Asset;

fn embedded(path: &str) -> Option<Response> {
    let content = Asset::get(path)?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    Some(
        (
            [(header::CONTENT_TYPE, mime.as_ref())],
            Body::from(content.data),
        )
            .into_response(),
    )
}

/// Serves the console. Unknown non-API paths get `index.html` so the page
/// can route itself; unknown `/api/*` paths stay JSON 404s.
pub async fn serve_asset(OriginalUri(uri): OriginalUri) -> Response {
    let path = uri.path().trim_start_matches('/');

    if path == "api" || path.starts_with("api/") {
        return super::ApiError::NotFound("The requested endpoint does not exist".to_string())
            .into_response();
    }

    let path = if path.is_empty() { "index.html" } else { path };

    embedded(path)
        .or_else(|| embedded("index.html"))
        .unwrap_or_else(|| (StatusCode::NOT_FOUND, "404 Not Found").into_response())
}
