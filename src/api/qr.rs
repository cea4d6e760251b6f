use axum::{
    Json,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::extract::ApiPath;
use super::types::QrCodeBody;
use super::validation::validate_qr_text;
use super::{ApiError, ApiResponse, AppState};

/// Keeps only characters that are safe inside a quoted filename.
fn download_name(text: &str) -> String {
    let stem: String = text.chars().filter(char::is_ascii_alphanumeric).collect();
    if stem.is_empty() {
        "qr-code.png".to_string()
    } else {
        format!("qr-code-{stem}.png")
    }
}

/// GET /api/qr-code/{code}
///
/// Renders whatever text is in the path; the code need not exist.
pub async fn qr_data_url(
    State(state): State<Arc<AppState>>,
    ApiPath(code): ApiPath<String>,
) -> Result<Json<ApiResponse<QrCodeBody>>, ApiError> {
    let text = validate_qr_text(&code)?;
    let qr_code = state.qr().render_data_url(text)?;

    Ok(Json(
        ApiResponse::success(QrCodeBody {
            qr_code,
            code: code.clone(),
        })
        .with_message("QR code generated successfully"),
    ))
}

/// GET /api/generate-qr/{code}
pub async fn qr_png(
    State(state): State<Arc<AppState>>,
    ApiPath(code): ApiPath<String>,
) -> Result<Response, ApiError> {
    let text = validate_qr_text(&code)?;
    let png = state.qr().render_png(text)?;

    let disposition = format!("attachment; filename=\"{}\"", download_name(text));

    Ok((
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        png,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_name() {
        assert_eq!(download_name("K3F9QZ1B"), "qr-code-K3F9QZ1B.png");
        assert_eq!(download_name("a\"b/c"), "qr-code-abc.png");
        assert_eq!(download_name("\"\""), "qr-code.png");
    }
}
