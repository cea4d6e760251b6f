//! Promotional code endpoints. Every handler here sits behind the session guard.

use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::extract::{ApiJson, ApiPath};
use super::observability::RedemptionContext;
use super::types::{CodeListDto, CodeStatsDto, Data, Empty, ListCodesQuery, ValidateCodeRequest};
use super::validation::{parse_list_query, validate_code_id};
use super::{ApiError, ApiResponse, AppState};
use crate::models::code::PromotionalCode;
use crate::services::code_service::normalize_code;
use crate::services::{CodeError, REDEEMED_MESSAGE};

/// POST /api/generate-code
pub async fn generate_code(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Data<PromotionalCode>>>, ApiError> {
    let code = state.code_service().generate_code().await?;

    Ok(Json(
        ApiResponse::success(Data { data: code })
            .with_message("Promotional code created successfully"),
    ))
}

/// POST /api/validate-code
///
/// Success means the code was redeemed by this request. The response carries
/// a [`RedemptionContext`] for the request log either way.
pub async fn validate_code(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<ValidateCodeRequest>,
) -> Response {
    let result = state
        .code_service()
        .validate_and_redeem(&payload.code)
        .await;

    let context = RedemptionContext {
        code: normalize_code(&payload.code).ok(),
        outcome: match &result {
            Ok(_) => "redeemed",
            Err(err) => err.reason(),
        },
    };

    let mut response = match result {
        Ok(code) => Json(ApiResponse::success(Data { data: code }).with_message(REDEEMED_MESSAGE))
            .into_response(),
        Err(err) => ApiError::from(err).into_response(),
    };
    response.extensions_mut().insert(context);
    response
}

/// GET /api/codes
pub async fn list_codes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListCodesQuery>,
) -> Result<Json<ApiResponse<Data<CodeListDto>>>, ApiError> {
    let filter = parse_list_query(&query, &state.config().codes)?;
    let (page, limit) = (filter.page, filter.page_size);

    let result = state.code_service().list_codes(filter).await?;

    Ok(Json(ApiResponse::success(Data {
        data: CodeListDto {
            codes: result.codes,
            total: result.total,
            page,
            limit,
            total_pages: result.total.div_ceil(limit),
        },
    })))
}

/// GET /api/codes/stats
pub async fn code_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Data<CodeStatsDto>>>, ApiError> {
    let stats = state.code_service().stats().await?;
    Ok(Json(ApiResponse::success(Data { data: stats.into() })))
}

/// GET /api/codes/lookup/{code}
///
/// Reads a code without redeeming it.
pub async fn lookup_code(
    State(state): State<Arc<AppState>>,
    ApiPath(code): ApiPath<String>,
) -> Result<Json<ApiResponse<Data<PromotionalCode>>>, ApiError> {
    let record = state
        .code_service()
        .lookup(&code)
        .await
        .map_err(|e| match e {
            CodeError::NotFound => ApiError::NotFound(e.to_string()),
            other => other.into(),
        })?;

    Ok(Json(ApiResponse::success(Data { data: record })))
}

/// DELETE /api/codes/{id}
pub async fn delete_code(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    let id = validate_code_id(id)?;

    if !state.code_service().delete_code(id).await? {
        return Err(ApiError::not_found("Promotional code", id));
    }

    Ok(Json(ApiResponse::message(
        "Promotional code deleted successfully",
    )))
}
