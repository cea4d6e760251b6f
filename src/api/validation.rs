use super::ApiError;
use super::types::{ChangePasswordRequest, ListCodesQuery};
use crate::config::CodesConfig;
use crate::constants::qr::MAX_TEXT_LENGTH;
use crate::models::code::{CodeFilter, CodeSort, CodeStatus};

pub fn validate_code_id(id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid code ID: {id}. ID must be a positive integer"
        )));
    }
    Ok(id)
}

pub fn validate_login(username: &str, password: &str) -> Result<(), ApiError> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(ApiError::validation(
            "Please enter your username and password",
        ));
    }
    Ok(())
}

pub fn validate_password_change(
    request: &ChangePasswordRequest,
    min_length: usize,
) -> Result<(), ApiError> {
    if request.old_password.is_empty()
        || request.new_password.is_empty()
        || request.confirm_password.is_empty()
    {
        return Err(ApiError::validation("Please fill in all password fields"));
    }

    if request.new_password != request.confirm_password {
        return Err(ApiError::validation(
            "New password and confirmation do not match",
        ));
    }

    if request.new_password.chars().count() < min_length {
        return Err(ApiError::validation(format!(
            "New password must be at least {min_length} characters"
        )));
    }

    Ok(())
}

/// Text for the QR endpoints. Any non-empty string up to the byte-mode cap.
pub fn validate_qr_text(text: &str) -> Result<&str, ApiError> {
    if text.is_empty() {
        return Err(ApiError::validation("Nothing to encode"));
    }
    if text.chars().count() > MAX_TEXT_LENGTH {
        return Err(ApiError::validation(format!(
            "QR text must be {MAX_TEXT_LENGTH} characters or less"
        )));
    }
    Ok(text)
}

fn lenient_positive(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(default)
}

/// Turns raw query strings into a listing filter.
///
/// Page and limit fall back to defaults on garbage; an unknown status or sort
/// is a client error.
pub fn parse_list_query(query: &ListCodesQuery, codes: &CodesConfig) -> Result<CodeFilter, ApiError> {
    let page = lenient_positive(query.page.as_deref(), 1);
    let page_size =
        lenient_positive(query.limit.as_deref(), codes.default_page_size).min(codes.max_page_size);

    let status = CodeStatus::parse_filter(query.status.as_deref().unwrap_or_default())
        .map_err(ApiError::validation)?;
    let sort = query
        .sort
        .as_deref()
        .unwrap_or_default()
        .parse::<CodeSort>()
        .map_err(ApiError::validation)?;
    let search = query.search.clone().filter(|s| !s.is_empty());

    let filter = CodeFilter {
        page,
        page_size,
        search,
        status,
        sort,
    };
    if filter.offset().is_none() {
        return Err(ApiError::validation(format!(
            "Page {page} is out of range for {page_size} codes per page"
        )));
    }

    Ok(filter)
}
