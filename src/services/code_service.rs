//! Domain service for the promotional code lifecycle.
//!
//! Generation, redemption, lookup, listing and deletion of codes. Input
//! normalisation happens here so the HTTP layer and the CLI agree on it.

use thiserror::Error;

use crate::constants::codes::CODE_LENGTH;
use crate::models::code::{CodeFilter, CodePage, CodeStats, PromotionalCode, is_well_formed};

pub const REDEEMED_MESSAGE: &str = "Promotional code is valid and has been applied";

/// Errors specific to code operations.
#[derive(Debug, Error)]
pub enum CodeError {
    #[error("Please enter a promotional code")]
    Empty,

    #[error("Promotional code must be exactly {} letters or digits", CODE_LENGTH)]
    InvalidFormat,

    #[error("Promotional code does not exist")]
    NotFound,

    #[error("Page number is too large")]
    PageOutOfRange,

    /// Carries the record as it was before this attempt.
    #[error("Promotional code has already been used")]
    AlreadyUsed(Box<PromotionalCode>),

    #[error("Database error: {0}")]
    Database(String),
}

impl CodeError {
    /// Short label for metrics and the request log.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::Empty | Self::InvalidFormat => "invalid_format",
            Self::NotFound => "not_found",
            Self::PageOutOfRange => "page_out_of_range",
            Self::AlreadyUsed(_) => "already_used",
            Self::Database(_) => "database_error",
        }
    }
}

impl From<anyhow::Error> for CodeError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(format!("{err:#}"))
    }
}

/// Trims and upper-cases operator input, then checks its shape.
pub fn normalize_code(raw_input: &str) -> Result<String, CodeError> {
    let trimmed = raw_input.trim();
    if trimmed.is_empty() {
        return Err(CodeError::Empty);
    }

    let code = trimmed.to_ascii_uppercase();
    if !is_well_formed(&code) {
        return Err(CodeError::InvalidFormat);
    }

    Ok(code)
}

/// Domain service trait for promotional codes.
#[async_trait::async_trait]
pub trait CodeService: Send + Sync {
    /// Creates and persists a fresh unused code.
    async fn generate_code(&self) -> Result<PromotionalCode, CodeError>;

    /// Normalises the input and redeems it at most once.
    ///
    /// # Errors
    ///
    /// Returns [`CodeError::Empty`] or [`CodeError::InvalidFormat`] before touching
    /// storage, [`CodeError::NotFound`] for unknown codes and
    /// [`CodeError::AlreadyUsed`] when an earlier redemption won.
    async fn validate_and_redeem(&self, raw_input: &str) -> Result<PromotionalCode, CodeError>;

    /// Reads a code without redeeming it.
    async fn lookup(&self, raw_input: &str) -> Result<PromotionalCode, CodeError>;

    async fn list_codes(&self, filter: CodeFilter) -> Result<CodePage, CodeError>;

    /// Returns `false` when no row had that id.
    async fn delete_code(&self, id: i32) -> Result<bool, CodeError>;

    async fn stats(&self) -> Result<CodeStats, CodeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("k3f9qz1b").unwrap(), "K3F9QZ1B");
        assert_eq!(normalize_code("  K3F9QZ1B \n").unwrap(), "K3F9QZ1B");
        assert!(matches!(normalize_code(""), Err(CodeError::Empty)));
        assert!(matches!(normalize_code("   "), Err(CodeError::Empty)));
        assert!(matches!(normalize_code("K3F9QZ1"), Err(CodeError::InvalidFormat)));
        assert!(matches!(normalize_code("K3F9QZ1BB"), Err(CodeError::InvalidFormat)));
        assert!(matches!(normalize_code("K3F9 Z1B"), Err(CodeError::InvalidFormat)));
    }
}
