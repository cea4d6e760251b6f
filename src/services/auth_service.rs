//! Domain service for administrator credentials.
//!
//! Handles provisioning, login checks and password changes. Sessions live in
//! the HTTP layer; this service only answers "who is this".

use thiserror::Error;

use crate::models::admin::AdminUser;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Current password is incorrect")]
    WrongOldPassword,

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(format!("{err:#}"))
    }
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates the admin if no account with that username exists.
    /// Returns whether an account was created.
    async fn ensure_default_admin(&self, username: &str, password: &str)
    -> Result<bool, AuthError>;

    /// Returns the admin when the password matches, `None` otherwise.
    async fn verify(&self, username: &str, password: &str) -> Result<Option<AdminUser>, AuthError>;

    /// Like [`AuthService::verify`], but a mismatch is an error.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for an unknown user and for a
    /// wrong password alike.
    async fn login(&self, username: &str, password: &str) -> Result<AdminUser, AuthError>;

    /// Changes a user's password.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::WrongOldPassword`] if `old_password` does not match.
    async fn change_password(
        &self,
        username: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;
}
