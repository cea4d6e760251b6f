//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::SecurityConfig;
use crate::db::Store;
use crate::models::admin::{AdminUser, CredentialCheck};
use crate::services::auth_service::{AuthError, AuthService};

pub struct SeaOrmAuthService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn ensure_default_admin(
        &self,
        username: &str,
        password: &str,
    ) -> Result<bool, AuthError> {
        let created = self
            .store
            .create_admin_if_absent(username, password, &self.security)
            .await?;

        if created {
            info!(username, "Provisioned admin account");
        } else {
            debug!(username, "Admin account already exists");
        }

        Ok(created)
    }

    async fn verify(&self, username: &str, password: &str) -> Result<Option<AdminUser>, AuthError> {
        match self.store.check_admin_credentials(username, password).await? {
            CredentialCheck::Valid(user) => Ok(Some(user)),
            CredentialCheck::UnknownUser => {
                debug!(username, "Login attempt for unknown username");
                Ok(None)
            }
            CredentialCheck::WrongPassword => {
                debug!(username, "Login attempt with wrong password");
                Ok(None)
            }
        }
    }

    async fn login(&self, username: &str, password: &str) -> Result<AdminUser, AuthError> {
        self.verify(username, password)
            .await?
            .ok_or(AuthError::InvalidCredentials)
    }

    async fn change_password(
        &self,
        username: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        match self
            .store
            .check_admin_credentials(username, old_password)
            .await?
        {
            CredentialCheck::UnknownUser => return Err(AuthError::UserNotFound),
            CredentialCheck::WrongPassword => return Err(AuthError::WrongOldPassword),
            CredentialCheck::Valid(_) => {}
        }

        self.store
            .update_admin_password(username, new_password, &self.security)
            .await?;

        info!(username, "Password changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn service() -> SeaOrmAuthService {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let security = SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        };
        let service = SeaOrmAuthService::new(store, security);
        service
            .ensure_default_admin("admin", "initial-pass")
            .await
            .unwrap();
        service
    }

    #[tokio::test]
    async fn test_login() {
        let service = service().await;

        let user = service.login("admin", "initial-pass").await.unwrap();
        assert_eq!(user.username, "admin");

        assert!(matches!(
            service.login("admin", "nope").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            service.login("ghost", "initial-pass").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_change_password_requires_old_password() {
        let service = service().await;

        assert!(matches!(
            service
                .change_password("admin", "wrong-old", "brand-new")
                .await,
            Err(AuthError::WrongOldPassword)
        ));
        assert!(service.verify("admin", "initial-pass").await.unwrap().is_some());

        service
            .change_password("admin", "initial-pass", "brand-new")
            .await
            .unwrap();
        assert!(service.verify("admin", "brand-new").await.unwrap().is_some());
        assert!(service.verify("admin", "initial-pass").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_change_password_unknown_user() {
        let service = service().await;
        assert!(matches!(
            service.change_password("ghost", "x", "yyyyyy").await,
            Err(AuthError::UserNotFound)
        ));
    }
}
