use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::{admin_users, prelude::*};
use crate::models::admin::{AdminUser, CredentialCheck};

pub struct AdminRepository {
    conn: DatabaseConnection,
}

impl AdminRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    async fn find_model(&self, username: &str) -> Result<Option<admin_users::Model>> {
        AdminUsers::find()
            .filter(admin_users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query admin by username")
    }

    /// Creates the admin only if no row with that username exists yet.
    /// Returns whether a row was inserted.
    pub async fn create_if_absent(
        &self,
        username: &str,
        password: &str,
        config: &SecurityConfig,
    ) -> Result<bool> {
        if self.find_model(username).await?.is_some() {
            return Ok(false);
        }

        let password = password.to_string();
        let config = config.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, &config))
            .await
            .context("Password hashing task panicked")??;

        let now = Utc::now();
        let active_model = admin_users::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(password_hash),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        active_model
            .insert(&self.conn)
            .await
            .context("Failed to insert admin user")?;

        Ok(true)
    }

    /// Verify password for a user
    /// Note: This uses `spawn_blocking` because Argon2 hashing is CPU-intensive
    /// and would block the async runtime if run directly.
    pub async fn check_credentials(&self, username: &str, password: &str) -> Result<CredentialCheck> {
        let Some(user) = self.find_model(username).await? else {
            return Ok(CredentialCheck::UnknownUser);
        };

        let password_hash = user.password_hash.clone();
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || verify_password(&password, &password_hash))
            .await
            .context("Password verification task panicked")??;

        if is_valid {
            Ok(CredentialCheck::Valid(user.into()))
        } else {
            Ok(CredentialCheck::WrongPassword)
        }
    }

    /// Re-hash and store a new password, bumping `updated_at`.
    pub async fn update_password(
        &self,
        username: &str,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<AdminUser> {
        let user = self
            .find_model(username)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Admin not found: {username}"))?;

        let password = new_password.to_string();
        let config = config.clone();
        let new_hash = task::spawn_blocking(move || hash_password(&password, &config))
            .await
            .context("Password hashing task panicked")??;

        let mut active: admin_users::ActiveModel = user.into();
        active.password_hash = Set(new_hash);
        active.updated_at = Set(Utc::now());
        let updated = active
            .update(&self.conn)
            .await
            .context("Failed to update admin password")?;

        Ok(updated.into())
    }
}

/// Hash a password using Argon2id with the configured cost parameters.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Checks `password` against a PHC hash string. Parameters are read from the hash.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
            ..SecurityConfig::default()
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("s3cret!", &fast_config()).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("s3cret!", &hash).unwrap());
        assert!(!verify_password("s3cret?", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same", &fast_config()).unwrap();
        let b = hash_password("same", &fast_config()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }
}
