//! One-time provisioning of the administrator account at startup.

use rand::Rng;
use rand::distr::Alphanumeric;
use tracing::warn;

use crate::config::BootstrapConfig;
use crate::services::auth_service::{AuthError, AuthService};

const GENERATED_PASSWORD_LENGTH: usize = 16;

fn random_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

/// Creates the bootstrap admin if it does not exist yet.
///
/// Uses the configured password when there is one. Otherwise a random
/// password is generated and logged once, since it cannot be recovered later.
pub async fn provision_admin(
    auth: &dyn AuthService,
    bootstrap: &BootstrapConfig,
) -> Result<bool, AuthError> {
    let (password, generated) = match bootstrap.configured_password() {
        Some(password) => (password, false),
        None => (random_password(), true),
    };

    let created = auth
        .ensure_default_admin(&bootstrap.admin_username, &password)
        .await?;

    if created && generated {
        warn!(
            username = %bootstrap.admin_username,
            password = %password,
            "Generated initial admin password. Change it after the first login"
        );
    }

    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SecurityConfig;
    use crate::db::Store;
    use crate::services::auth_service_impl::SeaOrmAuthService;

    fn fast_security() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        }
    }

    #[test]
    fn test_random_password_shape() {
        let password = random_password();
        assert_eq!(password.len(), GENERATED_PASSWORD_LENGTH);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(password, random_password());
    }

    #[tokio::test]
    async fn test_provision_is_idempotent() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let auth = SeaOrmAuthService::new(store, fast_security());
        let bootstrap = BootstrapConfig {
            admin_username: "operator".to_string(),
            admin_password: Some("first-pass".to_string()),
        };

        assert!(provision_admin(&auth, &bootstrap).await.unwrap());
        assert!(auth.login("operator", "first-pass").await.is_ok());

        let changed = BootstrapConfig {
            admin_password: Some("second-pass".to_string()),
            ..bootstrap
        };
        assert!(!provision_admin(&auth, &changed).await.unwrap());
        assert!(auth.login("operator", "first-pass").await.is_ok());
        assert!(auth.login("operator", "second-pass").await.is_err());
    }
}
