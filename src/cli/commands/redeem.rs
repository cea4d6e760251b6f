use anyhow::bail;

use crate::services::{CodeError, REDEEMED_MESSAGE};
use crate::state::SharedState;

/// Any rejected redemption is an error, so the process exits non-zero.
pub async fn cmd_redeem(state: &SharedState, raw_code: &str) -> anyhow::Result<()> {
    match state.code_service.validate_and_redeem(raw_code).await {
        Ok(code) => {
            println!("✓ {}: {REDEEMED_MESSAGE}", code.code);
            Ok(())
        }
        Err(CodeError::AlreadyUsed(record)) => {
            let used_at = record.used_at.map(|t| t.to_rfc3339()).unwrap_or_default();
            bail!(
                "{}: Promotional code has already been used (used {used_at})",
                record.code
            )
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    async fn state() -> SharedState {
        let mut config = Config::default();
        config.general.database_path = "sqlite::memory:".to_string();
        config.bootstrap.admin_password = Some("bootstrap-secret".to_string());
        config.security.argon2_memory_cost_kib = 1024;
        config.security.argon2_time_cost = 1;
        SharedState::new(config).await.unwrap()
    }

    #[tokio::test]
    async fn test_rejected_redemptions_fail_the_command() {
        let state = state().await;
        let code = state.code_service.generate_code().await.unwrap();

        assert!(cmd_redeem(&state, &code.code).await.is_ok());

        let err = cmd_redeem(&state, &code.code).await.unwrap_err();
        assert!(err.to_string().contains("already been used"), "{err}");

        let err = cmd_redeem(&state, "ZZZZZZZZ").await.unwrap_err();
        assert_eq!(err.to_string(), "Promotional code does not exist");

        assert!(cmd_redeem(&state, "short").await.is_err());
        assert_eq!(state.code_service.stats().await.unwrap().used, 1);
    }
}
