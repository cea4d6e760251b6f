use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::models::admin::{AdminUser, CredentialCheck};
use crate::models::code::{CodeFilter, CodePage, CodeStats, PromotionalCode, RedemptionOutcome};

pub mod migrator;
pub mod repositories;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");

        if !in_memory {
            let path_str = db_url
                .trim_start_matches("sqlite://")
                .trim_start_matches("sqlite:")
                .split('?')
                .next()
                .unwrap_or_default();
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        // Every pooled connection would otherwise open its own empty in-memory database
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);
        if !in_memory {
            opt.idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600));
        }

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    pub async fn close(self) -> Result<()> {
        self.conn.close().await?;
        Ok(())
    }

    fn code_repo(&self) -> repositories::code::CodeRepository {
        repositories::code::CodeRepository::new(self.conn.clone())
    }

    fn admin_repo(&self) -> repositories::admin::AdminRepository {
        repositories::admin::AdminRepository::new(self.conn.clone())
    }

    pub async fn create_code(&self, max_attempts: u32) -> Result<PromotionalCode> {
        self.code_repo()
            .create_with(crate::models::code::generate_code, max_attempts)
            .await
    }

    pub async fn create_code_with<F>(&self, next_code: F, max_attempts: u32) -> Result<PromotionalCode>
    where
        F: FnMut() -> String,
    {
        self.code_repo().create_with(next_code, max_attempts).await
    }

    pub async fn find_code(&self, code: &str) -> Result<Option<PromotionalCode>> {
        self.code_repo().find_by_code(code).await
    }

    pub async fn redeem_code(&self, code: &str) -> Result<RedemptionOutcome> {
        self.code_repo().redeem(code).await
    }

    pub async fn list_codes(&self, filter: &CodeFilter) -> Result<CodePage> {
        self.code_repo().list(filter).await
    }

    pub async fn delete_code(&self, id: i32) -> Result<bool> {
        self.code_repo().delete_by_id(id).await
    }

    pub async fn code_stats(&self) -> Result<CodeStats> {
        self.code_repo().stats().await
    }

    pub async fn create_admin_if_absent(
        &self,
        username: &str,
        password: &str,
        config: &SecurityConfig,
    ) -> Result<bool> {
        self.admin_repo()
            .create_if_absent(username, password, config)
            .await
    }

    pub async fn check_admin_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<CredentialCheck> {
        self.admin_repo().check_credentials(username, password).await
    }

    pub async fn update_admin_password(
        &self,
        username: &str,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<AdminUser> {
        self.admin_repo()
            .update_password(username, new_password, config)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::code::{CodeSort, CodeStatus};

    async fn test_store() -> Store {
        Store::new("sqlite::memory:").await.unwrap()
    }

    fn fast_security() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        }
    }

    fn fixed_codes(codes: &[&str]) -> impl FnMut() -> String {
        let mut codes: Vec<String> = codes.iter().rev().map(ToString::to_string).collect();
        move || codes.pop().unwrap_or_else(|| "ZZZZZZZZ".to_string())
    }

    #[tokio::test]
    async fn test_create_code_starts_unused() {
        let store = test_store().await;
        let code = store.create_code(5).await.unwrap();

        assert_eq!(code.code.len(), 8);
        assert!(!code.is_used);
        assert!(code.used_at.is_none());

        let found = store.find_code(&code.code).await.unwrap().unwrap();
        assert_eq!(found, code);
    }

    #[tokio::test]
    async fn test_collision_is_redrawn() {
        let store = test_store().await;
        store
            .create_code_with(fixed_codes(&["AAAAAAAA"]), 1)
            .await
            .unwrap();

        let code = store
            .create_code_with(fixed_codes(&["AAAAAAAA", "BBBBBBBB"]), 5)
            .await
            .unwrap();
        assert_eq!(code.code, "BBBBBBBB");
    }

    #[tokio::test]
    async fn test_collision_gives_up_after_max_attempts() {
        let store = test_store().await;
        store
            .create_code_with(fixed_codes(&["AAAAAAAA"]), 1)
            .await
            .unwrap();

        let result = store
            .create_code_with(fixed_codes(&["AAAAAAAA", "AAAAAAAA"]), 2)
            .await;
        assert!(result.is_err());
        assert_eq!(store.code_stats().await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_redeem_twice() {
        let store = test_store().await;
        let code = store.create_code(5).await.unwrap();

        let first = store.redeem_code(&code.code).await.unwrap();
        let RedemptionOutcome::Redeemed(redeemed) = first else {
            panic!("expected Redeemed, got {first:?}");
        };
        assert!(redeemed.is_used);
        let used_at = redeemed.used_at.expect("used_at set on redemption");

        let second = store.redeem_code(&code.code).await.unwrap();
        let RedemptionOutcome::AlreadyUsed(again) = second else {
            panic!("expected AlreadyUsed, got {second:?}");
        };
        assert_eq!(again.used_at, Some(used_at));
    }

    #[tokio::test]
    async fn test_redeem_unknown_code_does_not_mutate() {
        let store = test_store().await;
        store.create_code(5).await.unwrap();
        let before = store.code_stats().await.unwrap();

        let outcome = store.redeem_code("NOPE0000").await.unwrap();
        assert_eq!(outcome, RedemptionOutcome::NotFound);
        assert_eq!(store.code_stats().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_list_filters_and_pagination() {
        let store = test_store().await;
        for code in ["ABCD1234", "XXAB0000", "QQQQ1111", "ZZZZ2222", "AB999999"] {
            store.create_code_with(fixed_codes(&[code]), 1).await.unwrap();
        }
        store.redeem_code("ABCD1234").await.unwrap();
        store.redeem_code("QQQQ1111").await.unwrap();

        let used = store
            .list_codes(&CodeFilter {
                status: Some(CodeStatus::Used),
                ..CodeFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(used.total, 2);
        assert!(used.codes.iter().all(|c| c.is_used));

        let used_ab = store
            .list_codes(&CodeFilter {
                status: Some(CodeStatus::Used),
                search: Some("AB".to_string()),
                ..CodeFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(used_ab.total, 1);
        assert_eq!(used_ab.codes[0].code, "ABCD1234");

        let lowercase = store
            .list_codes(&CodeFilter {
                search: Some("ab".to_string()),
                ..CodeFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(lowercase.total, 0);

        let page_two = store
            .list_codes(&CodeFilter {
                page: 2,
                page_size: 2,
                sort: CodeSort::CodeAsc,
                ..CodeFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(page_two.total, 5);
        let codes: Vec<&str> = page_two.codes.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["QQQQ1111", "XXAB0000"]);
    }

    #[tokio::test]
    async fn test_list_created_order() {
        let store = test_store().await;
        for code in ["CCCCCCCC", "AAAAAAAA", "BBBBBBBB"] {
            store.create_code_with(fixed_codes(&[code]), 1).await.unwrap();
        }

        let newest_first = store.list_codes(&CodeFilter::default()).await.unwrap();
        let codes: Vec<&str> = newest_first.codes.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["BBBBBBBB", "AAAAAAAA", "CCCCCCCC"]);

        let oldest_first = store
            .list_codes(&CodeFilter {
                sort: CodeSort::CreatedAsc,
                ..CodeFilter::default()
            })
            .await
            .unwrap();
        let codes: Vec<&str> = oldest_first.codes.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["CCCCCCCC", "AAAAAAAA", "BBBBBBBB"]);
    }

    #[tokio::test]
    async fn test_delete_by_id() {
        let store = test_store().await;
        let code = store.create_code(5).await.unwrap();

        assert!(!store.delete_code(code.id + 100).await.unwrap());
        assert!(store.delete_code(code.id).await.unwrap());
        assert!(!store.delete_code(code.id).await.unwrap());

        let page = store.list_codes(&CodeFilter::default()).await.unwrap();
        assert_eq!(page.total, 0);
        assert!(page.codes.is_empty());
    }

    #[tokio::test]
    async fn test_admin_provisioning_is_idempotent() {
        let store = test_store().await;
        let security = fast_security();

        assert!(
            store
                .create_admin_if_absent("admin", "first-pass", &security)
                .await
                .unwrap()
        );
        assert!(
            !store
                .create_admin_if_absent("admin", "second-pass", &security)
                .await
                .unwrap()
        );

        let check = store
            .check_admin_credentials("admin", "first-pass")
            .await
            .unwrap();
        assert!(matches!(check, CredentialCheck::Valid(ref user) if user.username == "admin"));

        assert_eq!(
            store
                .check_admin_credentials("admin", "second-pass")
                .await
                .unwrap(),
            CredentialCheck::WrongPassword
        );
        assert_eq!(
            store
                .check_admin_credentials("nobody", "first-pass")
                .await
                .unwrap(),
            CredentialCheck::UnknownUser
        );
    }

    #[tokio::test]
    async fn test_update_admin_password() {
        let store = test_store().await;
        let security = fast_security();
        store
            .create_admin_if_absent("admin", "old-pass", &security)
            .await
            .unwrap();
        let CredentialCheck::Valid(before) = store
            .check_admin_credentials("admin", "old-pass")
            .await
            .unwrap()
        else {
            panic!("bootstrap credentials should verify");
        };

        let after = store
            .update_admin_password("admin", "new-pass", &security)
            .await
            .unwrap();
        assert!(after.updated_at >= before.updated_at);

        assert_eq!(
            store
                .check_admin_credentials("admin", "old-pass")
                .await
                .unwrap(),
            CredentialCheck::WrongPassword
        );
        assert!(matches!(
            store
                .check_admin_credentials("admin", "new-pass")
                .await
                .unwrap(),
            CredentialCheck::Valid(_)
        ));
    }
}
