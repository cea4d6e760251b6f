//! `SeaORM` implementation of the `CodeService` trait.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::CodesConfig;
use crate::db::Store;
use crate::models::code::{CodeFilter, CodePage, CodeStats, PromotionalCode, RedemptionOutcome};
use crate::services::code_service::{CodeError, CodeService, normalize_code};

pub struct SeaOrmCodeService {
    store: Store,
    config: CodesConfig,
}

impl SeaOrmCodeService {
    #[must_use]
    pub const fn new(store: Store, config: CodesConfig) -> Self {
        Self { store, config }
    }

    fn clamp_filter(&self, mut filter: CodeFilter) -> Result<CodeFilter, CodeError> {
        filter.page = filter.page.max(1);
        filter.page_size = match filter.page_size {
            0 => self.config.default_page_size,
            n => n.min(self.config.max_page_size),
        };
        filter.search = filter.search.filter(|s| !s.is_empty());

        if filter.offset().is_none() {
            return Err(CodeError::PageOutOfRange);
        }
        Ok(filter)
    }
}

fn count_rejection(err: CodeError) -> CodeError {
    metrics::counter!("promo_code_redemptions_rejected_total", "reason" => err.reason())
        .increment(1);
    err
}

#[async_trait]
impl CodeService for SeaOrmCodeService {
    async fn generate_code(&self) -> Result<PromotionalCode, CodeError> {
        let code = self
            .store
            .create_code(self.config.max_generation_attempts)
            .await?;

        metrics::counter!("promo_codes_generated_total").increment(1);
        Ok(code)
    }

    async fn validate_and_redeem(&self, raw_input: &str) -> Result<PromotionalCode, CodeError> {
        let code = normalize_code(raw_input)?;

        match self.store.redeem_code(&code).await? {
            RedemptionOutcome::Redeemed(record) => {
                info!(code = %record.code, "Promotional code redeemed");
                metrics::counter!("promo_codes_redeemed_total").increment(1);
                Ok(record)
            }
            RedemptionOutcome::AlreadyUsed(record) => {
                warn!(code = %record.code, used_at = ?record.used_at, "Rejected reuse of promotional code");
                Err(count_rejection(CodeError::AlreadyUsed(Box::new(record))))
            }
            RedemptionOutcome::NotFound => {
                info!(code = %code, "Redemption attempted for unknown code");
                Err(count_rejection(CodeError::NotFound))
            }
        }
    }

    async fn lookup(&self, raw_input: &str) -> Result<PromotionalCode, CodeError> {
        let code = normalize_code(raw_input)?;
        self.store
            .find_code(&code)
            .await?
            .ok_or(CodeError::NotFound)
    }

    async fn list_codes(&self, filter: CodeFilter) -> Result<CodePage, CodeError> {
        let filter = self.clamp_filter(filter)?;
        Ok(self.store.list_codes(&filter).await?)
    }

    async fn delete_code(&self, id: i32) -> Result<bool, CodeError> {
        Ok(self.store.delete_code(id).await?)
    }

    async fn stats(&self) -> Result<CodeStats, CodeError> {
        Ok(self.store.code_stats().await?)
    }
}
