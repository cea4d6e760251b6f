use anyhow::{Context, Result, ensure};
use chrono::Utc;
use sea_orm::sea_query::{Alias, Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};
use tracing::{debug, info, warn};

use crate::entities::{prelude::*, promotional_codes};
use crate::models::code::{
    CodeFilter, CodePage, CodeSort, CodeStats, CodeStatus, PromotionalCode, RedemptionOutcome,
};

/// Repository for promotional code rows
pub struct CodeRepository {
    conn: DatabaseConnection,
}

impl CodeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Inserts a new unused code drawn from `next_code`.
    ///
    /// A draw that hits the unique constraint is discarded and a fresh one
    /// taken, up to `max_attempts` draws in total.
    pub async fn create_with<F>(&self, mut next_code: F, max_attempts: u32) -> Result<PromotionalCode>
    where
        F: FnMut() -> String,
    {
        for attempt in 1..=max_attempts {
            let code = next_code();

            let active_model = promotional_codes::ActiveModel {
                code: Set(code.clone()),
                created_at: Set(Utc::now()),
                is_used: Set(false),
                used_at: Set(None),
                ..Default::default()
            };

            match active_model.insert(&self.conn).await {
                Ok(model) => {
                    info!(code = %model.code, id = model.id, "Created promotional code");
                    return Ok(model.into());
                }
                Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                    warn!(attempt, "Generated code collided with an existing one, redrawing");
                }
                Err(err) => {
                    return Err(err).context("Failed to insert promotional code");
                }
            }
        }

        anyhow::bail!("Could not generate a unique code after {max_attempts} attempts")
    }

    pub async fn find_by_code(&self, code: &str) -> Result<Option<PromotionalCode>> {
        let row = PromotionalCodes::find()
            .filter(promotional_codes::Column::Code.eq(code))
            .one(&self.conn)
            .await
            .context("Failed to query promotional code")?;

        Ok(row.map(PromotionalCode::from))
    }

    /// Marks the code used with a single conditional update.
    ///
    /// Only the caller whose update flips `is_used` sees `Redeemed`; every
    /// other caller reads the row afterwards and gets `AlreadyUsed`.
    pub async fn redeem(&self, code: &str) -> Result<RedemptionOutcome> {
        let now = Utc::now();

        let result = PromotionalCodes::update_many()
            .col_expr(promotional_codes::Column::IsUsed, Expr::value(true))
            .col_expr(promotional_codes::Column::UsedAt, Expr::value(Some(now)))
            .filter(promotional_codes::Column::Code.eq(code))
            .filter(promotional_codes::Column::IsUsed.eq(false))
            .exec(&self.conn)
            .await
            .context("Failed to redeem promotional code")?;

        let current = self.find_by_code(code).await?;

        let outcome = match (result.rows_affected, current) {
            (_, None) => RedemptionOutcome::NotFound,
            (0, Some(row)) => RedemptionOutcome::AlreadyUsed(row),
            (_, Some(row)) => RedemptionOutcome::Redeemed(row),
        };

        debug!(code, rows_affected = result.rows_affected, "Redemption attempt finished");
        Ok(outcome)
    }

    pub async fn list(&self, filter: &CodeFilter) -> Result<CodePage> {
        let mut query = PromotionalCodes::find();

        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            // instr() keeps the match case-sensitive and treats % and _ literally
            query = query.filter(
                Expr::expr(
                    Func::cust(Alias::new("instr"))
                        .arg(Expr::col(promotional_codes::Column::Code))
                        .arg(search.to_string()),
                )
                .gt(0),
            );
        }

        if let Some(status) = filter.status {
            query = query.filter(promotional_codes::Column::IsUsed.eq(status == CodeStatus::Used));
        }

        query = match filter.sort {
            CodeSort::CreatedAsc => query
                .order_by_asc(promotional_codes::Column::CreatedAt)
                .order_by_asc(promotional_codes::Column::Id),
            CodeSort::CreatedDesc => query
                .order_by_desc(promotional_codes::Column::CreatedAt)
                .order_by_desc(promotional_codes::Column::Id),
            CodeSort::CodeAsc => query.order_by_asc(promotional_codes::Column::Code),
            CodeSort::CodeDesc => query.order_by_desc(promotional_codes::Column::Code),
        };

        let page_size = filter.page_size.max(1);
        let page_index = filter.page.saturating_sub(1);
        ensure!(
            page_index
                .checked_mul(page_size)
                .is_some_and(|offset| i64::try_from(offset).is_ok()),
            "Page {} is out of range",
            filter.page
        );

        let paginator = query.paginate(&self.conn, page_size);
        let total = paginator
            .num_items()
            .await
            .context("Failed to count promotional codes")?;
        let rows = paginator
            .fetch_page(page_index)
            .await
            .context("Failed to list promotional codes")?;

        Ok(CodePage {
            codes: rows.into_iter().map(PromotionalCode::from).collect(),
            total,
        })
    }

    pub async fn delete_by_id(&self, id: i32) -> Result<bool> {
        let result = PromotionalCodes::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete promotional code")?;

        if result.rows_affected > 0 {
            info!(id, "Deleted promotional code");
        }

        Ok(result.rows_affected > 0)
    }

    pub async fn stats(&self) -> Result<CodeStats> {
        let total = PromotionalCodes::find()
            .count(&self.conn)
            .await
            .context("Failed to count promotional codes")?;

        let used = PromotionalCodes::find()
            .filter(promotional_codes::Column::IsUsed.eq(true))
            .count(&self.conn)
            .await
            .context("Failed to count used promotional codes")?;

        Ok(CodeStats {
            total,
            used,
            unused: total.saturating_sub(used),
        })
    }
}
