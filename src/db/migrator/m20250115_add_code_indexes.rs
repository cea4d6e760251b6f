use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Listing sorts by created_at and filters on is_used
        manager
            .create_index(
                Index::create()
                    .name("idx_promotional_codes_created_at")
                    .table(PromotionalCodes::Table)
                    .col(PromotionalCodes::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_promotional_codes_is_used")
                    .table(PromotionalCodes::Table)
                    .col(PromotionalCodes::IsUsed)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_promotional_codes_is_used")
                    .table(PromotionalCodes::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_promotional_codes_created_at")
                    .table(PromotionalCodes::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
enum PromotionalCodes {
    Table,
    CreatedAt,
    IsUsed,
}
