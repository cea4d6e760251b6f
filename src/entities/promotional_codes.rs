use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "promotional_codes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// 8 characters from `[A-Z0-9]`
    #[sea_orm(unique)]
    pub code: String,

    pub created_at: DateTimeUtc,

    pub is_used: bool,

    /// Set together with `is_used`, never cleared.
    pub used_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
