use sea_orm::entity::prelude::*;

/// Append-only log of unlock decisions.
///
/// No foreign keys: a record must survive deletion of the user or lock it names,
/// and token redemptions may be anonymous (`user_id` is `None`).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "open_attempts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub occurred_at: chrono::DateTime<chrono::Utc>,
    pub success: bool,
    pub reason: String,
    pub user_id: Option<i64>,
    pub lock_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
