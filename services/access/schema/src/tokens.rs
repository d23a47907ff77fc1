use sea_orm::entity::prelude::*;

/// Shareable access code for one lock with a validity window and a usage cap.
/// `uses` only ever moves through a conditional `uses = uses + 1` update.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tokens")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub code: String,
    pub lock_id: i64,
    pub starts_at: chrono::DateTime<chrono::Utc>,
    pub ends_at: chrono::DateTime<chrono::Utc>,
    pub single_use: bool,
    pub uses: i32,
    pub max_uses: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::locks::Entity",
        from = "Column::LockId",
        to = "super::locks::Column::Id",
        on_delete = "Cascade"
    )]
    Lock,
}

impl Related<super::locks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lock.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
