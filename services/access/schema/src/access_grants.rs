use sea_orm::entity::prelude::*;

/// Permission for one guest to unlock one lock during `[starts_at, ends_at]`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "access_grants")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub guest_id: i64,
    pub lock_id: i64,
    pub starts_at: chrono::DateTime<chrono::Utc>,
    pub ends_at: chrono::DateTime<chrono::Utc>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::GuestId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    Guest,
    #[sea_orm(
        belongs_to = "super::locks::Entity",
        from = "Column::LockId",
        to = "super::locks::Column::Id",
        on_delete = "Cascade"
    )]
    Lock,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Guest.def()
    }
}

impl Related<super::locks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lock.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
