use sea_orm::entity::prelude::*;

/// Account of an owner or a guest. `role` holds `UserRole::as_u8`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub phone: String,
    /// Opaque credential as supplied at registration.
    pub credential: String,
    pub role: i16,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::properties::Entity")]
    Properties,
    #[sea_orm(has_many = "super::access_grants::Entity")]
    AccessGrants,
}

impl Related<super::properties::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Properties.def()
    }
}

impl Related<super::access_grants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccessGrants.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
