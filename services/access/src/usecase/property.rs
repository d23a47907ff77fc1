use keyhold_domain::id::{PropertyId, UserId};
use keyhold_domain::user::UserRole;

use crate::domain::repository::{PropertyRepository, UserRepository};
use crate::domain::types::{NewProperty, Property};
use crate::error::AccessServiceError;

/// Require `actor_id` to own `property_id`.
pub async fn ensure_property_owner<U, P>(
    users: &U,
    properties: &P,
    actor_id: UserId,
    property_id: PropertyId,
) -> Result<Property, AccessServiceError>
where
    U: UserRepository,
    P: PropertyRepository,
{
    let property = properties
        .find_by_id(property_id)
        .await?
        .ok_or(AccessServiceError::PropertyNotFound)?;
    let actor = users
        .find_by_id(actor_id)
        .await?
        .ok_or(AccessServiceError::UserNotFound)?;
    if actor.role() != Some(UserRole::Owner) || property.owner_id != actor.id {
        return Err(AccessServiceError::Forbidden);
    }
    Ok(property)
}

/// Require `actor_id` to resolve to an account with the Owner role.
pub async fn require_owner<U: UserRepository>(
    users: &U,
    actor_id: UserId,
) -> Result<(), AccessServiceError> {
    let actor = users
        .find_by_id(actor_id)
        .await?
        .ok_or(AccessServiceError::UserNotFound)?;
    match actor.role() {
        Some(UserRole::Owner) => Ok(()),
        _ => Err(AccessServiceError::Forbidden),
    }
}

// ── CreateProperty ───────────────────────────────────────────────────────────

pub struct CreatePropertyInput {
    pub name: String,
    pub address: String,
    pub image_ref: Option<String>,
}

pub struct CreatePropertyUseCase<U, P>
where
    U: UserRepository,
    P: PropertyRepository,
{
    pub users: U,
    pub properties: P,
}

impl<U, P> CreatePropertyUseCase<U, P>
where
    U: UserRepository,
    P: PropertyRepository,
{
    pub async fn execute(
        &self,
        actor_id: UserId,
        input: CreatePropertyInput,
    ) -> Result<Property, AccessServiceError> {
        require_owner(&self.users, actor_id).await?;
        self.properties
            .create(&NewProperty {
                owner_id: actor_id,
                name: input.name,
                address: input.address,
                image_ref: input.image_ref,
            })
            .await
    }
}

// ── ListProperties ───────────────────────────────────────────────────────────

pub struct ListPropertiesUseCase<U, P>
where
    U: UserRepository,
    P: PropertyRepository,
{
    pub users: U,
    pub properties: P,
}

impl<U, P> ListPropertiesUseCase<U, P>
where
    U: UserRepository,
    P: PropertyRepository,
{
    pub async fn execute(&self, actor_id: UserId) -> Result<Vec<Property>, AccessServiceError> {
        require_owner(&self.users, actor_id).await?;
        self.properties.list_by_owner(actor_id).await
    }
}
