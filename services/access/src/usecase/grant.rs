use chrono::{DateTime, Utc};
use tracing::info;

use keyhold_domain::id::{LockId, UserId};
use keyhold_domain::user::UserRole;
use keyhold_domain::window::TimeWindow;

use crate::domain::repository::{
    GrantRepository, LockRepository, PropertyRepository, UserRepository,
};
use crate::domain::types::{AccessGrant, NewGrant};
use crate::error::AccessServiceError;
use crate::usecase::access::ensure_lock_owner;
use crate::usecase::lock::list_owned_locks;

// ── CreateGrant ──────────────────────────────────────────────────────────────

pub struct CreateGrantInput {
    pub guest_id: UserId,
    pub lock_id: LockId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

pub struct CreateGrantUseCase<U, L, G>
where
    U: UserRepository,
    L: LockRepository,
    G: GrantRepository,
{
    pub users: U,
    pub locks: L,
    pub grants: G,
}

impl<U, L, G> CreateGrantUseCase<U, L, G>
where
    U: UserRepository,
    L: LockRepository,
    G: GrantRepository,
{
    pub async fn execute(
        &self,
        actor_id: UserId,
        input: CreateGrantInput,
    ) -> Result<AccessGrant, AccessServiceError> {
        let lock = ensure_lock_owner(&self.users, &self.locks, actor_id, input.lock_id).await?;

        let guest = self
            .users
            .find_by_id(input.guest_id)
            .await?
            .ok_or(AccessServiceError::UserNotFound)?;
        if guest.role() != Some(UserRole::Guest) {
            return Err(AccessServiceError::InvalidRole);
        }

        let window = TimeWindow::new(input.start, input.end)?;
        let grant = self
            .grants
            .create(&NewGrant {
                guest_id: guest.id,
                lock_id: lock.id,
                window,
            })
            .await?;
        info!(
            grant_id = %grant.id,
            lock_id = %lock.id,
            guest_id = %guest.id,
            "access granted"
        );
        Ok(grant)
    }
}

// ── ListGrants ───────────────────────────────────────────────────────────────

pub struct ListGuestGrantsUseCase<G: GrantRepository> {
    pub grants: G,
}

impl<G: GrantRepository> ListGuestGrantsUseCase<G> {
    pub async fn execute(&self, guest_id: UserId) -> Result<Vec<AccessGrant>, AccessServiceError> {
        self.grants.list_by_guest(guest_id).await
    }
}

pub struct ListLockGrantsUseCase<U, L, G>
where
    U: UserRepository,
    L: LockRepository,
    G: GrantRepository,
{
    pub users: U,
    pub locks: L,
    pub grants: G,
}

impl<U, L, G> ListLockGrantsUseCase<U, L, G>
where
    U: UserRepository,
    L: LockRepository,
    G: GrantRepository,
{
    pub async fn execute(
        &self,
        actor_id: UserId,
        lock_id: LockId,
    ) -> Result<Vec<AccessGrant>, AccessServiceError> {
        let lock = ensure_lock_owner(&self.users, &self.locks, actor_id, lock_id).await?;
        self.grants.list_by_lock(lock.id).await
    }
}

// ── ListOwnerGrants ──────────────────────────────────────────────────────────

pub struct ListOwnerGrantsUseCase<U, P, L, G>
where
    U: UserRepository,
    P: PropertyRepository,
    L: LockRepository,
    G: GrantRepository,
{
    pub users: U,
    pub properties: P,
    pub locks: L,
    pub grants: G,
}

impl<U, P, L, G> ListOwnerGrantsUseCase<U, P, L, G>
where
    U: UserRepository,
    P: PropertyRepository,
    L: LockRepository,
    G: GrantRepository,
{
    /// Grants on all of the owner's locks, grouped by lock.
    pub async fn execute(&self, actor_id: UserId) -> Result<Vec<AccessGrant>, AccessServiceError> {
        let locks = list_owned_locks(&self.users, &self.properties, &self.locks, actor_id).await?;
        let mut grants = Vec::new();
        for lock in locks {
            grants.extend(self.grants.list_by_lock(lock.id).await?);
        }
        Ok(grants)
    }
}
