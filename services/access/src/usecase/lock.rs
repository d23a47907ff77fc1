use chrono::{DateTime, Utc};
use tracing::{info, warn};

use keyhold_domain::id::{LockId, PropertyId, UserId};

use crate::domain::repository::{
    GrantRepository, LockRepository, OpenAttemptRepository, PropertyRepository, UserRepository,
};
use crate::domain::types::{Lock, NewOpenAttempt};
use crate::error::AccessServiceError;
use crate::usecase::access::check_access;
use crate::usecase::property::{ensure_property_owner, require_owner};

/// Every lock on every property `actor_id` owns, ordered by property then lock.
pub async fn list_owned_locks<U, P, L>(
    users: &U,
    properties: &P,
    locks: &L,
    actor_id: UserId,
) -> Result<Vec<Lock>, AccessServiceError>
where
    U: UserRepository,
    P: PropertyRepository,
    L: LockRepository,
{
    require_owner(users, actor_id).await?;
    let mut owned = Vec::new();
    for property in properties.list_by_owner(actor_id).await? {
        owned.extend(locks.list_by_property(property.id).await?);
    }
    Ok(owned)
}

// ── Unlock ───────────────────────────────────────────────────────────────────

pub struct UnlockUseCase<U, L, G, A>
where
    U: UserRepository,
    L: LockRepository,
    G: GrantRepository,
    A: OpenAttemptRepository,
{
    pub users: U,
    pub locks: L,
    pub grants: G,
    pub attempts: A,
}

impl<U, L, G, A> UnlockUseCase<U, L, G, A>
where
    U: UserRepository,
    L: LockRepository,
    G: GrantRepository,
    A: OpenAttemptRepository,
{
    pub async fn execute(
        &self,
        actor_id: UserId,
        lock_id: LockId,
        now: DateTime<Utc>,
    ) -> Result<Lock, AccessServiceError> {
        // 1. Lock must exist → 404, nothing recorded
        self.locks
            .find_by_id(lock_id)
            .await?
            .ok_or(AccessServiceError::LockNotFound)?;

        // 2. Ownership or an active grant → otherwise 403, attempt recorded
        let permitted =
            check_access(&self.users, &self.locks, &self.grants, actor_id, lock_id, now).await?;
        if !permitted {
            let denied = AccessServiceError::Forbidden;
            warn!(%lock_id, user_id = %actor_id, reason = %denied, "unlock denied");
            self.attempts
                .append(&NewOpenAttempt::denied(
                    Some(actor_id),
                    lock_id,
                    now,
                    denied.to_string(),
                ))
                .await?;
            return Err(denied);
        }

        // 3. State change and success record commit together
        let attempt = NewOpenAttempt::granted(Some(actor_id), lock_id, now);
        let lock = self.locks.unlock_with_attempt(lock_id, &attempt).await?;
        info!(%lock_id, user_id = %actor_id, "lock opened");
        Ok(lock)
    }
}

// ── Lock ─────────────────────────────────────────────────────────────────────

/// Re-locking is always permitted; no authorization check.
pub struct LockUseCase<L: LockRepository> {
    pub locks: L,
}

impl<L: LockRepository> LockUseCase<L> {
    pub async fn execute(&self, lock_id: LockId) -> Result<Lock, AccessServiceError> {
        self.locks
            .find_by_id(lock_id)
            .await?
            .ok_or(AccessServiceError::LockNotFound)?;
        let lock = self.locks.set_locked(lock_id, true).await?;
        info!(%lock_id, "lock closed");
        Ok(lock)
    }
}

// ── CreateLock ───────────────────────────────────────────────────────────────

pub struct CreateLockInput {
    pub property_id: PropertyId,
    pub model: String,
}

pub struct CreateLockUseCase<U, P, L>
where
    U: UserRepository,
    P: PropertyRepository,
    L: LockRepository,
{
    pub users: U,
    pub properties: P,
    pub locks: L,
}

impl<U, P, L> CreateLockUseCase<U, P, L>
where
    U: UserRepository,
    P: PropertyRepository,
    L: LockRepository,
{
    pub async fn execute(
        &self,
        actor_id: UserId,
        input: CreateLockInput,
    ) -> Result<Lock, AccessServiceError> {
        let property =
            ensure_property_owner(&self.users, &self.properties, actor_id, input.property_id)
                .await?;
        self.locks.create(property.id, &input.model).await
    }
}

// ── ListLocks ────────────────────────────────────────────────────────────────

pub struct ListLocksUseCase<U, P, L>
where
    U: UserRepository,
    P: PropertyRepository,
    L: LockRepository,
{
    pub users: U,
    pub properties: P,
    pub locks: L,
}

impl<U, P, L> ListLocksUseCase<U, P, L>
where
    U: UserRepository,
    P: PropertyRepository,
    L: LockRepository,
{
    pub async fn execute(
        &self,
        actor_id: UserId,
        property_id: PropertyId,
    ) -> Result<Vec<Lock>, AccessServiceError> {
        let property =
            ensure_property_owner(&self.users, &self.properties, actor_id, property_id).await?;
        self.locks.list_by_property(property.id).await
    }
}
