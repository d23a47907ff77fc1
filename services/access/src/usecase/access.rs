use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use keyhold_domain::id::{LockId, UserId};
use keyhold_domain::user::UserRole;

use crate::domain::repository::{
    GrantRepository, LockRepository, PropertyRepository, UserRepository,
};
use crate::domain::types::{Lock, Property};
use crate::error::AccessServiceError;

/// Decide whether `actor_id` may unlock `lock_id` at `now`.
///
/// Fails closed: an unknown actor, unknown lock or unknown role yields `false`.
/// Only store failures surface as errors.
pub async fn check_access<U, L, G>(
    users: &U,
    locks: &L,
    grants: &G,
    actor_id: UserId,
    lock_id: LockId,
    now: DateTime<Utc>,
) -> Result<bool, AccessServiceError>
where
    U: UserRepository,
    L: LockRepository,
    G: GrantRepository,
{
    if locks.find_by_id(lock_id).await?.is_none() {
        return Ok(false);
    }
    let Some(actor) = users.find_by_id(actor_id).await? else {
        return Ok(false);
    };

    match actor.role() {
        Some(UserRole::Owner) => {
            let owner_id = locks.find_property_owner_id(lock_id).await?;
            Ok(owner_id == Some(actor.id))
        }
        Some(UserRole::Guest) => {
            let active = grants.find_active_for_guest(actor.id, now).await?;
            Ok(active.iter().any(|grant| grant.permits(lock_id, now)))
        }
        None => Ok(false),
    }
}

/// Require `actor_id` to be the owner of the property `lock_id` belongs to.
pub async fn ensure_lock_owner<U, L>(
    users: &U,
    locks: &L,
    actor_id: UserId,
    lock_id: LockId,
) -> Result<Lock, AccessServiceError>
where
    U: UserRepository,
    L: LockRepository,
{
    let lock = locks
        .find_by_id(lock_id)
        .await?
        .ok_or(AccessServiceError::LockNotFound)?;
    let actor = users
        .find_by_id(actor_id)
        .await?
        .ok_or(AccessServiceError::UserNotFound)?;
    if actor.role() != Some(UserRole::Owner) {
        return Err(AccessServiceError::Forbidden);
    }
    if locks.find_property_owner_id(lock_id).await? != Some(actor.id) {
        return Err(AccessServiceError::Forbidden);
    }
    Ok(lock)
}

// ── CheckAccess ──────────────────────────────────────────────────────────────

pub struct CheckAccessUseCase<U, L, G>
where
    U: UserRepository,
    L: LockRepository,
    G: GrantRepository,
{
    pub users: U,
    pub locks: L,
    pub grants: G,
}

impl<U, L, G> CheckAccessUseCase<U, L, G>
where
    U: UserRepository,
    L: LockRepository,
    G: GrantRepository,
{
    pub async fn execute(
        &self,
        actor_id: UserId,
        lock_id: LockId,
        now: DateTime<Utc>,
    ) -> Result<bool, AccessServiceError> {
        check_access(&self.users, &self.locks, &self.grants, actor_id, lock_id, now).await
    }
}

// ── GetLockInfo ──────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct LockInfo {
    pub lock: Lock,
    pub property: Option<Property>,
    pub owner_name: Option<String>,
    /// `None` for anonymous callers.
    pub has_access: Option<bool>,
}

pub struct GetLockInfoUseCase<U, P, L, G>
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

impl<U, P, L, G> GetLockInfoUseCase<U, P, L, G>
where
    U: UserRepository,
    P: PropertyRepository,
    L: LockRepository,
    G: GrantRepository,
{
    pub async fn execute(
        &self,
        lock_id: LockId,
        actor_id: Option<UserId>,
        now: DateTime<Utc>,
    ) -> Result<LockInfo, AccessServiceError> {
        let lock = self
            .locks
            .find_by_id(lock_id)
            .await?
            .ok_or(AccessServiceError::LockNotFound)?;

        let property = self.properties.find_by_id(lock.property_id).await?;
        let owner_name = match &property {
            Some(p) => self.users.find_by_id(p.owner_id).await?.map(|u| u.name),
            None => None,
        };

        let has_access = match actor_id {
            Some(actor) => Some(
                check_access(&self.users, &self.locks, &self.grants, actor, lock_id, now).await?,
            ),
            None => None,
        };

        Ok(LockInfo {
            lock,
            property,
            owner_name,
            has_access,
        })
    }
}

// ── ListAccessibleLocks ──────────────────────────────────────────────────────

pub struct ListAccessibleLocksUseCase<U, L, G>
where
    U: UserRepository,
    L: LockRepository,
    G: GrantRepository,
{
    pub users: U,
    pub locks: L,
    pub grants: G,
}

impl<U, L, G> ListAccessibleLocksUseCase<U, L, G>
where
    U: UserRepository,
    L: LockRepository,
    G: GrantRepository,
{
    /// Distinct locks the guest may open at `now`, ordered by id.
    pub async fn execute(
        &self,
        guest_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Lock>, AccessServiceError> {
        let guest = self
            .users
            .find_by_id(guest_id)
            .await?
            .ok_or(AccessServiceError::UserNotFound)?;
        if guest.role() != Some(UserRole::Guest) {
            return Ok(vec![]);
        }

        let lock_ids: BTreeSet<LockId> = self
            .grants
            .find_active_for_guest(guest.id, now)
            .await?
            .into_iter()
            .filter(|grant| grant.window.contains(now))
            .map(|grant| grant.lock_id)
            .collect();

        let mut locks = Vec::with_capacity(lock_ids.len());
        for lock_id in lock_ids {
            if let Some(lock) = self.locks.find_by_id(lock_id).await? {
                locks.push(lock);
            }
        }
        Ok(locks)
    }
}
