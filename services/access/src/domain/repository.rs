#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};

use keyhold_domain::id::{LockId, PropertyId, TokenId, UserId};

use crate::domain::types::{
    AccessGrant, Lock, NewGrant, NewOpenAttempt, NewProperty, NewToken, NewUser, OpenAttempt,
    Property, Token, User,
};
use crate::error::AccessServiceError;

/// Repository for owner and guest accounts.
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, AccessServiceError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AccessServiceError>;
    async fn create(&self, user: &NewUser) -> Result<User, AccessServiceError>;
}

/// Repository for properties.
pub trait PropertyRepository: Send + Sync {
    async fn find_by_id(&self, id: PropertyId) -> Result<Option<Property>, AccessServiceError>;
    async fn list_by_owner(&self, owner_id: UserId) -> Result<Vec<Property>, AccessServiceError>;
    async fn create(&self, property: &NewProperty) -> Result<Property, AccessServiceError>;
}

/// Repository for locks and their `locked` state.
pub trait LockRepository: Send + Sync {
    async fn find_by_id(&self, id: LockId) -> Result<Option<Lock>, AccessServiceError>;

    /// Owner of the property the lock belongs to.
    async fn find_property_owner_id(
        &self,
        lock_id: LockId,
    ) -> Result<Option<UserId>, AccessServiceError>;

    async fn list_by_property(
        &self,
        property_id: PropertyId,
    ) -> Result<Vec<Lock>, AccessServiceError>;

    /// Insert a new lock in the locked state.
    async fn create(&self, property_id: PropertyId, model: &str)
    -> Result<Lock, AccessServiceError>;

    /// Overwrite the `locked` flag (last write wins).
    async fn set_locked(&self, id: LockId, locked: bool) -> Result<Lock, AccessServiceError>;

    /// Set `locked = false` and append the attempt record in one transaction.
    async fn unlock_with_attempt(
        &self,
        id: LockId,
        attempt: &NewOpenAttempt,
    ) -> Result<Lock, AccessServiceError>;
}

/// Repository for time-windowed access grants.
pub trait GrantRepository: Send + Sync {
    /// Grants of `guest_id` whose window contains `instant` (inclusive bounds).
    async fn find_active_for_guest(
        &self,
        guest_id: UserId,
        instant: DateTime<Utc>,
    ) -> Result<Vec<AccessGrant>, AccessServiceError>;

    async fn list_by_guest(&self, guest_id: UserId) -> Result<Vec<AccessGrant>, AccessServiceError>;
    async fn list_by_lock(&self, lock_id: LockId) -> Result<Vec<AccessGrant>, AccessServiceError>;
    async fn create(&self, grant: &NewGrant) -> Result<AccessGrant, AccessServiceError>;
}

/// Repository for access tokens.
pub trait TokenRepository: Send + Sync {
    async fn find_by_code(&self, code: &str) -> Result<Option<Token>, AccessServiceError>;
    async fn list_by_lock(&self, lock_id: LockId) -> Result<Vec<Token>, AccessServiceError>;

    /// Insert a token. Returns `None` if another token already holds the code.
    async fn create(&self, token: &NewToken) -> Result<Option<Token>, AccessServiceError>;

    /// In one transaction: increment `uses` only if it still equals `expected_uses`,
    /// unlock the token's lock and append `attempt`.
    ///
    /// Returns `None` without writing anything when the conditional increment
    /// matched no row (a concurrent redemption got there first).
    async fn consume_and_unlock(
        &self,
        id: TokenId,
        expected_uses: u32,
        attempt: &NewOpenAttempt,
    ) -> Result<Option<Token>, AccessServiceError>;

    /// Delete tokens whose window ended before `now`. Returns the number removed.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AccessServiceError>;
}

/// Append-only log of unlock decisions.
pub trait OpenAttemptRepository: Send + Sync {
    async fn append(&self, attempt: &NewOpenAttempt) -> Result<OpenAttempt, AccessServiceError>;

    /// Records for a lock, newest first.
    async fn list_by_lock(&self, lock_id: LockId) -> Result<Vec<OpenAttempt>, AccessServiceError>;
}
