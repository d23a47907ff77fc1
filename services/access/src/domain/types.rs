use chrono::{DateTime, Utc};

use keyhold_domain::id::{AttemptId, GrantId, LockId, PropertyId, TokenId, UserId};
use keyhold_domain::user::UserRole;
use keyhold_domain::window::TimeWindow;

/// Registered account. `role` is the raw stored discriminator; see [`User::role`].
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Opaque credential as supplied at registration. Never rendered in responses.
    pub credential: String,
    pub role: u8,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// `None` when the stored discriminator is not a known role.
    pub fn role(&self) -> Option<UserRole> {
        UserRole::from_u8(self.role)
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub credential: String,
    pub role: UserRole,
}

#[derive(Debug, Clone)]
pub struct Property {
    pub id: PropertyId,
    pub owner_id: UserId,
    pub name: String,
    pub address: String,
    pub image_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProperty {
    pub owner_id: UserId,
    pub name: String,
    pub address: String,
    pub image_ref: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Lock {
    pub id: LockId,
    pub property_id: PropertyId,
    pub model: String,
    pub locked: bool,
    pub updated_at: DateTime<Utc>,
}

/// Permission for `guest_id` to unlock `lock_id` while `window` contains the instant.
#[derive(Debug, Clone)]
pub struct AccessGrant {
    pub id: GrantId,
    pub guest_id: UserId,
    pub lock_id: LockId,
    pub window: TimeWindow,
    pub created_at: DateTime<Utc>,
}

impl AccessGrant {
    pub fn permits(&self, lock_id: LockId, now: DateTime<Utc>) -> bool {
        self.lock_id == lock_id && self.window.contains(now)
    }
}

#[derive(Debug, Clone)]
pub struct NewGrant {
    pub guest_id: UserId,
    pub lock_id: LockId,
    pub window: TimeWindow,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub id: TokenId,
    pub code: String,
    pub lock_id: LockId,
    pub window: TimeWindow,
    pub single_use: bool,
    pub uses: u32,
    pub max_uses: u32,
    pub created_at: DateTime<Utc>,
}

impl Token {
    pub fn is_exhausted(&self) -> bool {
        if self.single_use {
            return self.uses >= 1;
        }
        self.uses >= self.max_uses
    }

    /// Inside the window (inclusive) and with uses left.
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.window.contains(now) && !self.is_exhausted()
    }
}

#[derive(Debug, Clone)]
pub struct NewToken {
    pub code: String,
    pub lock_id: LockId,
    pub window: TimeWindow,
    pub single_use: bool,
    pub max_uses: u32,
}

/// Immutable log entry for one unlock decision.
#[derive(Debug, Clone)]
pub struct OpenAttempt {
    pub id: AttemptId,
    pub occurred_at: DateTime<Utc>,
    pub success: bool,
    pub reason: String,
    pub user_id: Option<UserId>,
    pub lock_id: LockId,
}

#[derive(Debug, Clone)]
pub struct NewOpenAttempt {
    pub occurred_at: DateTime<Utc>,
    pub success: bool,
    pub reason: String,
    pub user_id: Option<UserId>,
    pub lock_id: LockId,
}

impl NewOpenAttempt {
    pub fn granted(user_id: Option<UserId>, lock_id: LockId, now: DateTime<Utc>) -> Self {
        Self {
            occurred_at: now,
            success: true,
            reason: ATTEMPT_GRANTED.to_owned(),
            user_id,
            lock_id,
        }
    }

    pub fn denied(
        user_id: Option<UserId>,
        lock_id: LockId,
        now: DateTime<Utc>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            occurred_at: now,
            success: false,
            reason: reason.into(),
            user_id,
            lock_id,
        }
    }
}

/// Reason recorded for a successful unlock.
pub const ATTEMPT_GRANTED: &str = "access granted";

/// Token code length in characters.
pub const TOKEN_CODE_LEN: usize = 8;

/// Usage cap for multi-use tokens.
pub const MULTI_USE_MAX_USES: u32 = 9999;

/// Attempts at drawing an unused token code before giving up.
pub const TOKEN_CODE_MAX_ATTEMPTS: usize = 10;
