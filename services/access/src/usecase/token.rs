use chrono::{DateTime, Utc};
use rand::RngExt;
use tracing::{info, warn};

use keyhold_domain::id::{LockId, UserId};
use keyhold_domain::window::TimeWindow;

use crate::domain::repository::{
    LockRepository, OpenAttemptRepository, PropertyRepository, TokenRepository, UserRepository,
};
use crate::domain::types::{
    MULTI_USE_MAX_USES, NewOpenAttempt, NewToken, TOKEN_CODE_LEN, TOKEN_CODE_MAX_ATTEMPTS, Token,
};
use crate::error::AccessServiceError;
use crate::usecase::lock::list_owned_locks;

/// Charset for token codes (62 alphanumeric symbols).
const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..TOKEN_CODE_LEN)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}

/// Source of candidate token codes.
pub trait CodeGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Uniform draw of `TOKEN_CODE_LEN` symbols from `CHARSET`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomCodeGenerator;

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self) -> String {
        generate_code()
    }
}

// ── IssueToken ───────────────────────────────────────────────────────────────

pub struct IssueTokenInput {
    pub lock_id: LockId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub single_use: bool,
}

pub struct IssueTokenUseCase<L, T, C>
where
    L: LockRepository,
    T: TokenRepository,
    C: CodeGenerator,
{
    pub locks: L,
    pub tokens: T,
    pub codes: C,
}

impl<L, T, C> IssueTokenUseCase<L, T, C>
where
    L: LockRepository,
    T: TokenRepository,
    C: CodeGenerator,
{
    pub async fn execute(&self, input: IssueTokenInput) -> Result<Token, AccessServiceError> {
        // 1. Lock must exist → 404
        let lock = self
            .locks
            .find_by_id(input.lock_id)
            .await?
            .ok_or(AccessServiceError::LockNotFound)?;

        // 2. Window must be ordered → 400
        let window = TimeWindow::new(input.start, input.end)?;

        let max_uses = if input.single_use {
            1
        } else {
            MULTI_USE_MAX_USES
        };

        // 3. Draw codes until one is free, checked on lookup and again by the
        //    unique constraint at insert
        for _ in 0..TOKEN_CODE_MAX_ATTEMPTS {
            let code = self.codes.generate();
            if self.tokens.find_by_code(&code).await?.is_some() {
                continue;
            }
            let new_token = NewToken {
                code,
                lock_id: lock.id,
                window,
                single_use: input.single_use,
                max_uses,
            };
            if let Some(token) = self.tokens.create(&new_token).await? {
                info!(
                    lock_id = %lock.id,
                    token_id = %token.id,
                    single_use = token.single_use,
                    "token issued"
                );
                return Ok(token);
            }
        }

        Err(AccessServiceError::Internal(anyhow::anyhow!(
            "no free token code after {TOKEN_CODE_MAX_ATTEMPTS} attempts"
        )))
    }
}

// ── ValidateAndConsume ───────────────────────────────────────────────────────

pub struct ValidateTokenInput {
    pub code: String,
    pub lock_id: LockId,
    /// Caller, when known. Token redemptions may be anonymous.
    pub actor_id: Option<UserId>,
    pub now: DateTime<Utc>,
}

pub struct ValidateTokenUseCase<L, T, A>
where
    L: LockRepository,
    T: TokenRepository,
    A: OpenAttemptRepository,
{
    pub locks: L,
    pub tokens: T,
    pub attempts: A,
}

impl<L, T, A> ValidateTokenUseCase<L, T, A>
where
    L: LockRepository,
    T: TokenRepository,
    A: OpenAttemptRepository,
{
    /// Validate `code` for `lock_id` and, on success, consume one use and unlock
    /// the lock in a single store transaction.
    ///
    /// Returns the token as persisted after consumption. An unknown lock is
    /// `LockNotFound` and leaves no attempt record.
    pub async fn execute(&self, input: ValidateTokenInput) -> Result<Token, AccessServiceError> {
        self.locks
            .find_by_id(input.lock_id)
            .await?
            .ok_or(AccessServiceError::LockNotFound)?;

        match self.consume(&input).await {
            Ok(token) => {
                info!(
                    lock_id = %input.lock_id,
                    token_id = %token.id,
                    uses = token.uses,
                    "token accepted, lock opened"
                );
                Ok(token)
            }
            Err(AccessServiceError::Internal(e)) => Err(AccessServiceError::Internal(e)),
            Err(denied) => {
                warn!(lock_id = %input.lock_id, reason = %denied, "token rejected");
                let attempt = NewOpenAttempt::denied(
                    input.actor_id,
                    input.lock_id,
                    input.now,
                    denied.to_string(),
                );
                self.attempts.append(&attempt).await?;
                Err(denied)
            }
        }
    }

    async fn consume(&self, input: &ValidateTokenInput) -> Result<Token, AccessServiceError> {
        let token = self
            .tokens
            .find_by_code(&input.code)
            .await?
            .ok_or(AccessServiceError::TokenNotFound)?;

        if token.lock_id != input.lock_id {
            return Err(AccessServiceError::WrongLock);
        }
        if !token.is_usable_at(input.now) {
            return Err(AccessServiceError::Expired);
        }

        let attempt = NewOpenAttempt::granted(input.actor_id, input.lock_id, input.now);
        self.tokens
            .consume_and_unlock(token.id, token.uses, &attempt)
            .await?
            // Lost the race for the last use.
            .ok_or(AccessServiceError::Expired)
    }
}

// ── ListTokens ───────────────────────────────────────────────────────────────

pub struct ListTokensUseCase<T: TokenRepository> {
    pub tokens: T,
}

impl<T: TokenRepository> ListTokensUseCase<T> {
    /// Caller must have checked lock ownership.
    pub async fn execute(&self, lock_id: LockId) -> Result<Vec<Token>, AccessServiceError> {
        self.tokens.list_by_lock(lock_id).await
    }
}

pub struct ListOwnerTokensUseCase<U, P, L, T>
where
    U: UserRepository,
    P: PropertyRepository,
    L: LockRepository,
    T: TokenRepository,
{
    pub users: U,
    pub properties: P,
    pub locks: L,
    pub tokens: T,
}

impl<U, P, L, T> ListOwnerTokensUseCase<U, P, L, T>
where
    U: UserRepository,
    P: PropertyRepository,
    L: LockRepository,
    T: TokenRepository,
{
    /// Tokens on all of the owner's locks, grouped by lock.
    pub async fn execute(&self, actor_id: UserId) -> Result<Vec<Token>, AccessServiceError> {
        let locks = list_owned_locks(&self.users, &self.properties, &self.locks, actor_id).await?;
        let mut tokens = Vec::new();
        for lock in locks {
            tokens.extend(self.tokens.list_by_lock(lock.id).await?);
        }
        Ok(tokens)
    }
}

// ── PurgeExpiredTokens ───────────────────────────────────────────────────────

pub struct PurgeExpiredTokensUseCase<T: TokenRepository> {
    pub tokens: T,
}

impl<T: TokenRepository> PurgeExpiredTokensUseCase<T> {
    pub async fn execute(&self, now: DateTime<Utc>) -> Result<u64, AccessServiceError> {
        let removed = self.tokens.delete_expired(now).await?;
        if removed > 0 {
            info!(removed, "purged expired tokens");
        }
        Ok(removed)
    }
}
