use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use keyhold_auth_types::identity::IdentityHeaders;
use keyhold_domain::id::{LockId, TokenId};

use crate::domain::types::Token;
use crate::error::AccessServiceError;
use crate::state::AppState;
use crate::usecase::access::ensure_lock_owner;
use crate::usecase::token::{
    IssueTokenInput, IssueTokenUseCase, ListOwnerTokensUseCase, ListTokensUseCase,
    RandomCodeGenerator, ValidateTokenInput, ValidateTokenUseCase,
};

/// Token as shown to the lock owner, code included.
#[derive(Serialize)]
pub struct TokenResponse {
    pub id: TokenId,
    pub code: String,
    pub lock_id: LockId,
    #[serde(serialize_with = "keyhold_core::serde::to_rfc3339_ms")]
    pub starts_at: DateTime<Utc>,
    #[serde(serialize_with = "keyhold_core::serde::to_rfc3339_ms")]
    pub ends_at: DateTime<Utc>,
    pub single_use: bool,
    pub uses: u32,
    pub max_uses: u32,
    #[serde(serialize_with = "keyhold_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
}

impl From<Token> for TokenResponse {
    fn from(token: Token) -> Self {
        Self {
            id: token.id,
            code: token.code,
            lock_id: token.lock_id,
            starts_at: token.window.start(),
            ends_at: token.window.end(),
            single_use: token.single_use,
            uses: token.uses,
            max_uses: token.max_uses,
            created_at: token.created_at,
        }
    }
}

// ── POST /locks/{lock_id}/tokens ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct IssueTokenRequest {
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(default = "default_single_use")]
    pub single_use: bool,
}

fn default_single_use() -> bool {
    true
}

pub async fn issue_token(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(lock_id): Path<LockId>,
    Json(body): Json<IssueTokenRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), AccessServiceError> {
    ensure_lock_owner(&state.user_repo(), &state.lock_repo(), identity.user_id, lock_id).await?;

    let usecase = IssueTokenUseCase {
        locks: state.lock_repo(),
        tokens: state.token_repo(),
        codes: RandomCodeGenerator,
    };
    let token = usecase
        .execute(IssueTokenInput {
            lock_id,
            start: body.starts_at,
            end: body.ends_at,
            single_use: body.single_use,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(token.into())))
}

// ── GET /locks/{lock_id}/tokens ──────────────────────────────────────────────

pub async fn list_tokens(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(lock_id): Path<LockId>,
) -> Result<Json<Vec<TokenResponse>>, AccessServiceError> {
    let lock =
        ensure_lock_owner(&state.user_repo(), &state.lock_repo(), identity.user_id, lock_id)
            .await?;

    let usecase = ListTokensUseCase {
        tokens: state.token_repo(),
    };
    let tokens = usecase.execute(lock.id).await?;
    Ok(Json(tokens.into_iter().map(Into::into).collect()))
}

// ── GET /users/@me/tokens ────────────────────────────────────────────────────

pub async fn list_owner_tokens(
    identity: IdentityHeaders,
    State(state): State<AppState>,
) -> Result<Json<Vec<TokenResponse>>, AccessServiceError> {
    let usecase = ListOwnerTokensUseCase {
        users: state.user_repo(),
        properties: state.property_repo(),
        locks: state.lock_repo(),
        tokens: state.token_repo(),
    };
    let tokens = usecase.execute(identity.user_id).await?;
    Ok(Json(tokens.into_iter().map(Into::into).collect()))
}

// ── POST /locks/{lock_id}/redeem ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RedeemTokenRequest {
    pub code: String,
}

#[derive(Serialize)]
pub struct RedeemTokenResponse {
    pub lock_id: LockId,
    pub token_id: TokenId,
    pub uses: u32,
    pub max_uses: u32,
}

/// Anonymous callers may redeem; the attempt then carries no user.
pub async fn redeem_token(
    identity: Option<IdentityHeaders>,
    State(state): State<AppState>,
    Path(lock_id): Path<LockId>,
    Json(body): Json<RedeemTokenRequest>,
) -> Result<Json<RedeemTokenResponse>, AccessServiceError> {
    let usecase = ValidateTokenUseCase {
        locks: state.lock_repo(),
        tokens: state.token_repo(),
        attempts: state.open_attempt_repo(),
    };
    let token = usecase
        .execute(ValidateTokenInput {
            code: body.code,
            lock_id,
            actor_id: identity.map(|i| i.user_id),
            now: Utc::now(),
        })
        .await?;
    Ok(Json(RedeemTokenResponse {
        lock_id: token.lock_id,
        token_id: token.id,
        uses: token.uses,
        max_uses: token.max_uses,
    }))
}
