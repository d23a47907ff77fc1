use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use keyhold_auth_types::identity::IdentityHeaders;
use keyhold_domain::id::{GrantId, LockId, UserId};

use crate::domain::types::AccessGrant;
use crate::error::AccessServiceError;
use crate::state::AppState;
use crate::usecase::grant::{
    CreateGrantInput, CreateGrantUseCase, ListGuestGrantsUseCase, ListLockGrantsUseCase,
    ListOwnerGrantsUseCase,
};

#[derive(Serialize)]
pub struct GrantResponse {
    pub id: GrantId,
    pub guest_id: UserId,
    pub lock_id: LockId,
    #[serde(serialize_with = "keyhold_core::serde::to_rfc3339_ms")]
    pub starts_at: DateTime<Utc>,
    #[serde(serialize_with = "keyhold_core::serde::to_rfc3339_ms")]
    pub ends_at: DateTime<Utc>,
    #[serde(serialize_with = "keyhold_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
}

impl From<AccessGrant> for GrantResponse {
    fn from(grant: AccessGrant) -> Self {
        Self {
            id: grant.id,
            guest_id: grant.guest_id,
            lock_id: grant.lock_id,
            starts_at: grant.window.start(),
            ends_at: grant.window.end(),
            created_at: grant.created_at,
        }
    }
}

// ── POST /locks/{lock_id}/grants ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateGrantRequest {
    pub guest_id: UserId,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

pub async fn create_grant(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(lock_id): Path<LockId>,
    Json(body): Json<CreateGrantRequest>,
) -> Result<(StatusCode, Json<GrantResponse>), AccessServiceError> {
    let usecase = CreateGrantUseCase {
        users: state.user_repo(),
        locks: state.lock_repo(),
        grants: state.grant_repo(),
    };
    let grant = usecase
        .execute(
            identity.user_id,
            CreateGrantInput {
                guest_id: body.guest_id,
                lock_id,
                start: body.starts_at,
                end: body.ends_at,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(grant.into())))
}

// ── GET /locks/{lock_id}/grants ──────────────────────────────────────────────

pub async fn list_lock_grants(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(lock_id): Path<LockId>,
) -> Result<Json<Vec<GrantResponse>>, AccessServiceError> {
    let usecase = ListLockGrantsUseCase {
        users: state.user_repo(),
        locks: state.lock_repo(),
        grants: state.grant_repo(),
    };
    let grants = usecase.execute(identity.user_id, lock_id).await?;
    Ok(Json(grants.into_iter().map(Into::into).collect()))
}

// ── GET /users/@me/grants ────────────────────────────────────────────────────

pub async fn list_my_grants(
    identity: IdentityHeaders,
    State(state): State<AppState>,
) -> Result<Json<Vec<GrantResponse>>, AccessServiceError> {
    let usecase = ListGuestGrantsUseCase {
        grants: state.grant_repo(),
    };
    let grants = usecase.execute(identity.user_id).await?;
    Ok(Json(grants.into_iter().map(Into::into).collect()))
}

// ── GET /users/@me/lock-grants ───────────────────────────────────────────────

pub async fn list_owner_grants(
    identity: IdentityHeaders,
    State(state): State<AppState>,
) -> Result<Json<Vec<GrantResponse>>, AccessServiceError> {
    let usecase = ListOwnerGrantsUseCase {
        users: state.user_repo(),
        properties: state.property_repo(),
        locks: state.lock_repo(),
        grants: state.grant_repo(),
    };
    let grants = usecase.execute(identity.user_id).await?;
    Ok(Json(grants.into_iter().map(Into::into).collect()))
}
