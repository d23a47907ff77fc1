use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use keyhold_auth_types::identity::IdentityHeaders;
use keyhold_domain::id::{LockId, PropertyId};

use crate::domain::types::Lock;
use crate::error::AccessServiceError;
use crate::handlers::properties::PropertyResponse;
use crate::state::AppState;
use crate::usecase::access::{GetLockInfoUseCase, ListAccessibleLocksUseCase};
use crate::usecase::lock::{
    CreateLockInput, CreateLockUseCase, ListLocksUseCase, LockUseCase, UnlockUseCase,
};

#[derive(Serialize)]
pub struct LockResponse {
    pub id: LockId,
    pub property_id: PropertyId,
    pub model: String,
    pub locked: bool,
    #[serde(serialize_with = "keyhold_core::serde::to_rfc3339_ms")]
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<Lock> for LockResponse {
    fn from(lock: Lock) -> Self {
        Self {
            id: lock.id,
            property_id: lock.property_id,
            model: lock.model,
            locked: lock.locked,
            updated_at: lock.updated_at,
        }
    }
}

// ── POST /properties/{property_id}/locks ─────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateLockRequest {
    pub model: String,
}

pub async fn create_lock(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(property_id): Path<PropertyId>,
    Json(body): Json<CreateLockRequest>,
) -> Result<(StatusCode, Json<LockResponse>), AccessServiceError> {
    let usecase = CreateLockUseCase {
        users: state.user_repo(),
        properties: state.property_repo(),
        locks: state.lock_repo(),
    };
    let lock = usecase
        .execute(
            identity.user_id,
            CreateLockInput {
                property_id,
                model: body.model,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(lock.into())))
}

// ── GET /properties/{property_id}/locks ──────────────────────────────────────

pub async fn list_locks(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(property_id): Path<PropertyId>,
) -> Result<Json<Vec<LockResponse>>, AccessServiceError> {
    let usecase = ListLocksUseCase {
        users: state.user_repo(),
        properties: state.property_repo(),
        locks: state.lock_repo(),
    };
    let locks = usecase.execute(identity.user_id, property_id).await?;
    Ok(Json(locks.into_iter().map(Into::into).collect()))
}

// ── GET /locks/{lock_id} ─────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct LockInfoResponse {
    pub lock: LockResponse,
    pub property: Option<PropertyResponse>,
    pub owner_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_access: Option<bool>,
}

pub async fn get_lock_info(
    identity: Option<IdentityHeaders>,
    State(state): State<AppState>,
    Path(lock_id): Path<LockId>,
) -> Result<Json<LockInfoResponse>, AccessServiceError> {
    let usecase = GetLockInfoUseCase {
        users: state.user_repo(),
        properties: state.property_repo(),
        locks: state.lock_repo(),
        grants: state.grant_repo(),
    };
    let info = usecase
        .execute(lock_id, identity.map(|i| i.user_id), Utc::now())
        .await?;
    Ok(Json(LockInfoResponse {
        lock: info.lock.into(),
        property: info.property.map(Into::into),
        owner_name: info.owner_name,
        has_access: info.has_access,
    }))
}

// ── POST /locks/{lock_id}/unlock ─────────────────────────────────────────────

pub async fn open_lock(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(lock_id): Path<LockId>,
) -> Result<Json<LockResponse>, AccessServiceError> {
    let usecase = UnlockUseCase {
        users: state.user_repo(),
        locks: state.lock_repo(),
        grants: state.grant_repo(),
        attempts: state.open_attempt_repo(),
    };
    let lock = usecase
        .execute(identity.user_id, lock_id, Utc::now())
        .await?;
    Ok(Json(lock.into()))
}

// ── POST /locks/{lock_id}/lock ───────────────────────────────────────────────

pub async fn close_lock(
    State(state): State<AppState>,
    Path(lock_id): Path<LockId>,
) -> Result<Json<LockResponse>, AccessServiceError> {
    let usecase = LockUseCase {
        locks: state.lock_repo(),
    };
    let lock = usecase.execute(lock_id).await?;
    Ok(Json(lock.into()))
}

// ── GET /users/@me/locks ─────────────────────────────────────────────────────

pub async fn list_my_locks(
    identity: IdentityHeaders,
    State(state): State<AppState>,
) -> Result<Json<Vec<LockResponse>>, AccessServiceError> {
    let usecase = ListAccessibleLocksUseCase {
        users: state.user_repo(),
        locks: state.lock_repo(),
        grants: state.grant_repo(),
    };
    let locks = usecase.execute(identity.user_id, Utc::now()).await?;
    Ok(Json(locks.into_iter().map(Into::into).collect()))
}
