use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use serde::Serialize;

use keyhold_auth_types::identity::IdentityHeaders;
use keyhold_domain::id::{LockId, UserId};

use crate::error::AccessServiceError;
use crate::state::AppState;
use crate::usecase::access::CheckAccessUseCase;

// ── GET /locks/{lock_id}/access ──────────────────────────────────────────────

#[derive(Serialize)]
pub struct AccessResponse {
    pub user_id: UserId,
    pub lock_id: LockId,
    pub has_access: bool,
    #[serde(serialize_with = "keyhold_core::serde::to_rfc3339_ms")]
    pub checked_at: chrono::DateTime<chrono::Utc>,
}

pub async fn check_access(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(lock_id): Path<LockId>,
) -> Result<Json<AccessResponse>, AccessServiceError> {
    let usecase = CheckAccessUseCase {
        users: state.user_repo(),
        locks: state.lock_repo(),
        grants: state.grant_repo(),
    };
    let now = Utc::now();
    let has_access = usecase.execute(identity.user_id, lock_id, now).await?;
    Ok(Json(AccessResponse {
        user_id: identity.user_id,
        lock_id,
        has_access,
        checked_at: now,
    }))
}
