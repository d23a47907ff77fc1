use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use keyhold_auth_types::identity::IdentityHeaders;
use keyhold_domain::id::{AttemptId, LockId, UserId};

use crate::domain::types::OpenAttempt;
use crate::error::AccessServiceError;
use crate::state::AppState;
use crate::usecase::attempt::ListAttemptsUseCase;

#[derive(Serialize)]
pub struct AttemptResponse {
    pub id: AttemptId,
    #[serde(serialize_with = "keyhold_core::serde::to_rfc3339_ms")]
    pub occurred_at: DateTime<Utc>,
    pub success: bool,
    pub reason: String,
    pub user_id: Option<UserId>,
    pub lock_id: LockId,
}

impl From<OpenAttempt> for AttemptResponse {
    fn from(attempt: OpenAttempt) -> Self {
        Self {
            id: attempt.id,
            occurred_at: attempt.occurred_at,
            success: attempt.success,
            reason: attempt.reason,
            user_id: attempt.user_id,
            lock_id: attempt.lock_id,
        }
    }
}

// ── GET /locks/{lock_id}/attempts ────────────────────────────────────────────

pub async fn list_attempts(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(lock_id): Path<LockId>,
) -> Result<Json<Vec<AttemptResponse>>, AccessServiceError> {
    let usecase = ListAttemptsUseCase {
        users: state.user_repo(),
        locks: state.lock_repo(),
        attempts: state.open_attempt_repo(),
    };
    let attempts = usecase.execute(identity.user_id, lock_id).await?;
    Ok(Json(attempts.into_iter().map(Into::into).collect()))
}
