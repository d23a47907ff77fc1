use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use keyhold_auth_types::identity::IdentityHeaders;
use keyhold_domain::id::UserId;
use keyhold_domain::user::UserRole;

use crate::domain::types::User;
use crate::error::AccessServiceError;
use crate::state::AppState;
use crate::usecase::user::{
    FindUserByEmailUseCase, GetUserUseCase, RegisterUserInput, RegisterUserUseCase,
};

#[derive(Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: u8,
    #[serde(serialize_with = "keyhold_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

// ── POST /users ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterUserRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub credential: String,
    pub role: u8,
}

pub async fn register_user(
    State(state): State<AppState>,
    Json(body): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AccessServiceError> {
    let role = UserRole::from_u8(body.role).ok_or(AccessServiceError::InvalidRole)?;
    let usecase = RegisterUserUseCase {
        repo: state.user_repo(),
    };
    let user = usecase
        .execute(RegisterUserInput {
            name: body.name,
            email: body.email,
            phone: body.phone,
            credential: body.credential,
            role,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

// ── GET /users/@me ───────────────────────────────────────────────────────────

pub async fn get_me(
    identity: IdentityHeaders,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, AccessServiceError> {
    let usecase = GetUserUseCase {
        repo: state.user_repo(),
    };
    let user = usecase.execute(identity.user_id).await?;
    Ok(Json(user.into()))
}

// ── GET /users?email= ────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct FindUserQuery {
    pub email: String,
}

pub async fn find_user_by_email(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Query(query): Query<FindUserQuery>,
) -> Result<Json<UserResponse>, AccessServiceError> {
    let usecase = FindUserByEmailUseCase {
        repo: state.user_repo(),
    };
    let user = usecase.execute(identity.user_id, &query.email).await?;
    Ok(Json(user.into()))
}
