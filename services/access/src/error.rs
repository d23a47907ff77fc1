use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Access service domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum AccessServiceError {
    #[error("user not found")]
    UserNotFound,
    #[error("lock not found")]
    LockNotFound,
    #[error("property not found")]
    PropertyNotFound,
    #[error("token not found")]
    TokenNotFound,
    #[error("invalid window")]
    InvalidWindow,
    #[error("no access")]
    Forbidden,
    #[error("token expired")]
    Expired,
    #[error("token not valid for this lock")]
    WrongLock,
    #[error("user already exists")]
    UserAlreadyExists,
    #[error("invalid role")]
    InvalidRole,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl AccessServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::LockNotFound => "LOCK_NOT_FOUND",
            Self::PropertyNotFound => "PROPERTY_NOT_FOUND",
            Self::TokenNotFound => "TOKEN_NOT_FOUND",
            Self::InvalidWindow => "INVALID_WINDOW",
            Self::Forbidden => "FORBIDDEN",
            Self::Expired => "TOKEN_EXPIRED",
            Self::WrongLock => "WRONG_LOCK",
            Self::UserAlreadyExists => "USER_ALREADY_EXISTS",
            Self::InvalidRole => "INVALID_ROLE",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

impl From<keyhold_domain::window::InvalidWindow> for AccessServiceError {
    fn from(_: keyhold_domain::window::InvalidWindow) -> Self {
        Self::InvalidWindow
    }
}

impl IntoResponse for AccessServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::UserNotFound
            | Self::LockNotFound
            | Self::PropertyNotFound
            | Self::TokenNotFound => StatusCode::NOT_FOUND,
            Self::InvalidWindow | Self::InvalidRole => StatusCode::BAD_REQUEST,
            Self::Forbidden | Self::Expired | Self::WrongLock => StatusCode::FORBIDDEN,
            Self::UserAlreadyExists => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // Only 500s are logged here; the trace layer records status for every request.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = %e, kind = "INTERNAL", "internal error");
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
