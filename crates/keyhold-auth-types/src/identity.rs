//! Gateway-injected identity headers extractor.

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use http::request::Parts;

use keyhold_core::error::AppError;
use keyhold_domain::id::UserId;

pub const X_KEYHOLD_USER_ID: &str = "x-keyhold-user-id";

/// Caller identity injected by the gateway via the `x-keyhold-user-id` header.
///
/// Rejects with 401 if the header is absent or not an integer id. Whether the
/// id resolves to a user, and what that user may do, is decided by the service.
#[derive(Debug, Clone, Copy)]
pub struct IdentityHeaders {
    pub user_id: UserId,
}

enum Header {
    Missing,
    Malformed,
    Present(UserId),
}

fn read_header(parts: &Parts) -> Header {
    match parts.headers.get(X_KEYHOLD_USER_ID) {
        None => Header::Missing,
        Some(v) => v
            .to_str()
            .ok()
            .and_then(|s| s.parse::<UserId>().ok())
            .map_or(Header::Malformed, Header::Present),
    }
}

impl<S> FromRequestParts<S> for IdentityHeaders
where
    S: Send + Sync,
{
    type Rejection = AppError;

    // axum-core 0.5 defines this as `fn -> impl Future + Send` (not `async fn`).
    // Read the header synchronously and return a 'static async block.
    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let header = read_header(parts);
        async move {
            match header {
                Header::Present(user_id) => Ok(Self { user_id }),
                Header::Missing | Header::Malformed => Err(AppError::Unauthorized),
            }
        }
    }
}

/// `Option<IdentityHeaders>`: `None` when the header is absent, 401 when malformed.
impl<S> OptionalFromRequestParts<S> for IdentityHeaders
where
    S: Send + Sync,
{
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Option<Self>, Self::Rejection>> + Send {
        let header = read_header(parts);
        async move {
            match header {
                Header::Missing => Ok(None),
                Header::Malformed => Err(AppError::Unauthorized),
                Header::Present(user_id) => Ok(Some(Self { user_id })),
            }
        }
    }
}
