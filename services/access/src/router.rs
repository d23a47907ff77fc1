use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use keyhold_core::error::not_found;
use keyhold_core::health::{healthz, readyz};
use keyhold_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::handlers::{
    access::check_access,
    attempts::list_attempts,
    grants::{create_grant, list_lock_grants, list_my_grants, list_owner_grants},
    locks::{close_lock, create_lock, get_lock_info, list_locks, list_my_locks, open_lock},
    properties::{create_property, list_properties},
    tokens::{issue_token, list_owner_tokens, list_tokens, redeem_token},
    users::{find_user_by_email, get_me, register_user},
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Users
        .route("/users", post(register_user).get(find_user_by_email))
        .route("/users/@me", get(get_me))
        .route("/users/@me/grants", get(list_my_grants))
        .route("/users/@me/locks", get(list_my_locks))
        .route("/users/@me/lock-grants", get(list_owner_grants))
        .route("/users/@me/tokens", get(list_owner_tokens))
        // Properties
        .route("/properties", post(create_property).get(list_properties))
        .route(
            "/properties/{property_id}/locks",
            post(create_lock).get(list_locks),
        )
        // Locks
        .route("/locks/{lock_id}", get(get_lock_info))
        .route("/locks/{lock_id}/access", get(check_access))
        .route("/locks/{lock_id}/unlock", post(open_lock))
        .route("/locks/{lock_id}/lock", post(close_lock))
        .route(
            "/locks/{lock_id}/grants",
            post(create_grant).get(list_lock_grants),
        )
        .route("/locks/{lock_id}/tokens", post(issue_token).get(list_tokens))
        .route("/locks/{lock_id}/redeem", post(redeem_token))
        .route("/locks/{lock_id}/attempts", get(list_attempts))
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(request_id_layer())
                .layer(TraceLayer::new_for_http())
                .layer(propagate_request_id_layer()),
        )
        .with_state(state)
}
