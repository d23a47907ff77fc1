use std::time::Duration;

use chrono::Utc;
use sea_orm::Database;
use tracing::{error, info};

use keyhold_access::config::AccessConfig;
use keyhold_access::router::build_router;
use keyhold_access::state::AppState;
use keyhold_access::usecase::token::PurgeExpiredTokensUseCase;

#[tokio::main]
async fn main() {
    keyhold_core::tracing::init_tracing();

    let config = AccessConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let state = AppState { db };

    tokio::spawn(purge_expired_tokens(
        state.clone(),
        Duration::from_secs(config.token_purge_interval_secs),
    ));

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.access_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("access service listening on {addr}");
    axum::serve(listener, router).await.expect("server error");
}

async fn purge_expired_tokens(state: AppState, period: Duration) {
    let mut interval = tokio::time::interval(period);
    loop {
        interval.tick().await;
        let usecase = PurgeExpiredTokensUseCase {
            tokens: state.token_repo(),
        };
        if let Err(e) = usecase.execute(Utc::now()).await {
            error!(error = ?e, "token purge failed");
        }
    }
}
