/// Access service configuration loaded from environment variables.
#[derive(Debug)]
pub struct AccessConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// TCP port to listen on (default 3114). Env var: `ACCESS_PORT`.
    pub access_port: u16,
    /// Seconds between expired-token purges (default 3600).
    /// Env var: `TOKEN_PURGE_INTERVAL_SECS`.
    pub token_purge_interval_secs: u64,
}

impl AccessConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL"),
            access_port: std::env::var("ACCESS_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3114),
            token_purge_interval_secs: std::env::var("TOKEN_PURGE_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(3600),
        }
    }
}
