use std::env;

use sqlx::SqlitePool;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub jwt: JwtConfig,
}

#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    pub expire_hours: i64,
}

impl JwtConfig {
    pub fn from_env() -> Self {
        let secret = env::var("JWT_SECRET").unwrap_or_else(|_| "dev-secret".to_string());
        if secret == "dev-secret" {
            log::warn!("JWT_SECRET not set. Using an insecure default. Set JWT_SECRET in production.");
        }
        let expire_hours = env::var("JWT_EXPIRE_HOURS")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(24 * 7);
        Self {
            secret,
            expire_hours,
        }
    }
}
