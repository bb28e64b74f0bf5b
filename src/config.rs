use std::env;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub auth: AuthConfig,
}

/// Token signing configuration. Loaded once at startup and passed around
/// explicitly so the token codec stays testable without ambient env state.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub token_expiry_minutes: i64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);

        // A missing signing key is a fatal misconfiguration, not something to
        // fall back from.
        let secret = env::var("SECRET_KEY").context("SECRET_KEY must be set")?;
        let token_expiry_minutes = env::var("ACCESS_TOKEN_EXPIRE_MINUTES")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(30);

        Ok(Self {
            database_url,
            host,
            port,
            auth: AuthConfig {
                secret,
                token_expiry_minutes,
            },
        })
    }
}
