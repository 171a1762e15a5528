use std::env;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub admin_email: String,
    pub admin_password: String,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expires_hours: i64,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>, expires_hours: i64) -> Self {
        Self {
            secret: secret.into(),
            expires_hours,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        let expires_hours = env::var("JWT_EXPIRES_HOURS")
            .ok()
            .and_then(|h| h.parse::<i64>().ok())
            .filter(|h| *h > 0)
            .unwrap_or(24);
        let admin_email =
            env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@pizzaria.com".to_string());
        let admin_password = env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());
        Ok(Self {
            port,
            database_url,
            host,
            jwt: JwtConfig::new(secret, expires_hours),
            admin_email,
            admin_password,
        })
    }
}
