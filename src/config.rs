use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    /// Session lifetime; the guard trusts the token's role for this whole
    /// window.
    pub ttl_days: i64,
}

/// Service credential for the remote REST API.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub email: String,
    pub senha: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub jwt: JwtConfig,
    pub upstream: UpstreamConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let data_dir = std::env::var("DATA_DIR")
            .unwrap_or_else(|_| "./data".into())
            .into();
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "floramed".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "floramed-users".into()),
            ttl_days: std::env::var("JWT_TTL_DAYS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(30),
        };
        let upstream = UpstreamConfig {
            base_url: std::env::var("UPSTREAM_BASE_URL").unwrap_or_default(),
            email: std::env::var("UPSTREAM_EMAIL").unwrap_or_default(),
            senha: std::env::var("UPSTREAM_SENHA").unwrap_or_default(),
        };
        Ok(Self {
            data_dir,
            jwt,
            upstream,
        })
    }
}
