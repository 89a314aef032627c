//! Configuration management

use anyhow::{self, Context, Result};

use crate::services::visit_import::DEFAULT_MAX_UPLOAD_BYTES;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// NATS server URL
    pub nats_url: String,

    /// PostgreSQL connection string
    pub database_url: String,

    /// JWT secret key for token validation
    pub jwt_secret: String,

    /// Largest accepted import upload, in bytes
    pub max_upload_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let nats_url = std::env::var("NATS_URL")
            .unwrap_or_else(|_| "nats://localhost:4222".to_string());

        let database_url = std::env::var("DATABASE_URL")
            .context("DATABASE_URL must be set")?;

        let jwt_secret = std::env::var("JWT_SECRET")
            .context("JWT_SECRET must be set; generate one with: openssl rand -base64 48")?;

        if jwt_secret.len() < 32 {
            anyhow::bail!(
                "JWT_SECRET must be at least 32 bytes (current: {} bytes). Generate one with: openssl rand -base64 48",
                jwt_secret.len()
            );
        }

        let raw_limit = std::env::var("IMPORT_MAX_UPLOAD_BYTES").ok();
        let max_upload_bytes = parse_upload_limit(raw_limit.as_deref())?;

        Ok(Self {
            nats_url,
            database_url,
            jwt_secret,
            max_upload_bytes,
        })
    }
}

fn parse_upload_limit(raw: Option<&str>) -> Result<usize> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_MAX_UPLOAD_BYTES);
    };
    let limit: usize = raw
        .trim()
        .parse()
        .with_context(|| format!("IMPORT_MAX_UPLOAD_BYTES must be a byte count, got '{}'", raw))?;
    if limit == 0 {
        anyhow::bail!("IMPORT_MAX_UPLOAD_BYTES must be greater than zero");
    }
    Ok(limit)
}
