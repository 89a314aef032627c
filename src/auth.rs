//! Authentication utilities: JWT validation and role checks
//!
//! Tokens are issued by the session service; this worker only verifies them.

use anyhow::{anyhow, Result};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::types::{Request, IMPORT_ROLES};

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// User email
    pub email: String,
    /// User role (rep, manager, executive, admin)
    pub role: String,
    /// Issued at (unix timestamp)
    pub iat: usize,
    /// Expiration (unix timestamp)
    pub exp: usize,
}

/// Authentication result from extract_auth
#[derive(Debug, Clone)]
pub struct AuthInfo {
    pub user_id: i32,
    pub role: String,
}

impl AuthInfo {
    /// Visit imports are limited to managers and executives
    pub fn can_import_visits(&self) -> bool {
        IMPORT_ROLES.contains(&self.role.as_str())
    }
}

/// Validate a JWT token and return claims
pub fn validate_token(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| anyhow!("Invalid token: {}", e))?;

    Ok(token_data.claims)
}

/// Extract authentication info from a NATS request
pub fn extract_auth<T>(request: &Request<T>, jwt_secret: &str) -> Result<AuthInfo> {
    let token = request
        .token
        .as_deref()
        .ok_or_else(|| anyhow!("No authentication provided: JWT token is required"))?;

    let claims = validate_token(token, jwt_secret)?;
    let user_id = claims
        .sub
        .parse::<i32>()
        .map_err(|e| anyhow!("Invalid user id in token: {}", e))?;

    Ok(AuthInfo {
        user_id,
        role: claims.role,
    })
}

// =============================================================================
// Tests
// =============================================================================
