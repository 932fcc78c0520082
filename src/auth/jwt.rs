use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::{PayrollError, PayrollResult};

/// The `token_type` reported alongside every issued token.
pub const TOKEN_TYPE: &str = "bearer";

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// The username.
    pub sub: String,
    /// The user id.
    pub uid: u64,
    /// Expiry as a unix timestamp in seconds.
    pub exp: usize,
    /// Unique token id.
    pub jti: String,
}

/// Issues an HS256 token for a user, valid for the configured lifetime.
///
/// Returns the token and its lifetime in seconds.
pub fn issue_token(auth: &AuthConfig, user_id: u64, username: &str) -> PayrollResult<(String, i64)> {
    let ttl = Duration::minutes(auth.token_ttl_minutes);
    let exp = (Utc::now() + ttl).timestamp();
    let claims = Claims {
        sub: username.to_string(),
        uid: user_id,
        exp: usize::try_from(exp).unwrap_or(usize::MAX),
        jti: Uuid::new_v4().to_string(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth.jwt_secret.as_bytes()),
    )
    .map_err(|e| PayrollError::Internal {
        message: format!("token signing failed: {}", e),
    })?;

    Ok((token, ttl.num_seconds()))
}

/// Verifies a token's signature and expiry and returns its claims.
///
/// # Errors
///
/// Returns [`PayrollError::Unauthenticated`] for a bad signature, a
/// malformed token or an expired one.
pub fn verify_token(auth: &AuthConfig, token: &str) -> PayrollResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(auth.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| PayrollError::Unauthenticated {
        message: e.to_string(),
    })
}
