//! Request extractors.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use tracing::debug;

use crate::auth::verify_token;
use crate::error::PayrollError;

use super::response::ApiErrorResponse;
use super::state::AppState;

/// The user resolved from a request's bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// User id.
    pub id: u64,
    /// Login name.
    pub username: String,
}

fn unauthenticated(message: &str) -> PayrollError {
    PayrollError::Unauthenticated {
        message: message.to_string(),
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiErrorResponse;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| unauthenticated("missing bearer token"))?
            .strip_prefix("Bearer ")
            .ok_or_else(|| unauthenticated("authorization scheme must be Bearer"))?;

        let claims = verify_token(&state.config().config().auth, token.trim())?;

        // The account may have vanished since the token was issued.
        let user = state
            .store()
            .get_user(claims.uid)?
            .filter(|u| u.username == claims.sub)
            .ok_or_else(|| unauthenticated("user no longer exists"))?;

        debug!(user_id = user.id, "Authenticated request");
        Ok(AuthUser {
            id: user.id,
            username: user.username,
        })
    }
}
