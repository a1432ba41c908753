use axum::{extract::FromRequestParts, http::header};
use uuid::Uuid;

use crate::{dto::auth::Claims, error::AppError, state::AppState};

/// Caller identity taken from a verified session token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
    pub claims: Claims,
}

pub fn ensure_role(user: &AuthUser, role: &str) -> Result<(), AppError> {
    if user.role != role {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, "admin")
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_str = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AppError::Unauthenticated)?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AppError::Unauthenticated)?;

        let claims = state.sessions.verify(token)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthenticated)?;

        Ok(AuthUser {
            user_id,
            email: claims.email.clone(),
            role: claims.role.clone(),
            claims,
        })
    }
}
