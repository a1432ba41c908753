use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::users;

/// Credentials sign-in; an unknown email registers a new account.
#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct GoogleSignInRequest {
    pub id_token: String,
}

/// Identity handed over by an OAuth provider after it verified the user.
#[derive(Debug, Clone, Default)]
pub struct OAuthProfile {
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Minimal user record carried into a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SignedInUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    pub image: String,
}

impl From<users::Model> for SignedInUser {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            image: user.image.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignInResponse {
    pub token: String,
    pub user: SignedInUser,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RefreshResponse {
    pub token: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    #[serde(default)]
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub picture: String,
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SessionUser {
    pub id: String,
    pub role: String,
    pub name: Option<String>,
    pub email: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionView {
    pub user: SessionUser,
    pub expires: DateTime<Utc>,
}
