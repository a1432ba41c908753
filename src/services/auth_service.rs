use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::Utc;
use password_hash::rand_core::OsRng;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, SqlErr};
use uuid::Uuid;

use crate::{
    dto::auth::{CredentialsRequest, OAuthProfile, SignInResponse, SignedInUser},
    entity::users::{self, ActiveModel as UserActive, Column as UserCol, Entity as Users},
    error::{AppError, AppResult},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Look a user up by email, creating the account on first sign-in.
///
/// A supplied password is hashed before it is stored. Without one the account
/// is marked as social-only by an empty hash.
pub async fn resolve_or_create_user(
    state: &AppState,
    email: &str,
    name: &str,
    image: Option<&str>,
    password: Option<&str>,
) -> AppResult<users::Model> {
    if let Some(user) = find_by_email(state, email).await? {
        return Ok(user);
    }

    let password_hash = match password {
        Some(password) => hash_password(password)?,
        None => String::new(),
    };
    let role = state.auth.role_for(email);

    let inserted = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        name: Set(name.to_string()),
        password_hash: Set(password_hash),
        image: Set(image.filter(|i| !i.is_empty()).map(str::to_owned)),
        role: Set(role.to_string()),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await;

    match inserted {
        Ok(user) => {
            tracing::info!(user_id = %user.id, role = %user.role, "user registered");
            Ok(user)
        }
        // A concurrent first sign-in created the row after our lookup.
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            find_by_email(state, email)
                .await?
                .ok_or(AppError::UserCreation(err))
        }
        Err(err) => Err(AppError::UserCreation(err)),
    }
}

/// Email/password sign-in. An unknown email is registered on the spot.
pub async fn authenticate_with_credentials(
    state: &AppState,
    payload: CredentialsRequest,
) -> AppResult<SignedInUser> {
    let email = payload.email.trim();
    let name = payload.name.trim();
    let password = payload.password.as_str();
    if email.is_empty() || name.is_empty() || password.is_empty() {
        return Err(AppError::MissingField);
    }

    let user = match find_by_email(state, email).await? {
        Some(user) => {
            if user.password_hash.is_empty() {
                return Err(AppError::SocialOnlyAccount);
            }
            verify_password(password, &user.password_hash)?;
            user
        }
        None => resolve_or_create_user(state, email, name, None, Some(password)).await?,
    };

    Ok(user.into())
}

/// OAuth sign-in hook.
///
/// Email and name prefer the normalized user, the picture prefers the provider
/// profile. The resolved id and role are written back into the identity.
pub async fn sign_in_with_profile(
    state: &AppState,
    normalized: OAuthProfile,
    provider: Option<OAuthProfile>,
) -> AppResult<SignedInUser> {
    let provider = provider.unwrap_or_default();
    let email = first_present(normalized.email, provider.email).ok_or(AppError::MissingEmail)?;
    let name = first_present(normalized.name, provider.name)
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());
    let image = first_present(provider.picture, normalized.picture);

    let user = resolve_or_create_user(state, &email, &name, image.as_deref(), None).await?;

    Ok(SignedInUser {
        id: user.id,
        email,
        name,
        role: user.role,
        image: image.unwrap_or_default(),
    })
}

pub async fn sign_in_with_credentials(
    state: &AppState,
    payload: CredentialsRequest,
) -> AppResult<ApiResponse<SignInResponse>> {
    let user = authenticate_with_credentials(state, payload).await?;
    let token = state.sessions.mint(&user)?;
    tracing::info!(user_id = %user.id, "signed in with credentials");
    Ok(ApiResponse::success(
        "Logged in",
        SignInResponse { token, user },
        Some(Meta::empty()),
    ))
}

pub async fn sign_in_with_google(
    state: &AppState,
    id_token: &str,
) -> AppResult<ApiResponse<SignInResponse>> {
    if state.auth.google_client_id.is_empty() {
        return Err(AppError::Internal(anyhow::anyhow!("GOOGLE_CLIENT_ID is not set")));
    }

    let client = google_oauth::AsyncClient::new(&state.auth.google_client_id);
    let payload = client.validate_id_token(id_token).await.map_err(|err| {
        tracing::warn!(error = %err, "google id token rejected");
        AppError::Unauthenticated
    })?;

    let profile = OAuthProfile {
        email: payload.email,
        name: payload.name,
        picture: payload.picture,
    };
    let user = sign_in_with_profile(state, OAuthProfile::default(), Some(profile)).await?;
    let token = state.sessions.mint(&user)?;
    tracing::info!(user_id = %user.id, "signed in with google");
    Ok(ApiResponse::success(
        "Logged in",
        SignInResponse { token, user },
        Some(Meta::empty()),
    ))
}

async fn find_by_email(state: &AppState, email: &str) -> AppResult<Option<users::Model>> {
    let user = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(&state.orm)
        .await?;
    Ok(user)
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(password_hash)
}

fn verify_password(password: &str, stored: &str) -> AppResult<()> {
    let parsed_hash = PasswordHash::new(stored)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::InvalidCredentials)
}

fn first_present(primary: Option<String>, fallback: Option<String>) -> Option<String> {
    primary
        .filter(|value| !value.trim().is_empty())
        .or(fallback.filter(|value| !value.trim().is_empty()))
}
