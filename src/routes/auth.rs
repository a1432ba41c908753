use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::auth::{CredentialsRequest, GoogleSignInRequest, RefreshResponse, SessionView, SignInResponse},
    error::AppResult,
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    services::auth_service::{sign_in_with_credentials, sign_in_with_google},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/callback", post(credentials_callback))
        .route("/google", post(google_callback))
        .route("/refresh", post(refresh))
        .route("/session", get(session))
}

#[utoipa::path(
    post,
    path = "/api/auth/callback",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Signed in, or signed up when the email is new", body = ApiResponse<SignInResponse>),
        (status = 400, description = "Missing field"),
        (status = 401, description = "Wrong password or social-only account")
    ),
    tag = "Auth"
)]
pub async fn credentials_callback(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> AppResult<Json<ApiResponse<SignInResponse>>> {
    let resp = sign_in_with_credentials(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/google",
    request_body = GoogleSignInRequest,
    responses(
        (status = 200, description = "Signed in with a Google ID token", body = ApiResponse<SignInResponse>),
        (status = 400, description = "Token carries no email"),
        (status = 401, description = "Token rejected")
    ),
    tag = "Auth"
)]
pub async fn google_callback(
    State(state): State<AppState>,
    Json(payload): Json<GoogleSignInRequest>,
) -> AppResult<Json<ApiResponse<SignInResponse>>> {
    let resp = sign_in_with_google(&state, &payload.id_token).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    responses(
        (status = 200, description = "Session extended", body = ApiResponse<RefreshResponse>),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn refresh(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<RefreshResponse>>> {
    let token = state.sessions.refresh(&user.claims)?;
    Ok(Json(ApiResponse::success(
        "Session refreshed",
        RefreshResponse { token },
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    get,
    path = "/api/auth/session",
    responses(
        (status = 200, description = "Current session", body = ApiResponse<SessionView>),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn session(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<SessionView>>> {
    let view = state.sessions.materialize(&user.claims);
    Ok(Json(ApiResponse::success("Session", view, None)))
}
