use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::addresses::UpsertAddressRequest,
    error::AppResult,
    middleware::auth::AuthUser,
    models::Address,
    response::ApiResponse,
    services::address_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/me", get(get_my_address).put(upsert_my_address))
}

#[utoipa::path(
    get,
    path = "/api/addresses/me",
    responses(
        (status = 200, description = "Caller's shipping address", body = ApiResponse<Address>),
        (status = 404, description = "No address saved yet")
    ),
    security(("bearer_auth" = [])),
    tag = "Addresses"
)]
pub async fn get_my_address(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Address>>> {
    let resp = address_service::get_my_address(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/addresses/me",
    request_body = UpsertAddressRequest,
    responses(
        (status = 200, description = "Address saved", body = ApiResponse<Address>),
        (status = 400, description = "Missing field")
    ),
    security(("bearer_auth" = [])),
    tag = "Addresses"
)]
pub async fn upsert_my_address(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpsertAddressRequest>,
) -> AppResult<Json<ApiResponse<Address>>> {
    let resp = address_service::upsert_my_address(&state, &user, payload).await?;
    Ok(Json(resp))
}
