use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{delete, get},
};
use uuid::Uuid;

use crate::{
    dto::banners::{BannerCreated, BannerDeleted, BannerList},
    error::AppResult,
    middleware::auth::{AuthUser, ensure_admin},
    response::ApiResponse,
    routes::uploads,
    services::banner_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_banners).post(create_banner))
        .route("/{id}", delete(delete_banner))
}

#[utoipa::path(
    get,
    path = "/api/banners",
    responses(
        (status = 200, description = "Every banner, newest first", body = ApiResponse<BannerList>)
    ),
    tag = "Banners"
)]
pub async fn list_banners(State(state): State<AppState>) -> AppResult<Json<ApiResponse<BannerList>>> {
    let resp = banner_service::list_banners(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/banners",
    responses(
        (status = 201, description = "Banner created from multipart `images` files", body = ApiResponse<BannerCreated>),
        (status = 400, description = "No images, or none could be hosted"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Banners"
)]
pub async fn create_banner(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<ApiResponse<BannerCreated>>)> {
    // Reject before buffering the upload.
    ensure_admin(&user)?;
    let form = uploads::read_form(multipart).await?;
    let resp = banner_service::create_banner(&state, &user, form.images).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    delete,
    path = "/api/banners/{id}",
    params(
        ("id" = Uuid, Path, description = "Banner ID")
    ),
    responses(
        (status = 200, description = "Banner deleted", body = ApiResponse<BannerDeleted>),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Banner not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Banners"
)]
pub async fn delete_banner(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<BannerDeleted>>> {
    let resp = banner_service::delete_banner(&state, &user, id).await?;
    Ok(Json(resp))
}
