use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    dto::banners::{BannerCreated, BannerDeleted, BannerList},
    entity::banners::{ActiveModel as BannerActive, Column as BannerCol, Entity as Banners},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    response::{ApiResponse, Meta},
    services::assets::{self, BANNER_FOLDER, ImageUpload},
    state::AppState,
};

pub async fn list_banners(state: &AppState) -> AppResult<ApiResponse<BannerList>> {
    let items = Banners::find()
        .order_by_desc(BannerCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(ApiResponse::success("Ok", BannerList { items }, None))
}

pub async fn create_banner(
    state: &AppState,
    user: &AuthUser,
    images: Vec<ImageUpload>,
) -> AppResult<ApiResponse<BannerCreated>> {
    ensure_admin(user)?;
    if images.is_empty() {
        return Err(AppError::Validation("at least one image is required".into()));
    }

    let outcome = assets::upload_all(state.assets.as_ref(), BANNER_FOLDER, images).await;
    if outcome.uploaded.is_empty() {
        return Err(AppError::NoValidImages);
    }

    let inserted = BannerActive {
        id: Set(Uuid::new_v4()),
        images: Set(serde_json::json!(outcome.urls())),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await;

    let banner = match inserted {
        Ok(banner) => banner,
        Err(err) => {
            assets::discard(state.assets.as_ref(), &outcome.uploaded).await;
            return Err(err.into());
        }
    };

    tracing::info!(
        banner_id = %banner.id,
        uploaded = outcome.uploaded.len(),
        failed = outcome.failed.len(),
        "banner created"
    );

    Ok(ApiResponse::success(
        "Banner created",
        BannerCreated {
            banner: banner.into(),
            failed: outcome.failed,
        },
        Some(Meta::empty()),
    ))
}

pub async fn delete_banner(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<BannerDeleted>> {
    ensure_admin(user)?;
    let banner = Banners::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    Banners::delete_by_id(banner.id).exec(&state.orm).await?;

    tracing::info!(banner_id = %id, "banner deleted");
    Ok(ApiResponse::success(
        "Banner deleted",
        BannerDeleted { id },
        Some(Meta::empty()),
    ))
}
