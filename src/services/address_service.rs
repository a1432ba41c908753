use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{
    dto::addresses::UpsertAddressRequest,
    entity::{
        addresses::{self, ActiveModel as AddressActive, Column as AddressCol, Entity as Addresses},
        users::{Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Address,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn get_my_address(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Address>> {
    let owner_id = owner_id(state, user).await?;
    let address = Addresses::find()
        .filter(AddressCol::UserId.eq(owner_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Address", address.into(), None))
}

/// Each user keeps a single shipping address; saving again replaces it.
pub async fn upsert_my_address(
    state: &AppState,
    user: &AuthUser,
    payload: UpsertAddressRequest,
) -> AppResult<ApiResponse<Address>> {
    payload.validate()?;
    let owner_id = owner_id(state, user).await?;
    let now = Utc::now();

    let existing = Addresses::find()
        .filter(AddressCol::UserId.eq(owner_id))
        .one(&state.orm)
        .await?;

    let is_new = existing.is_none();
    let mut active: AddressActive = match existing {
        Some(address) => address.into(),
        None => AddressActive {
            id: Set(Uuid::new_v4()),
            user_id: Set(owner_id),
            created_at: Set(now.into()),
            ..Default::default()
        },
    };
    active.recipient_name = Set(payload.recipient_name.trim().to_string());
    active.street = Set(payload.street.trim().to_string());
    active.number = Set(payload.number.trim().to_string());
    active.complement = Set(payload
        .complement
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty()));
    active.district = Set(payload.district.trim().to_string());
    active.city = Set(payload.city.trim().to_string());
    active.state = Set(payload.state.trim().to_string());
    active.zip_code = Set(payload.zip_code.trim().to_string());
    active.updated_at = Set(now.into());

    let address: addresses::Model = if is_new {
        active.insert(&state.orm).await?
    } else {
        active.update(&state.orm).await?
    };

    tracing::info!(user_id = %owner_id, address_id = %address.id, "address saved");
    Ok(ApiResponse::success(
        "Address saved",
        address.into(),
        Some(Meta::empty()),
    ))
}

async fn owner_id(state: &AppState, user: &AuthUser) -> AppResult<Uuid> {
    let owner = Users::find()
        .filter(UserCol::Email.eq(user.email.as_str()))
        .one(&state.orm)
        .await?
        .ok_or(AppError::UserNotFound)?;
    Ok(owner.id)
}
