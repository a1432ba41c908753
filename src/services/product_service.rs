use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    dto::products::{
        NewProduct, ProductCreated, ProductDeleted, ProductList, UpdateProductRequest,
        validate_dimensions,
    },
    entity::{
        order_lines::{Column as LineCol, Entity as OrderLines},
        products::{ActiveModel, Column, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    services::assets::{self, ImageUpload, PRODUCT_FOLDER},
    state::AppState,
};

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search.to_lowercase());
        condition = condition.add(
            Condition::any()
                .add(Expr::expr(Func::lower(Expr::col(Column::Name))).like(pattern.clone()))
                .add(Expr::expr(Func::lower(Expr::col(Column::Tags))).like(pattern)),
        );
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Name => Column::Name,
    };

    let mut finder = Products::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(u64::try_from(limit).unwrap_or(0))
        .offset(u64::try_from(offset).unwrap_or(0))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Product", product.into(), None))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: NewProduct,
    images: Vec<ImageUpload>,
) -> AppResult<ApiResponse<ProductCreated>> {
    ensure_admin(user)?;
    if images.is_empty() {
        return Err(AppError::Validation("at least one image is required".into()));
    }
    ensure_name_free(state, &payload.name, None).await?;

    let outcome = assets::upload_all(state.assets.as_ref(), PRODUCT_FOLDER, images).await;
    if outcome.uploaded.is_empty() {
        return Err(AppError::NoValidImages);
    }

    let inserted = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        description: Set(payload.description),
        price: Set(payload.price),
        discounted_price: Set(payload.discounted_price),
        tags: Set(payload.tags),
        images: Set(serde_json::json!(outcome.urls())),
        weight_kg: Set(payload.weight_kg),
        height_cm: Set(payload.height_cm),
        width_cm: Set(payload.width_cm),
        length_cm: Set(payload.length_cm),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await;

    let product = match inserted {
        Ok(product) => product,
        Err(err) => {
            assets::discard(state.assets.as_ref(), &outcome.uploaded).await;
            return Err(err.into());
        }
    };

    tracing::info!(product_id = %product.id, failed = outcome.failed.len(), "product created");
    Ok(ApiResponse::success(
        "Product created",
        ProductCreated {
            product: product.into(),
            failed: outcome.failed,
        },
        Some(Meta::empty()),
    ))
}

/// Past order lines keep their captured prices whatever changes here.
pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    validate_dimensions(
        payload.weight_kg,
        [payload.height_cm, payload.width_cm, payload.length_cm],
    )?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name.map(|n| n.trim().to_string()) {
        if name.is_empty() {
            return Err(AppError::Validation("name must not be empty".into()));
        }
        ensure_name_free(state, &name, Some(id)).await?;
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(non_blank("description", description)?);
    }
    if let Some(price) = payload.price {
        if price <= 0 {
            return Err(AppError::Validation("price must be positive".into()));
        }
        active.price = Set(price);
    }
    if let Some(discounted_price) = payload.discounted_price {
        if discounted_price < 0 {
            return Err(AppError::Validation("discounted_price must not be negative".into()));
        }
        active.discounted_price = Set(discounted_price);
    }
    if let Some(tags) = payload.tags {
        active.tags = Set(non_blank("tags", tags)?);
    }
    if let Some(weight_kg) = payload.weight_kg {
        active.weight_kg = Set(weight_kg);
    }
    if let Some(height_cm) = payload.height_cm {
        active.height_cm = Set(height_cm);
    }
    if let Some(width_cm) = payload.width_cm {
        active.width_cm = Set(width_cm);
    }
    if let Some(length_cm) = payload.length_cm {
        active.length_cm = Set(length_cm);
    }

    let product = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Updated",
        product.into(),
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<ProductDeleted>> {
    ensure_admin(user)?;
    Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let referenced = OrderLines::find()
        .filter(LineCol::ProductId.eq(id))
        .count(&state.orm)
        .await?;
    if referenced > 0 {
        return Err(AppError::Validation(
            "product is part of existing orders and cannot be deleted".into(),
        ));
    }

    Products::delete_by_id(id).exec(&state.orm).await?;

    tracing::info!(product_id = %id, "product deleted");
    Ok(ApiResponse::success(
        "Deleted",
        ProductDeleted { id },
        Some(Meta::empty()),
    ))
}

fn non_blank(field: &str, value: String) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{field} must not be empty")));
    }
    Ok(value.to_string())
}

async fn ensure_name_free(state: &AppState, name: &str, except: Option<Uuid>) -> AppResult<()> {
    let mut finder = Products::find().filter(Column::Name.eq(name));
    if let Some(id) = except {
        finder = finder.filter(Column::Id.ne(id));
    }
    if finder.one(&state.orm).await?.is_some() {
        return Err(AppError::Validation(format!("a product named {name} already exists")));
    }
    Ok(())
}
