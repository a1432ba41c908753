use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::get,
};

use crate::{
    dto::orders::{
        CreateOrderRequest, DeleteOrderRequest, OrderDeleted, OrderList, OrderWithLines,
        UpdatePaymentStatusRequest,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Order,
    response::ApiResponse,
    services::{
        order_service,
        webhook::{SIGNATURE_HEADER, verify_signature},
    },
    state::AppState,
};

pub fn route() -> Router<AppState> {
    Router::new().route(
        "/",
        get(list_orders)
            .post(create_order)
            .patch(update_payment_status)
            .delete(delete_order),
    )
}

#[utoipa::path(
    get,
    path = "/api/orders",
    responses(
        (status = 200, description = "Caller's orders, or every order for admins", body = ApiResponse<OrderList>),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_orders(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Order created", body = ApiResponse<OrderWithLines>),
        (status = 400, description = "Invalid lines or missing address"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<Json<ApiResponse<OrderWithLines>>> {
    let resp = order_service::create_order(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/orders",
    request_body = UpdatePaymentStatusRequest,
    params(
        ("x-webhook-signature" = String, Header, description = "Hex HMAC-SHA256 of the raw body")
    ),
    responses(
        (status = 200, description = "Payment status recorded", body = ApiResponse<Order>),
        (status = 401, description = "Bad signature"),
        (status = 404, description = "No order for this payment id")
    ),
    tag = "Orders"
)]
pub async fn update_payment_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<ApiResponse<Order>>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    verify_signature(&state.webhook_secret, &body, signature)?;

    let payload: UpdatePaymentStatusRequest = serde_json::from_slice(&body)
        .map_err(|err| AppError::Validation(format!("invalid payload: {err}")))?;
    let resp = order_service::update_payment_status(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/orders",
    request_body = DeleteOrderRequest,
    responses(
        (status = 200, description = "Order deleted", body = ApiResponse<OrderDeleted>),
        (status = 400, description = "Missing order id"),
        (status = 403, description = "Order belongs to someone else"),
        (status = 404, description = "Order not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<DeleteOrderRequest>,
) -> AppResult<Json<ApiResponse<OrderDeleted>>> {
    let id = payload
        .id
        .ok_or_else(|| AppError::Validation("order id is required".into()))?;
    let resp = order_service::delete_order(&state, &user, id).await?;
    Ok(Json(resp))
}
