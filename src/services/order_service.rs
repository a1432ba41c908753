use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, Set, SqlErr,
    TransactionTrait,
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    dto::orders::{
        CreateOrderRequest, OrderDeleted, OrderList, OrderView, OrderWithLines,
        UpdatePaymentStatusRequest,
    },
    entity::{
        addresses::Entity as Addresses,
        order_lines::{ActiveModel as OrderLineActive, Column as LineCol, Entity as OrderLines},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        products::{self, Column as ProdCol, Entity as Products},
        users::{self, Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderLine, Product, User},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Shipment status every new order starts with.
pub const INITIAL_SHIPMENT_STATUS: &str = "processing";

pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderWithLines>> {
    validate_lines(&payload)?;

    let (owner, address) = Users::find()
        .filter(UserCol::Email.eq(user.email.as_str()))
        .find_also_related(Addresses)
        .one(&state.orm)
        .await?
        .ok_or(AppError::UserNotFound)?;
    let address = address.ok_or_else(|| {
        AppError::Validation("a shipping address is required before checkout".into())
    })?;

    let taken = Orders::find()
        .filter(OrderCol::PaymentId.eq(payload.payment_id))
        .one(&state.orm)
        .await?;
    if taken.is_some() {
        return Err(AppError::Validation(format!(
            "payment id {} is already attached to an order",
            payload.payment_id
        )));
    }

    let product_ids: Vec<Uuid> = payload
        .lines
        .iter()
        .map(|line| line.product_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let products: HashMap<Uuid, products::Model> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut priced_lines = Vec::with_capacity(payload.lines.len());
    for line in &payload.lines {
        let product = products.get(&line.product_id).ok_or_else(|| {
            AppError::Validation(format!("product {} does not exist", line.product_id))
        })?;
        priced_lines.push((line.product_id, line.quantity, product.effective_price()));
    }
    let total_item_count = payload
        .lines
        .iter()
        .try_fold(0_i32, |acc, line| acc.checked_add(line.quantity))
        .ok_or_else(|| AppError::Validation("total quantity is too large".into()))?;

    let recipient_name = match payload.address.name.trim() {
        "" => address.recipient_name.clone(),
        name => name.to_string(),
    };

    let now = Utc::now();
    let txn = state.orm.begin().await?;

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(owner.id),
        address_id: Set(address.id),
        shipping_type: Set(payload.shipping_type),
        total_value: Set(payload.total),
        freight_value: Set(payload.freight),
        total_item_count: Set(total_item_count),
        recipient_name: Set(recipient_name),
        payment_method: Set(payload.payment_method),
        payment_id: Set(payload.payment_id),
        status: Set(payload.status),
        shipment_status: Set(INITIAL_SHIPMENT_STATUS.into()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await
    .map_err(|err| payment_conflict(err, payload.payment_id))?;

    let mut lines: Vec<OrderLine> = Vec::with_capacity(priced_lines.len());
    for (product_id, quantity, unit_price) in priced_lines {
        let line = OrderLineActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(product_id),
            quantity: Set(quantity),
            unit_price: Set(unit_price),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;
        lines.push(line.into());
    }

    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        user_id = %owner.id,
        payment_id = order.payment_id,
        items = total_item_count,
        "order created"
    );

    Ok(ApiResponse::success(
        "Order created",
        OrderWithLines {
            order: order.into(),
            lines,
        },
        Some(Meta::empty()),
    ))
}

/// Payment gateway callback: overwrite the status of the order holding
/// `payment_id`. The caller has already checked the webhook signature.
pub async fn update_payment_status(
    state: &AppState,
    payload: UpdatePaymentStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    let existing = Orders::find()
        .filter(OrderCol::PaymentId.eq(payload.payment_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::OrderNotFound)?;

    let mut active: OrderActive = existing.into();
    active.status = Set(payload.status);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    tracing::info!(order_id = %order.id, payment_id = order.payment_id, status = %order.status, "payment status updated");

    Ok(ApiResponse::success(
        "Order updated",
        order.into(),
        Some(Meta::empty()),
    ))
}

/// Admins see every order, everyone else only their own.
pub async fn list_orders(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderList>> {
    let caller = Users::find()
        .filter(UserCol::Email.eq(user.email.as_str()))
        .one(&state.orm)
        .await?
        .ok_or(AppError::UserNotFound)?;

    let mut finder = Orders::find().order_by_desc(OrderCol::CreatedAt);
    if caller.role != "admin" {
        finder = finder.filter(OrderCol::UserId.eq(caller.id));
    }
    let orders = finder.all(&state.orm).await?;

    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let lines = OrderLines::find()
        .filter(LineCol::OrderId.is_in(order_ids))
        .order_by_asc(LineCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let product_ids: HashSet<Uuid> = lines.iter().map(|l| l.product_id).collect();
    let products: HashMap<Uuid, Product> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|p| (p.id, Product::from(p)))
        .collect();

    let user_ids: HashSet<Uuid> = orders.iter().map(|o| o.user_id).collect();
    let owners: HashMap<Uuid, User> = Users::find()
        .filter(UserCol::Id.is_in(user_ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|u: users::Model| (u.id, User::from(u)))
        .collect();

    let mut lines_by_order: HashMap<Uuid, Vec<Value>> = HashMap::new();
    for line in lines {
        let Some(product) = products.get(&line.product_id) else {
            continue;
        };
        let line: OrderLine = line.into();
        lines_by_order
            .entry(line.order_id)
            .or_default()
            .push(line_view(product, &line)?);
    }

    let items = orders
        .into_iter()
        .map(|order| OrderView {
            user: owners.get(&order.user_id).cloned(),
            lines: lines_by_order.remove(&order.id).unwrap_or_default(),
            order: order.into(),
        })
        .collect::<Vec<_>>();

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items },
        Some(Meta::new(1, total, total)),
    ))
}

/// Only the owner may delete an order; there is no admin override.
pub async fn delete_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderDeleted>> {
    let (order, owner) = Orders::find_by_id(id)
        .find_also_related(Users)
        .one(&state.orm)
        .await?
        .ok_or(AppError::OrderNotFound)?;

    let owned = owner.is_some_and(|owner| owner.email == user.email);
    if !owned {
        tracing::warn!(order_id = %order.id, requester = %user.user_id, "order delete refused");
        return Err(AppError::Forbidden);
    }

    let txn = state.orm.begin().await?;
    OrderLines::delete_many()
        .filter(LineCol::OrderId.eq(order.id))
        .exec(&txn)
        .await?;
    Orders::delete_by_id(order.id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!(order_id = %order.id, "order deleted");
    Ok(ApiResponse::success(
        "Order deleted",
        OrderDeleted { id: order.id },
        Some(Meta::empty()),
    ))
}

/// A concurrent checkout can claim the payment id between the lookup and the insert.
fn payment_conflict(err: DbErr, payment_id: i64) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Validation(format!(
            "payment id {payment_id} is already attached to an order"
        )),
        _ => err.into(),
    }
}

fn validate_lines(payload: &CreateOrderRequest) -> AppResult<()> {
    if payload.lines.is_empty() {
        return Err(AppError::Validation("an order needs at least one line".into()));
    }
    if let Some(line) = payload.lines.iter().find(|line| line.quantity <= 0) {
        return Err(AppError::Validation(format!(
            "quantity for product {} must be positive",
            line.product_id
        )));
    }
    if payload.freight < 0 || payload.total < 0 {
        return Err(AppError::Validation("amounts must not be negative".into()));
    }
    Ok(())
}

fn line_view(product: &Product, line: &OrderLine) -> AppResult<Value> {
    let base = serde_json::to_value(product).map_err(anyhow::Error::from)?;
    let overlay = serde_json::json!({
        "quantity": line.quantity,
        "unit_price": line.unit_price,
    });
    Ok(shallow_merge(base, overlay))
}

/// Merge two JSON objects one level deep; keys from `overlay` win.
fn shallow_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base), Value::Object(overlay)) => {
            base.extend(overlay);
            Value::Object(base)
        }
        (_, overlay) => overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::orders::{OrderAddressRequest, OrderLineRequest};
    use serde_json::json;

    fn request(lines: Vec<(Uuid, i32)>) -> CreateOrderRequest {
        CreateOrderRequest {
            lines: lines
                .into_iter()
                .map(|(product_id, quantity)| OrderLineRequest {
                    product_id,
                    quantity,
                })
                .collect(),
            freight: 1500,
            shipping_type: "PAC".into(),
            total: 10000,
            address: OrderAddressRequest::default(),
            status: "pending".into(),
            payment_method: "pix".into(),
            payment_id: 1,
        }
    }

    #[test]
    fn overlay_fields_win_on_collision() {
        let merged = shallow_merge(
            json!({"id": "p1", "name": "Mug", "quantity": 99, "price": 10}),
            json!({"quantity": 2, "unit_price": 8}),
        );
        assert_eq!(
            merged,
            json!({"id": "p1", "name": "Mug", "quantity": 2, "price": 10, "unit_price": 8})
        );
    }

    #[test]
    fn empty_or_non_positive_lines_are_rejected() {
        assert!(matches!(
            validate_lines(&request(vec![])),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            validate_lines(&request(vec![(Uuid::new_v4(), 0)])),
            Err(AppError::Validation(_))
        ));
        assert!(validate_lines(&request(vec![(Uuid::new_v4(), 3)])).is_ok());
    }
}
