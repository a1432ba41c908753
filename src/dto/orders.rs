use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Order, OrderLine, User};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OrderLineRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Shipping block sent at checkout.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct OrderAddressRequest {
    /// Recipient printed on the parcel.
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub lines: Vec<OrderLineRequest>,
    pub freight: i64,
    pub shipping_type: String,
    pub total: i64,
    #[serde(default)]
    pub address: OrderAddressRequest,
    pub status: String,
    pub payment_method: String,
    #[serde(deserialize_with = "payment_id_from_number_or_string")]
    #[schema(value_type = i64)]
    pub payment_id: i64,
}

/// Payment gateway callback.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdatePaymentStatusRequest {
    pub status: String,
    #[serde(deserialize_with = "payment_id_from_number_or_string")]
    #[schema(value_type = i64)]
    pub payment_id: i64,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DeleteOrderRequest {
    pub id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithLines {
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

/// An order as listed: each line is the product merged with the line's
/// quantity and unit price.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub user: Option<User>,
    #[schema(value_type = Vec<Object>)]
    pub lines: Vec<Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<OrderView>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDeleted {
    pub id: Uuid,
}

/// Gateways send the payment id either as a JSON number or a numeric string.
fn payment_id_from_number_or_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| serde::de::Error::custom("payment_id must be numeric")),
    }
}
