use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{addresses, banners, order_lines, orders, products, users};

/// Public view of an account; the password hash never leaves the store.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub image: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Address {
    pub id: Uuid,
    pub user_id: Uuid,
    pub recipient_name: String,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub district: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub discounted_price: i64,
    pub tags: String,
    pub images: Vec<String>,
    pub weight_kg: f64,
    pub height_cm: i32,
    pub width_cm: i32,
    pub length_cm: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub address_id: Uuid,
    pub shipping_type: String,
    pub total_value: i64,
    pub freight_value: i64,
    pub total_item_count: i32,
    pub recipient_name: String,
    pub payment_method: String,
    pub payment_id: i64,
    pub status: String,
    pub shipment_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderLine {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Banner {
    pub id: Uuid,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            name: model.name,
            image: model.image,
            role: model.role,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<addresses::Model> for Address {
    fn from(model: addresses::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            recipient_name: model.recipient_name,
            street: model.street,
            number: model.number,
            complement: model.complement,
            district: model.district,
            city: model.city,
            state: model.state,
            zip_code: model.zip_code,
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<products::Model> for Product {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            price: model.price,
            discounted_price: model.discounted_price,
            tags: model.tags,
            images: image_urls(&model.images),
            weight_kg: model.weight_kg,
            height_cm: model.height_cm,
            width_cm: model.width_cm,
            length_cm: model.length_cm,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            address_id: model.address_id,
            shipping_type: model.shipping_type,
            total_value: model.total_value,
            freight_value: model.freight_value,
            total_item_count: model.total_item_count,
            recipient_name: model.recipient_name,
            payment_method: model.payment_method,
            payment_id: model.payment_id,
            status: model.status,
            shipment_status: model.shipment_status,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<order_lines::Model> for OrderLine {
    fn from(model: order_lines::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            quantity: model.quantity,
            unit_price: model.unit_price,
        }
    }
}

impl From<banners::Model> for Banner {
    fn from(model: banners::Model) -> Self {
        Self {
            id: model.id,
            images: image_urls(&model.images),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// Read a stored JSON array of URLs, skipping anything that is not a string.
pub fn image_urls(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}
