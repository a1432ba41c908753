use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{error::AppError, models::Product};

pub const DEFAULT_WEIGHT_KG: f64 = 0.3;

/// Scalar fields of a product submitted through the multipart admin form.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: i64,
    pub discounted_price: i64,
    pub tags: String,
    pub weight_kg: f64,
    pub height_cm: i32,
    pub width_cm: i32,
    pub length_cm: i32,
}

impl NewProduct {
    pub fn from_fields(fields: &HashMap<String, String>) -> Result<Self, AppError> {
        let product = Self {
            name: required_text(fields, "name")?,
            description: required_text(fields, "description")?,
            tags: required_text(fields, "tags")?,
            price: required_number(fields, "price")?,
            discounted_price: optional_number(fields, "discounted_price")?.unwrap_or(0),
            weight_kg: optional_number(fields, "weight_kg")?.unwrap_or(DEFAULT_WEIGHT_KG),
            height_cm: optional_number(fields, "height_cm")?.unwrap_or(0),
            width_cm: optional_number(fields, "width_cm")?.unwrap_or(0),
            length_cm: optional_number(fields, "length_cm")?.unwrap_or(0),
        };
        product.validate()?;
        Ok(product)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.price <= 0 {
            return Err(AppError::Validation("price must be positive".into()));
        }
        if self.discounted_price < 0 {
            return Err(AppError::Validation("discounted_price must not be negative".into()));
        }
        validate_dimensions(
            Some(self.weight_kg),
            [Some(self.height_cm), Some(self.width_cm), Some(self.length_cm)],
        )
    }
}

/// Weight must be a finite, non-negative number and sizes non-negative.
pub fn validate_dimensions(
    weight_kg: Option<f64>,
    sizes_cm: [Option<i32>; 3],
) -> Result<(), AppError> {
    if weight_kg.is_some_and(|w| !w.is_finite() || w < 0.0) {
        return Err(AppError::Validation("weight_kg must be a non-negative number".into()));
    }
    if sizes_cm.iter().flatten().any(|size| *size < 0) {
        return Err(AppError::Validation("dimensions must not be negative".into()));
    }
    Ok(())
}

fn required_text(fields: &HashMap<String, String>, key: &str) -> Result<String, AppError> {
    fields
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| AppError::Validation(format!("{key} is required")))
}

fn required_number<T: std::str::FromStr>(
    fields: &HashMap<String, String>,
    key: &str,
) -> Result<T, AppError> {
    optional_number(fields, key)?.ok_or_else(|| AppError::Validation(format!("{key} is required")))
}

fn optional_number<T: std::str::FromStr>(
    fields: &HashMap<String, String>,
    key: &str,
) -> Result<Option<T>, AppError> {
    match fields.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| AppError::Validation(format!("{key} must be a number"))),
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub discounted_price: Option<i64>,
    pub tags: Option<String>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<i32>,
    pub width_cm: Option<i32>,
    pub length_cm: Option<i32>,
}

#[derive(Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<Product>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductCreated {
    pub product: Product,
    pub failed: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductDeleted {
    pub id: Uuid,
}
