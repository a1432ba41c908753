use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::AppError;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpsertAddressRequest {
    pub recipient_name: String,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub district: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

impl UpsertAddressRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let required = [
            ("recipient_name", &self.recipient_name),
            ("street", &self.street),
            ("number", &self.number),
            ("district", &self.district),
            ("city", &self.city),
            ("state", &self.state),
            ("zip_code", &self.zip_code),
        ];
        match required.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((field, _)) => Err(AppError::Validation(format!("{field} is required"))),
            None => Ok(()),
        }
    }
}
