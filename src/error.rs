use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::response::{ApiResponse, Meta};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Please fill in every field")]
    MissingField,

    #[error("Email not provided by the identity provider")]
    MissingEmail,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("This email is registered with a social login, sign in with Google instead")]
    SocialOnlyAccount,

    #[error("Failed to create user")]
    UserCreation(#[source] sea_orm::DbErr),

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Invalid webhook signature")]
    InvalidSignature,

    #[error("User not found")]
    UserNotFound,

    #[error("Order not found")]
    OrderNotFound,

    #[error("Forbidden")]
    Forbidden,

    #[error("Bad Request {0}")]
    Validation(String),

    #[error("No valid image was uploaded")]
    NoValidImages,

    #[error("Not Found")]
    NotFound,

    #[error("Internal Server Error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingField
            | AppError::MissingEmail
            | AppError::Validation(_)
            | AppError::NoValidImages => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials
            | AppError::SocialOnlyAccount
            | AppError::Unauthenticated
            | AppError::InvalidSignature => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::UserNotFound | AppError::OrderNotFound | AppError::NotFound => {
                StatusCode::NOT_FOUND
            }
            AppError::UserCreation(_) | AppError::OrmError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::UserCreation(err) => tracing::error!(error = %err, "user creation failed"),
            AppError::OrmError(err) => tracing::error!(error = %err, "database error"),
            AppError::Internal(err) => tracing::error!(error = %err, "internal error"),
            _ => {}
        }

        let message = self.to_string();
        let body = ApiResponse {
            message: message.clone(),
            data: Some(ErrorData { error: message }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_failures_are_collapsed_to_a_generic_message() {
        let err = AppError::from(sea_orm::DbErr::Custom("relation \"users\" missing".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Internal Server Error");
    }

    #[test]
    fn auth_failures_map_to_401() {
        for err in [
            AppError::InvalidCredentials,
            AppError::SocialOnlyAccount,
            AppError::Unauthenticated,
            AppError::InvalidSignature,
        ] {
            assert_eq!(err.status(), StatusCode::UNAUTHORIZED, "{err}");
        }
    }

    #[test]
    fn lookup_and_validation_failures_keep_their_kind() {
        assert_eq!(AppError::OrderNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::UserNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NoValidImages.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::Validation("lines must not be empty".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
