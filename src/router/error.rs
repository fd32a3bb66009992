//! JSON error responses for the REST API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::cart::aggregate::CartError;
use crate::catalog::CatalogError;
use crate::checkout::CheckoutError;
use crate::gift::GiftError;

/// An HTTP status with a message for the client.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        tracing::error!(error = %err, "catalog read failed");
        Self::new(StatusCode::BAD_GATEWAY, "تعذر تحميل المنتجات، يرجى المحاولة مرة أخرى")
    }
}

impl From<CartError> for ApiError {
    fn from(err: CartError) -> Self {
        Self::unprocessable(err.to_string())
    }
}

impl From<GiftError> for ApiError {
    fn from(err: GiftError) -> Self {
        match err {
            GiftError::NoCandidates(_) => Self::not_found(err.to_string()),
            GiftError::WrongMode { .. } => Self::conflict(err.to_string()),
            GiftError::UnknownCandidate(_) => Self::unprocessable(err.to_string()),
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        let status = match &err {
            CheckoutError::InvalidCustomer { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            CheckoutError::EmptyCart => StatusCode::BAD_REQUEST,
            CheckoutError::InProgress => StatusCode::CONFLICT,
            CheckoutError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            CheckoutError::Backend(_) => StatusCode::BAD_GATEWAY,
            CheckoutError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.user_message())
    }
}
