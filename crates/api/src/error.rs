//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{DomainError, OrderError};
use payments::PaymentError;
use store::StoreError;

const INTERNAL_MESSAGE: &str = "Internal server error";

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Domain logic error.
    Domain(DomainError),
    /// Checkout or confirmation error.
    Payment(PaymentError),
    /// Store error outside any service.
    Store(StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Payment(err) => payment_error_to_response(err),
            ApiError::Store(err) => internal(&err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

/// Logs the real cause and hides it from the client.
fn internal(err: &dyn std::error::Error) -> (StatusCode, String) {
    tracing::error!(error = %err, "internal server error");
    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::Order(order_err) => match order_err {
            OrderError::ItemNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
            OrderError::InsufficientStock { .. } => (StatusCode::CONFLICT, order_err.to_string()),
            OrderError::InvalidQuantity { .. } | OrderError::InvalidStatus { .. } => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
        },
        DomainError::OrderNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        // Already generic; the detail lives in the reconciliation log.
        DomainError::CompensationFailed { .. } => {
            tracing::error!(error = %err, "order placement left an inconsistency");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
        DomainError::Store(_) => internal(&err),
    }
}

fn payment_error_to_response(err: PaymentError) -> (StatusCode, String) {
    match err {
        PaymentError::SessionNotFound(_) | PaymentError::OrderNotFound(_) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        PaymentError::InvalidAmount(_)
        | PaymentError::MissingDescription
        | PaymentError::GatewayRejected(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        PaymentError::OrderAlreadyPaid(_) => (StatusCode::CONFLICT, err.to_string()),
        PaymentError::GatewayUnavailable(_) | PaymentError::MalformedSession(_) => {
            tracing::warn!(error = %err, "payment gateway failure");
            (StatusCode::BAD_GATEWAY, err.to_string())
        }
        PaymentError::Inconsistency { .. } => {
            tracing::error!(error = %err, "payment confirmation left an inconsistency");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
        PaymentError::Store(_) => internal(&err),
        PaymentError::Domain(domain_err) => domain_error_to_response(domain_err),
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        ApiError::Payment(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}
