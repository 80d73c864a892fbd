//! API error handling
//!
//! Domain errors arrive pre-classified ([`BillingError`] knows whether it is
//! a validation, conflict, not-found, or transient failure); this module only
//! maps each class onto its HTTP status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use domain_billing::BillingError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::Validation(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg.clone())
            }
            ApiError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", msg.clone())
            }
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone())
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details: None,
        };

        (status, Json(body)).into_response()
    }
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        if err.is_not_found() {
            ApiError::NotFound(err.to_string())
        } else if err.is_conflict() {
            ApiError::Conflict(err.to_string())
        } else if err.is_validation() {
            ApiError::Validation(err.to_string())
        } else if err.is_transient() {
            ApiError::ServiceUnavailable(err.to_string())
        } else {
            ApiError::Internal(err.to_string())
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{InvoiceId, MedicineId, PortError};
    use domain_pharmacy::PharmacyError;

    #[test]
    fn test_billing_error_mapping() {
        let conflict: ApiError = BillingError::AlreadyPaid(InvoiceId::new()).into();
        assert!(matches!(conflict, ApiError::Conflict(_)));

        let missing: ApiError = BillingError::InvoiceNotFound(InvoiceId::new()).into();
        assert!(matches!(missing, ApiError::NotFound(_)));

        let invalid: ApiError =
            BillingError::Pharmacy(PharmacyError::InvalidQuantity {
                medicine_id: MedicineId::new(),
                quantity: 0,
            })
            .into();
        assert!(matches!(invalid, ApiError::Validation(_)));

        let transient: ApiError = BillingError::Store(PortError::connection("refused")).into();
        assert!(matches!(transient, ApiError::ServiceUnavailable(_)));
    }
}
