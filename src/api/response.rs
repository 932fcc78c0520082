//! Response types for the payroll tracker API.
//!
//! This module defines the JSON bodies returned by the handlers and the
//! mapping from [`PayrollError`] to HTTP status codes.

use std::collections::BTreeMap;

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculation::PayrollSummary;
use crate::error::PayrollError;
use crate::models::{FixedFields, ResolvedCustomValue, SalaryRecord, User};

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
#[derive(Debug)]
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// A 400 response carrying `error`.
    pub fn bad_request(error: ApiError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error,
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        let unauthorized = self.status == StatusCode::UNAUTHORIZED;
        let mut response = (self.status, Json(self.error)).into_response();
        if unauthorized {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<PayrollError> for ApiErrorResponse {
    fn from(error: PayrollError) -> Self {
        let message = error.to_string();
        let (status, code) = match &error {
            PayrollError::ConfigNotFound { .. } | PayrollError::ConfigParseError { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR")
            }
            PayrollError::InvalidAmount { .. } => (StatusCode::BAD_REQUEST, "INVALID_AMOUNT"),
            PayrollError::InvalidFieldType { .. } => {
                (StatusCode::BAD_REQUEST, "INVALID_FIELD_TYPE")
            }
            PayrollError::InvalidCategory { .. } => (StatusCode::BAD_REQUEST, "INVALID_CATEGORY"),
            PayrollError::DuplicateFieldKey { .. } => {
                (StatusCode::BAD_REQUEST, "DUPLICATE_FIELD_KEY")
            }
            PayrollError::InvalidPeriod { .. } => (StatusCode::BAD_REQUEST, "INVALID_PERIOD"),
            PayrollError::DuplicateRecord { .. } => (StatusCode::BAD_REQUEST, "DUPLICATE_RECORD"),
            PayrollError::RecordNotFound { .. } => (StatusCode::NOT_FOUND, "RECORD_NOT_FOUND"),
            PayrollError::FieldNotFound { .. } => (StatusCode::NOT_FOUND, "FIELD_NOT_FOUND"),
            PayrollError::PersonNotFound { .. } => (StatusCode::NOT_FOUND, "PERSON_NOT_FOUND"),
            PayrollError::DuplicateUsername { .. } => {
                (StatusCode::BAD_REQUEST, "DUPLICATE_USERNAME")
            }
            PayrollError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            PayrollError::Unauthenticated { .. } => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            PayrollError::StorageError { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR")
            }
            PayrollError::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let error = match error {
            PayrollError::InvalidCategory { valid, .. } => {
                ApiError::with_details(code, message, format!("Valid categories: {}", valid.join(", ")))
            }
            _ => ApiError::new(code, message),
        };
        ApiErrorResponse { status, error }
    }
}

/// Body returned by a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The signed bearer token.
    pub access_token: String,
    /// Always `bearer`.
    pub token_type: String,
    /// Token lifetime in seconds.
    pub expires_in: i64,
}

/// Public view of a user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserOut {
    /// User id.
    pub id: u64,
    /// Login name.
    pub username: String,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserOut {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            created_at: user.created_at,
        }
    }
}

/// Acknowledgement body for deletions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OkResponse {
    /// Always true.
    pub ok: bool,
}

impl OkResponse {
    /// The success acknowledgement.
    pub const OK: OkResponse = OkResponse { ok: true };
}

/// A salary record together with its derived totals and custom values.
///
/// The `tax` field carries the rounded tax from the derived totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryOut {
    /// Record id.
    pub id: u64,
    /// The person the record belongs to.
    pub person_id: u64,
    /// Calendar year.
    pub year: i32,
    /// Calendar month.
    pub month: u32,
    /// Fixed monetary components.
    #[serde(flatten)]
    pub fixed: FixedFields,
    /// Base + performance + all custom income.
    pub total_income: Decimal,
    /// All deductions except tax.
    pub total_deductions: Decimal,
    /// Same as total income.
    pub gross_income: Decimal,
    /// Gross income minus deductions and tax.
    pub net_income: Decimal,
    /// Cash income minus deductions and tax.
    pub actual_take_home: Decimal,
    /// Non-cash custom income.
    pub non_cash_benefits: Decimal,
    /// Free-form note.
    pub note: Option<String>,
    /// Custom amounts keyed by field key.
    pub custom_fields: BTreeMap<String, Decimal>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last modified.
    pub updated_at: DateTime<Utc>,
}

impl SalaryOut {
    /// Assembles the view from a record, its derived totals and its custom
    /// values.
    pub fn new(
        record: &SalaryRecord,
        summary: &PayrollSummary,
        custom_values: &[ResolvedCustomValue],
    ) -> Self {
        let mut fixed = record.fixed;
        fixed.tax = summary.tax;
        Self {
            id: record.id,
            person_id: record.person_id,
            year: record.year,
            month: record.month,
            fixed,
            total_income: summary.total_income,
            total_deductions: summary.total_deductions,
            gross_income: summary.gross_income,
            net_income: summary.net_income,
            actual_take_home: summary.actual_take_home,
            non_cash_benefits: summary.non_cash_benefits,
            note: record.note.clone(),
            custom_fields: custom_values
                .iter()
                .map(|v| (v.field.field_key.clone(), v.amount))
                .collect(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_serialization() {
        let error = ApiError::new("TEST_ERROR", "Test message");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"code\":\"TEST_ERROR\""));
        assert!(json.contains("\"message\":\"Test message\""));
        assert!(!json.contains("details"));
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let response: ApiErrorResponse = PayrollError::RecordNotFound { id: 9 }.into();
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.error.code, "RECORD_NOT_FOUND");
    }

    #[test]
    fn test_invalid_category_lists_valid_keys_in_details() {
        let response: ApiErrorResponse = PayrollError::InvalidCategory {
            field_type: "deduction".to_string(),
            category: "bonus".to_string(),
            valid: vec!["insurance".to_string(), "tax".to_string()],
        }
        .into();
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            response.error.details.as_deref(),
            Some("Valid categories: insurance, tax")
        );
    }

    #[test]
    fn test_auth_errors_map_to_401_with_challenge() {
        let response: ApiErrorResponse = PayrollError::Unauthenticated {
            message: "missing bearer token".to_string(),
        }
        .into();
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);

        let response = response.into_response();
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }

    #[test]
    fn test_storage_error_maps_to_500() {
        let response: ApiErrorResponse = PayrollError::StorageError {
            message: "disk full".to_string(),
        }
        .into();
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
