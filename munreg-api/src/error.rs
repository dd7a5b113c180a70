//! API error handling.
//!
//! Every failure leaves the server as `{ "message": ..., "errors"?: [...] }`.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use munreg_core::error::MunregError;
use munreg_core::validation::{FieldViolation, ValidationErrors};

pub(crate) const MSG_NOT_FOUND: &str = "Registration not found";
pub(crate) const MSG_INVALID_ID: &str = "Invalid registration ID";
pub(crate) const MSG_INVALID_DATA: &str = "Invalid registration data";
pub(crate) const MSG_INTERNAL: &str = "Internal Server Error";

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    errors: Option<Vec<FieldViolation>>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            errors: None,
        }
    }

    /// Bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Internal server error. The detail stays in the server log.
    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, MSG_INTERNAL)
    }

    /// Validation error carrying every field violation.
    pub fn validation(errors: ValidationErrors) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: MSG_INVALID_DATA.into(),
            errors: Some(errors.into_inner()),
        }
    }

    /// HTTP status of this error.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Client-facing message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Error response body.
#[derive(Serialize)]
struct ErrorResponse {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<FieldViolation>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            message: self.message,
            errors: self.errors,
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::validation(errors)
    }
}

impl From<MunregError> for ApiError {
    fn from(err: MunregError) -> Self {
        match err {
            MunregError::Validation(errors) => ApiError::validation(errors),
            MunregError::RegistrationNotFound(_) => ApiError::not_found(MSG_NOT_FOUND),
            MunregError::InvalidId(_) => ApiError::bad_request(MSG_INVALID_ID),
            MunregError::DuplicateUsername(_) => {
                ApiError::new(StatusCode::CONFLICT, err.to_string())
            }
            _ => {
                tracing::error!(error = %err, "Internal error");
                ApiError::internal()
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let status = match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        };
        ApiError::new(status, format!("{}: {}", MSG_INVALID_DATA, rejection.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_not_found_body() {
        let (status, json) = body_json(MunregError::RegistrationNotFound(3).into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json, serde_json::json!({ "message": "Registration not found" }));
    }

    #[tokio::test]
    async fn test_validation_body_lists_fields() {
        let errors = ValidationErrors::from(vec![
            FieldViolation::new("firstName", "First name is required"),
            FieldViolation::new("committees", "Please select at least one committee"),
        ]);
        let (status, json) = body_json(MunregError::Validation(errors).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Invalid registration data");
        assert_eq!(json["errors"].as_array().unwrap().len(), 2);
        assert_eq!(json["errors"][1]["field"], "committees");
    }

    #[tokio::test]
    async fn test_infrastructure_detail_not_leaked() {
        let (status, json) =
            body_json(MunregError::Store("disk on fire at /var/lib/munreg".into()).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json, serde_json::json!({ "message": "Internal Server Error" }));
    }

    #[test]
    fn test_invalid_id_is_bad_request() {
        let err = ApiError::from(MunregError::InvalidId("abc".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Invalid registration ID");
    }
}
