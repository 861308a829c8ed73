use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::models::survey::SurveyError;
use domain::services::{AdmissionRefusal, CancellationRefusal};
use serde::Serialize;
use thiserror::Error;

use crate::services::{BatchError, PaymentError, WebhookError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A request that is well-formed but refused by the current state,
    /// such as cancelling twice. Reported as 400 with a specific code.
    #[error("Conflict: {message}")]
    Conflict { code: &'static str, message: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Payload too large")]
    PayloadTooLarge,

    /// A required integration (payments, email) has no credentials.
    #[error("{0} not configured")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict {
            code: "conflict",
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationDetail {
    pub field: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Conflict { code, message } => (StatusCode::BAD_REQUEST, code, message),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg),
            ApiError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                "Too many requests. Please try again later.".into(),
            ),
            ApiError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "payload_too_large",
                "Request body is too large".into(),
            ),
            ApiError::Configuration(what) => {
                tracing::error!(integration = %what, "Integration not configured");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "not_configured",
                    format!("{what} not configured"),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                )
            }
        };

        let body = ErrorBody {
            error: message,
            code,
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".into()),
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                Some("23505") => ApiError::conflict("Resource already exists"),
                Some("23503") => ApiError::NotFound("Referenced resource not found".into()),
                _ => ApiError::Internal(format!("Database error: {}", db_err)),
            },
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

/// Maps an extractor rejection onto the envelope. Client-side failures
/// (bad JSON, wrong content type, unparsable query or path) become 400.
fn from_rejection(status: StatusCode, text: String) -> ApiError {
    match status {
        StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge,
        s if s.is_server_error() => ApiError::Internal(text),
        _ => ApiError::Validation(text),
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        from_rejection(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        from_rejection(rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        from_rejection(rejection.status(), rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details = validation_details(&errors);

        let message = match details.as_slice() {
            [] => "Invalid request".to_string(),
            [only] => only.message.clone(),
            many => many
                .iter()
                .map(|d| format!("{}: {}", d.field, d.message))
                .collect::<Vec<_>>()
                .join("; "),
        };

        ApiError::Validation(message)
    }
}

impl From<validator::ValidationError> for ApiError {
    fn from(error: validator::ValidationError) -> Self {
        ApiError::Validation(
            error
                .message
                .map(|m| m.to_string())
                .unwrap_or_else(|| error.code.to_string()),
        )
    }
}

/// Flattens field errors, including nested list entries such as `children[0].name`.
pub fn validation_details(errors: &validator::ValidationErrors) -> Vec<ValidationDetail> {
    use validator::ValidationErrorsKind;

    let mut details = Vec::new();
    for (field, kind) in errors.errors() {
        match kind {
            ValidationErrorsKind::Field(errs) => {
                details.extend(errs.iter().map(|e| ValidationDetail {
                    field: field.to_string(),
                    message: e
                        .message
                        .clone()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid {field}")),
                }));
            }
            ValidationErrorsKind::Struct(inner) => {
                details.extend(validation_details(inner).into_iter().map(|d| ValidationDetail {
                    field: format!("{field}.{}", d.field),
                    message: d.message,
                }));
            }
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    details.extend(validation_details(inner).into_iter().map(|d| {
                        ValidationDetail {
                            field: format!("{field}[{index}].{}", d.field),
                            message: d.message,
                        }
                    }));
                }
            }
        }
    }
    details
}

impl From<AdmissionRefusal> for ApiError {
    fn from(refusal: AdmissionRefusal) -> Self {
        ApiError::Conflict {
            code: refusal.as_str(),
            message: refusal.to_string(),
        }
    }
}

impl From<CancellationRefusal> for ApiError {
    fn from(refusal: CancellationRefusal) -> Self {
        match refusal {
            CancellationRefusal::NotFound => ApiError::NotFound(refusal.to_string()),
            CancellationRefusal::AlreadyCancelled
            | CancellationRefusal::EventPassed
            | CancellationRefusal::NotConfirmed => {
                ApiError::Conflict {
                    code: refusal.as_str(),
                    message: refusal.to_string(),
                }
            }
        }
    }
}

impl From<SurveyError> for ApiError {
    fn from(err: SurveyError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::NotConfigured(what) => ApiError::Configuration(what.to_string()),
            PaymentError::MissingSignature
            | PaymentError::InvalidSignature
            | PaymentError::TimestampOutOfTolerance
            | PaymentError::MalformedPayload(_) => ApiError::Validation(err.to_string()),
            PaymentError::AmountTooSmall => ApiError::Validation(err.to_string()),
            PaymentError::Http(_) | PaymentError::Provider(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<BatchError> for ApiError {
    fn from(err: BatchError) -> Self {
        match err {
            BatchError::EventNotFound => ApiError::NotFound(err.to_string()),
            BatchError::NoPhotoAlbum => ApiError::Validation(err.to_string()),
            BatchError::Database(e) => e.into(),
        }
    }
}

impl From<WebhookError> for ApiError {
    fn from(err: WebhookError) -> Self {
        match err {
            WebhookError::Malformed { .. } => ApiError::Validation(err.to_string()),
            WebhookError::Database(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use validator::Validate;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_api_error_unauthorized() {
        let error = ApiError::Unauthorized("test message".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_api_error_not_found() {
        let error = ApiError::NotFound("resource not found".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_api_error_conflict_is_bad_request() {
        let response = ApiError::conflict("already exists").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_api_error_rate_limited() {
        let response = ApiError::RateLimited.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_payload_too_large() {
        let response = ApiError::PayloadTooLarge.into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_rejection_status_mapping() {
        assert!(matches!(
            from_rejection(StatusCode::UNPROCESSABLE_ENTITY, "bad".into()),
            ApiError::Validation(_)
        ));
        assert!(matches!(
            from_rejection(StatusCode::UNSUPPORTED_MEDIA_TYPE, "bad".into()),
            ApiError::Validation(_)
        ));
        assert!(matches!(
            from_rejection(StatusCode::PAYLOAD_TOO_LARGE, "big".into()),
            ApiError::PayloadTooLarge
        ));
        assert!(matches!(
            from_rejection(StatusCode::INTERNAL_SERVER_ERROR, "oops".into()),
            ApiError::Internal(_)
        ));
    }

    #[tokio::test]
    async fn test_envelope_shape() {
        let response = ApiError::Validation("Invalid email".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid email");
        assert_eq!(body["code"], "validation_error");
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let response =
            ApiError::Internal("database connection failed".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "An internal error occurred");
    }

    #[tokio::test]
    async fn test_configuration_error_names_integration() {
        let response = ApiError::Configuration("Payments".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Payments not configured");
        assert_eq!(body["code"], "not_configured");
    }

    #[tokio::test]
    async fn test_refusals_map_to_codes() {
        let body = body_json(ApiError::from(AdmissionRefusal::FullyBooked).into_response()).await;
        assert_eq!(body["code"], "fully_booked");

        let response = ApiError::from(CancellationRefusal::AlreadyCancelled).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "already_cancelled");

        let response = ApiError::from(CancellationRefusal::EventPassed).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ApiError::from(CancellationRefusal::NotFound).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = ApiError::from(CancellationRefusal::NotConfirmed).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "not_confirmed");
    }

    #[test]
    fn test_api_error_display() {
        assert_eq!(
            format!("{}", ApiError::NotFound("test".to_string())),
            "Not found: test"
        );
        assert_eq!(
            format!("{}", ApiError::Configuration("Email".to_string())),
            "Email not configured"
        );
        assert_eq!(format!("{}", ApiError::RateLimited), "Rate limited");
    }

    #[test]
    fn test_from_sqlx_row_not_found() {
        let error: ApiError = sqlx::Error::RowNotFound.into();
        match error {
            ApiError::NotFound(msg) => assert_eq!(msg, "Resource not found"),
            _ => panic!("Expected NotFound error"),
        }
    }

    #[test]
    fn test_from_nested_validation_errors() {
        let request: domain::models::registration::CreateRegistrationRequest =
            serde_json::from_value(serde_json::json!({
                "eventId": uuid::Uuid::new_v4(),
                "parentName": "Sam",
                "parentEmail": "sam@example.com",
                "children": [{ "name": "" }]
            }))
            .unwrap();
        let errors = request.validate().unwrap_err();
        let details = validation_details(&errors);
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].field, "children[0].name");

        match ApiError::from(errors) {
            ApiError::Validation(msg) => assert_eq!(msg, "Child name must be 1-100 characters"),
            other => panic!("Expected Validation error, got {other:?}"),
        }
    }
}
