// HTTP API Error Types
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::auth::AuthError;
use crate::forms::FieldErrors;
use crate::services::{codes, ErrorKind, FeatureSchemaError, ServiceError};

/// HTTP API error with a status, a client-safe message and the numeric error code
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest { message: String, code: u16 },
    ValidationError {
        message: String,
        code: u16,
        field_errors: Option<FieldErrors>,
    },
    InvalidJson(String),

    // 401 Unauthorized
    Unauthorized { message: String, code: u16 },

    // 404 Not Found
    NotFound { message: String, code: u16 },

    // 409 Conflict
    Conflict { message: String, code: u16 },

    // 422 Unprocessable Entity (well-formed request whose feature values break the schema)
    UnprocessableEntity {
        message: String,
        code: u16,
        field_errors: FieldErrors,
    },

    // 500 Internal Server Error
    InternalServerError { message: String, code: u16 },

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest { .. } => 400,
            ApiError::ValidationError { .. } => 400,
            ApiError::InvalidJson(_) => 400,
            ApiError::Unauthorized { .. } => 401,
            ApiError::NotFound { .. } => 404,
            ApiError::Conflict { .. } => 409,
            ApiError::UnprocessableEntity { .. } => 422,
            ApiError::InternalServerError { .. } => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest { message, .. } => message,
            ApiError::ValidationError { message, .. } => message,
            ApiError::InvalidJson(msg) => msg,
            ApiError::Unauthorized { message, .. } => message,
            ApiError::NotFound { message, .. } => message,
            ApiError::Conflict { message, .. } => message,
            ApiError::UnprocessableEntity { message, .. } => message,
            ApiError::InternalServerError { message, .. } => message,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Numeric code from the catalog error table
    pub fn numeric_code(&self) -> u16 {
        match self {
            ApiError::BadRequest { code, .. }
            | ApiError::ValidationError { code, .. }
            | ApiError::Unauthorized { code, .. }
            | ApiError::NotFound { code, .. }
            | ApiError::Conflict { code, .. }
            | ApiError::UnprocessableEntity { code, .. }
            | ApiError::InternalServerError { code, .. } => *code,
            ApiError::InvalidJson(_) => codes::FORM_VALIDATION,
            ApiError::ServiceUnavailable(_) => 0,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut response = json!({
            "success": false,
            "error": true,
            "message": self.message(),
            "code": self.error_code(),
            "error_code": self.numeric_code(),
        });

        match self {
            ApiError::ValidationError {
                field_errors: Some(field_errors),
                ..
            }
            | ApiError::UnprocessableEntity { field_errors, .. } => {
                response["field_errors"] = json!(field_errors);
            }
            _ => {}
        }
        response
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest { .. } => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::Unauthorized { .. } => "UNAUTHORIZED",
            ApiError::NotFound { .. } => "NOT_FOUND",
            ApiError::Conflict { .. } => "CONFLICT",
            ApiError::UnprocessableEntity { .. } => "UNPROCESSABLE_ENTITY",
            ApiError::InternalServerError { .. } => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>, code: u16) -> Self {
        ApiError::BadRequest {
            message: message.into(),
            code,
        }
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized {
            message: message.into(),
            code: codes::UNAUTHENTICATED,
        }
    }

    pub fn not_found(message: impl Into<String>, code: u16) -> Self {
        ApiError::NotFound {
            message: message.into(),
            code,
        }
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let code = err.code;
        match err.kind {
            ErrorKind::Validation { message, fields } => ApiError::ValidationError {
                message,
                code,
                field_errors: (!fields.is_empty()).then_some(fields),
            },
            ErrorKind::FeatureSchema(schema) => {
                let mut field_errors = FieldErrors::new();
                if let Some(feature) = schema_feature(&schema) {
                    field_errors.insert(feature, schema.to_string());
                }
                ApiError::UnprocessableEntity {
                    message: feature_message(code).to_string(),
                    code,
                    field_errors,
                }
            }
            ErrorKind::Authentication(message) | ErrorKind::Authorization(message) => {
                ApiError::Unauthorized { message, code }
            }
            ErrorKind::NotFound(message) => ApiError::NotFound { message, code },
            ErrorKind::Conflict(message) => ApiError::Conflict { message, code },
            ErrorKind::Store { message, source } => {
                // Don't expose storage errors to clients
                tracing::error!(code, error = %source, "{}", message);
                ApiError::InternalServerError {
                    message: "An error occurred while processing your request".to_string(),
                    code,
                }
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ServiceError::auth(err).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid_json(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::bad_request(rejection.body_text(), codes::FORM_VALIDATION)
    }
}

fn schema_feature(err: &FeatureSchemaError) -> Option<String> {
    match err {
        FeatureSchemaError::MissingRequiredFeature(id)
        | FeatureSchemaError::InvalidFeatureValue { feature: id, .. }
        | FeatureSchemaError::UnknownFeature(id) => Some(format!("feature_{id}")),
        FeatureSchemaError::Store(_) => None,
    }
}

fn feature_message(code: u16) -> &'static str {
    match code {
        codes::VARIANT_FEATURE_WRONG_TYPE => "variant feature is wrong type",
        codes::CONSTRUCTION_FEATURE_WRONG_TYPE => "construction feature is wrong type",
        _ => "feature is wrong type",
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabaseError;
    use crate::types::{FeatureId, FeatureType};

    #[test]
    fn kinds_map_to_statuses() {
        let cases = [
            (ServiceError::invalid(codes::PRODUCT_NOT_CREATED, "name", "required"), 400),
            (ServiceError::not_found(codes::PRODUCT_NOT_FOUND, "gone"), 404),
            (ServiceError::conflict(codes::PRODUCT_SPU_NOT_UNIQUE, "dup"), 409),
            (ServiceError::authentication(codes::UNAUTHENTICATED, "who"), 401),
            (
                ServiceError::database(
                    codes::PRODUCT_NOT_CREATED,
                    "insert failed",
                    DatabaseError::QueryError("syntax".to_string()),
                ),
                500,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn feature_errors_are_unprocessable_with_field_detail() {
        let err = ServiceError::features(
            codes::VARIANT_FEATURE_WRONG_TYPE,
            FeatureSchemaError::InvalidFeatureValue {
                feature: FeatureId(4),
                value: "abc".to_string(),
                expected: FeatureType::Integer,
            },
        );
        let api = ApiError::from(err);
        let body = api.to_json();

        assert_eq!(api.status_code(), 422);
        assert_eq!(body["error_code"], 401);
        assert_eq!(body["message"], "variant feature is wrong type");
        assert!(body["field_errors"]["feature_4"].is_string());
    }

    #[test]
    fn store_errors_hide_details() {
        let err = ServiceError::database(
            codes::CONSTRUCTION_NOT_CREATED,
            "insert failed",
            DatabaseError::QueryError("relation \"constructions\" does not exist".to_string()),
        );
        let body = ApiError::from(err).to_json();
        assert!(!body["message"].as_str().unwrap().contains("relation"));
        assert_eq!(body["error_code"], 900);
    }
}
