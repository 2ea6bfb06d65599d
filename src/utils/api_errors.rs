// API error envelope shared by every handler
// {"success": false, "error": {"code", "message", "details"}}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use utoipa::ToSchema;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::db::PoolRunError;

// =============================================================================
// ERROR TYPES
// =============================================================================

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request validation failed")]
    Validation(Value),

    #[error("{0}")]
    BadRequest(String),

    #[error("Authorization header with a Bearer token is required")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account is inactive")]
    AccountInactive,

    #[error("You do not have permission to perform this action")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("Email delivery failed: {0}")]
    EmailDelivery(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: ErrorBody,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<Value>,
}

impl ApiError {
    /// Single-field validation failure
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut details = Map::new();
        details.insert(field.to_string(), json!([message.into()]));
        ApiError::Validation(Value::Object(details))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::MissingToken | ApiError::InvalidToken | ApiError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            },
            ApiError::AccountInactive | ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::EmailDelivery(_) => StatusCode::BAD_GATEWAY,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::MissingToken => "MISSING_TOKEN",
            ApiError::InvalidToken => "INVALID_TOKEN",
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::AccountInactive => "ACCOUNT_INACTIVE",
            ApiError::Forbidden => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::EmailDelivery(_) => "EMAIL_DELIVERY_FAILED",
            ApiError::Database(_) => "DATABASE_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message exposed to clients. Server-side failures never leak driver detail.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Database(_) | ApiError::Internal(_) => {
                "An unexpected error occurred".to_string()
            },
            other => other.to_string(),
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            ApiError::Validation(details) => Some(details.clone()),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error_code = self.error_code(), error = %self, "Request failed");
        } else {
            tracing::debug!(error_code = self.error_code(), error = %self, "Request rejected");
        }

        let body = ErrorEnvelope {
            success: false,
            error: ErrorBody {
                code: self.error_code().to_string(),
                message: self.public_message(),
                details: self.details(),
            },
        };

        (status, Json(body)).into_response()
    }
}

// =============================================================================
// ERROR CONVERSIONS
// =============================================================================

impl From<DieselError> for ApiError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => ApiError::NotFound("Resource"),
            DieselError::DatabaseError(kind, info) => match kind {
                DatabaseErrorKind::UniqueViolation => ApiError::Conflict(format!(
                    "A record with the same {} already exists",
                    constraint_subject(info.constraint_name())
                )),
                DatabaseErrorKind::ForeignKeyViolation => ApiError::Conflict(
                    "The operation conflicts with related records".to_string(),
                ),
                DatabaseErrorKind::CheckViolation => ApiError::field(
                    &constraint_subject(info.constraint_name()),
                    info.message(),
                ),
                _ => ApiError::Database(info.message().to_string()),
            },
            other => ApiError::Database(other.to_string()),
        }
    }
}

impl From<PoolRunError> for ApiError {
    fn from(err: PoolRunError) -> Self {
        ApiError::Database(format!("connection pool: {}", err))
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut details = Map::new();
        flatten_validation_errors("", &errors, &mut details);
        ApiError::Validation(Value::Object(details))
    }
}

impl From<crate::utils::password::PasswordError> for ApiError {
    fn from(err: crate::utils::password::PasswordError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<crate::services::jwt::JwtError> for ApiError {
    fn from(err: crate::services::jwt::JwtError) -> Self {
        use crate::services::jwt::JwtError;
        match err {
            JwtError::TokenGeneration(msg) => ApiError::Internal(msg),
            _ => ApiError::InvalidToken,
        }
    }
}

impl From<crate::services::email::EmailError> for ApiError {
    fn from(err: crate::services::email::EmailError) -> Self {
        ApiError::EmailDelivery(err.to_string())
    }
}

impl From<crate::services::enrollment_term::DocumentError> for ApiError {
    fn from(err: crate::services::enrollment_term::DocumentError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

/// `students_email_key` -> `email`, `plans_name_key` -> `name`
fn constraint_subject(constraint: Option<&str>) -> String {
    let Some(name) = constraint else {
        return "value".to_string();
    };
    let trimmed = name
        .strip_suffix("_key")
        .or_else(|| name.strip_suffix("_check"))
        .unwrap_or(name);
    let subject = [
        "workout_template_items_",
        "workout_log_entries_",
        "workout_templates_",
        "workout_logs_",
        "notifications_",
        "exercises_",
        "payments_",
        "students_",
        "feedback_",
        "plans_",
        "staff_",
    ]
    .iter()
    .find_map(|prefix| trimmed.strip_prefix(prefix))
    .unwrap_or(trimmed);
    subject.to_string()
}

fn flatten_validation_errors(prefix: &str, errors: &ValidationErrors, out: &mut Map<String, Value>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages = field_errors
                    .iter()
                    .map(|e| {
                        Value::String(
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string()),
                        )
                    })
                    .collect();
                out.insert(path, Value::Array(messages));
            },
            ValidationErrorsKind::Struct(nested) => flatten_validation_errors(&path, nested, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    flatten_validation_errors(&format!("{}[{}]", path, index), nested, out);
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 3, message = "too short"))]
        name: String,
        #[validate(range(min = 1, max = 5))]
        rating: i32,
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::MissingToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::NotFound("Student").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::field("cpf", "invalid").status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::Database("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_errors_hide_detail() {
        let err = ApiError::Database("relation \"students\" does not exist".into());
        assert_eq!(err.public_message(), "An unexpected error occurred");
        assert_eq!(ApiError::NotFound("Plan").public_message(), "Plan not found");
    }

    #[test]
    fn test_diesel_not_found_maps_to_404() {
        let err: ApiError = DieselError::NotFound.into();
        assert_eq!(err.error_code(), "NOT_FOUND");
    }

    #[test]
    fn test_validation_errors_are_flattened() {
        let sample = Sample {
            name: "ab".into(),
            rating: 9,
        };
        let err: ApiError = sample.validate().unwrap_err().into();
        let ApiError::Validation(details) = err else {
            panic!("expected validation error");
        };
        assert_eq!(details["name"][0], "too short");
        assert_eq!(details["rating"][0], "range");
    }

    #[test]
    fn test_constraint_subject() {
        assert_eq!(constraint_subject(Some("students_email_key")), "email");
        assert_eq!(constraint_subject(Some("plans_name_key")), "name");
        assert_eq!(constraint_subject(Some("students_cpf_key")), "cpf");
        assert_eq!(constraint_subject(None), "value");
    }
}
