// Utility modules for the Academy Backend

pub mod api_errors;
pub mod audit_logger;
pub mod extract;
pub mod formatting;
pub mod password;
pub mod validation;

pub use api_errors::{ApiError, ApiResult, ErrorBody, ErrorEnvelope};
pub use audit_logger::{AuditAction, AuditLogger, ResourceType};
pub use extract::{ApiPath, ApiQuery, ValidatedJson};
pub use formatting::{format_brl, format_date, format_money};
pub use password::{hash_password, verify_password, PasswordError};
pub use validation::{
    is_valid_cpf, normalize_cpf, normalize_email, trim_and_validate_field, trim_clearable_field,
    trim_optional_field,
};
