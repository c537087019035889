use actix_web::{error::ResponseError, http::StatusCode, web, HttpResponse};
use billing_engine::TransactionApiError;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::data_objects::ApiResponse;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Validation error.")]
    ValidationError { field: String, detail: String },
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("{0}")]
    NoRecordFound(String),
    #[error("{0}")]
    InsufficientPermissions(String),
}

impl ServerError {
    pub fn validation<S1: Into<String>, S2: Into<String>>(field: S1, detail: S2) -> Self {
        Self::ValidationError { field: field.into(), detail: detail.into() }
    }

    /// Every error renders the same `{message, result}` envelope the success path uses, with
    /// per-field detail in `result` for validation failures.
    fn envelope(&self) -> ApiResponse {
        match self {
            Self::ValidationError { field, detail } => {
                let mut errors = Map::new();
                errors.insert(field.clone(), json!([detail]));
                ApiResponse::new("Validation error.", Value::Object(errors))
            },
            other => ApiResponse::new(other.to_string(), Value::Null),
        }
    }
}

/// Bodies that fail deserialization never reach a handler, so actix would answer with its own
/// plain-text error. Route them through the validation envelope instead.
pub fn json_payload_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| ServerError::validation("body", err.to_string()).into())
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError { .. } => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::ValidationError(_) => StatusCode::UNAUTHORIZED,
                AuthError::PoorlyFormattedToken(_) => StatusCode::BAD_REQUEST,
            },
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self.envelope())
    }
}

impl From<TransactionApiError> for ServerError {
    fn from(e: TransactionApiError) -> Self {
        match e {
            TransactionApiError::InvoiceNotFound(id) => Self::NoRecordFound(format!("Invoice #{id} not found.")),
            TransactionApiError::TransactionNotFound(_) => Self::NoRecordFound("Transaction not found.".to_string()),
            TransactionApiError::Forbidden(reason) => Self::InsufficientPermissions(reason),
            TransactionApiError::InvalidTransition(reason) => Self::validation("status", reason),
            TransactionApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No authentication token was provided.")]
    MissingToken,
    #[error("Token signature or expiry is invalid.")]
    ValidationError(String),
    #[error("Token is not in the correct format.")]
    PoorlyFormattedToken(String),
}
