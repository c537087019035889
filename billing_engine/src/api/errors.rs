use thiserror::Error;

use crate::db::traits::DatabaseError;

#[derive(Debug, Error)]
pub enum TransactionApiError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),
    #[error("Invoice #{0} not found")]
    InvoiceNotFound(i64),
    #[error("Transaction #{0} not found")]
    TransactionNotFound(i64),
    #[error("{0}")]
    Forbidden(String),
    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),
}

impl TransactionApiError {
    pub fn forbidden<S: Into<String>>(reason: S) -> Self {
        Self::Forbidden(reason.into())
    }

    pub fn invalid_transition<S: Into<String>>(reason: S) -> Self {
        Self::InvalidTransition(reason.into())
    }
}
