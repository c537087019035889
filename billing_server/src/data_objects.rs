use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The response envelope every endpoint uses, success and failure alike: a human-readable
/// `message` and the operation's payload (or error detail) in `result`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub message: String,
    pub result: Value,
}

impl ApiResponse {
    pub fn new<S: Display>(message: S, result: Value) -> Self {
        Self { message: message.to_string(), result }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTransactionRequest {
    pub invoice_id: i64,
}

/// The status is taken as a raw string and validated in the handler so that a bad value renders
/// as a per-field validation error rather than a deserialization failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}
