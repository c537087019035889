use billing_common::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{TransactionStatus, TransactionView};

/// The payload delivered to subscribers: a snapshot of the transaction at the moment of the
/// triggering write. Amounts are serialized as two-decimal strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionNotification {
    pub transaction_id: i64,
    pub invoice_id: i64,
    pub amount: Money,
    pub status: TransactionStatus,
    pub transaction_date: DateTime<Utc>,
}

impl From<&TransactionView> for TransactionNotification {
    fn from(view: &TransactionView) -> Self {
        Self {
            transaction_id: view.id,
            invoice_id: view.invoice_id,
            amount: view.amount,
            status: view.status,
            transaction_date: view.transaction_date,
        }
    }
}

/// Emitted by the transaction engine after every accepted write (creation or status change).
/// `user_id` is the owner of the underlying invoice and addresses the fan-out; it is not part
/// of the delivered payload.
#[derive(Debug, Clone)]
pub struct TransactionEvent {
    pub user_id: i64,
    pub notification: TransactionNotification,
}

impl TransactionEvent {
    pub fn new(user_id: i64, view: &TransactionView) -> Self {
        Self { user_id, notification: TransactionNotification::from(view) }
    }
}
