use std::{fmt::Display, str::FromStr};

use billing_common::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------  TransactionStatus  ---------------------------------------------------------
/// The lifecycle status of a transaction.
///
/// `Pending` is the initial state. `Completed` and `Failed` are terminal: once a transaction
/// reaches either, no further transition is permitted. The only legal transitions are
/// `Pending -> Completed` and `Pending -> Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Completed | TransactionStatus::Failed)
    }
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "PENDING"),
            TransactionStatus::Completed => write!(f, "COMPLETED"),
            TransactionStatus::Failed => write!(f, "FAILED"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid status: {0}")]
pub struct StatusConversionError(pub String);

impl FromStr for TransactionStatus {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            s => Err(StatusConversionError(s.to_string())),
        }
    }
}

//--------------------------------------    InvoiceStatus    ---------------------------------------------------------
/// The status of an invoice. Invoices are owned by an external aggregate; the engine only ever
/// reads them, so this enum exists for reporting purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum InvoiceStatus {
    Pending,
    Paid,
    Cancelled,
}

impl Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvoiceStatus::Pending => write!(f, "PENDING"),
            InvoiceStatus::Paid => write!(f, "PAID"),
            InvoiceStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl FromStr for InvoiceStatus {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PAID" => Ok(Self::Paid),
            "CANCELLED" => Ok(Self::Cancelled),
            s => Err(StatusConversionError(s.to_string())),
        }
    }
}

//--------------------------------------      Invoice        ---------------------------------------------------------
/// A read-only view of an invoice row. The total and status are maintained by the invoice
/// service; the engine snapshots `total_amount` when a transaction is created and never writes
/// back.
#[derive(Debug, Clone, FromRow)]
pub struct Invoice {
    pub id: i64,
    pub user_id: i64,
    pub total_amount: Money,
    pub status: InvoiceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------     Transaction     ---------------------------------------------------------
/// A single charge attempt against an invoice.
///
/// `amount` is fixed at creation time from the invoice total and never changes afterwards, even
/// if the invoice is edited later. `invoice_id` and `created_at` are likewise immutable.
#[derive(Debug, Clone, FromRow)]
pub struct Transaction {
    pub id: i64,
    pub invoice_id: i64,
    pub amount: Money,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------   TransactionView   ---------------------------------------------------------
/// The transaction read view returned by every API operation, including the owning invoice's
/// current status.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct TransactionView {
    pub id: i64,
    pub invoice_id: i64,
    pub invoice_status: InvoiceStatus,
    pub amount: Money,
    pub status: TransactionStatus,
    pub transaction_date: DateTime<Utc>,
}

impl TransactionView {
    pub fn from_parts(txn: &Transaction, invoice: &Invoice) -> Self {
        Self {
            id: txn.id,
            invoice_id: txn.invoice_id,
            invoice_status: invoice.status,
            amount: txn.amount,
            status: txn.status,
            transaction_date: txn.created_at,
        }
    }
}
