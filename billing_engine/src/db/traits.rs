use billing_common::Money;
use thiserror::Error;

use crate::db_types::{Invoice, Transaction, TransactionStatus, TransactionView};

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Database query error: {0}")]
    QueryError(String),
}

/// The storage contract the transaction engine runs against.
///
/// `SqliteDatabase` is the production implementation; endpoint tests substitute a mock. The
/// trait deliberately does not require `Clone` so that mocks remain easy to construct.
#[allow(async_fn_in_trait)]
pub trait BillingDatabase {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Fetches the invoice row for the given id, or `None` if it does not exist. Invoices are
    /// owned by the invoice service; the engine only reads them.
    async fn fetch_invoice(&self, invoice_id: i64) -> Result<Option<Invoice>, DatabaseError>;

    /// Inserts a new transaction for the given invoice. The database assigns the id and the
    /// creation timestamp, and the status starts as `PENDING`. The amount must already be the
    /// snapshot of the invoice total taken by the caller.
    async fn insert_transaction(&self, invoice_id: i64, amount: Money) -> Result<Transaction, DatabaseError>;

    /// Fetches a single transaction row by id.
    async fn fetch_transaction(&self, id: i64) -> Result<Option<Transaction>, DatabaseError>;

    /// Fetches the full transaction history, joined with the owning invoice's status.
    /// Ordered by creation time, then id, so the result is deterministic within a call.
    async fn full_history(&self) -> Result<Vec<TransactionView>, DatabaseError>;

    /// Fetches the transaction history restricted to invoices owned by `user_id`.
    /// Same ordering guarantee as [`Self::full_history`].
    async fn history_for_user(&self, user_id: i64) -> Result<Vec<TransactionView>, DatabaseError>;

    /// Atomically transitions the transaction to `new_status`, but only if it is currently
    /// `PENDING` and `new_status` is not `PENDING` itself. Returns the updated row on success,
    /// or `None` if the condition did not hold (the caller is responsible for working out why).
    ///
    /// The check-and-write happens in a single conditional UPDATE, so two racing callers can
    /// never both succeed against the same transaction.
    async fn checked_status_update(
        &self,
        id: i64,
        new_status: TransactionStatus,
    ) -> Result<Option<Transaction>, DatabaseError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
