use std::fmt::Debug;

use billing_common::Money;
use log::trace;
use sqlx::SqlitePool;

use super::{db_url, invoices, new_pool, transactions};
use crate::{
    db::traits::{BillingDatabase, DatabaseError},
    db_types::{Invoice, InvoiceStatus, Transaction, TransactionStatus, TransactionView},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL from the environment.
    pub async fn new(max_connections: u32) -> Result<Self, DatabaseError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, DatabaseError> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Runs the embedded migrations against this database.
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./src/db/sqlite/migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DatabaseError::QueryError(e.to_string()))?;
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Records an invoice on behalf of the invoice service. The engine never calls this on a
    /// request path; it exists for seeding and tests.
    pub async fn insert_invoice(
        &self,
        user_id: i64,
        total_amount: Money,
        status: InvoiceStatus,
    ) -> Result<Invoice, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let invoice = invoices::insert_invoice(user_id, total_amount, status, &mut *tx).await?;
        tx.commit().await?;
        Ok(invoice)
    }

    /// Replaces an invoice's total, as the invoice service would. Snapshotted transaction
    /// amounts are unaffected.
    pub async fn update_invoice_total(
        &self,
        invoice_id: i64,
        total_amount: Money,
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        invoices::update_invoice_total(invoice_id, total_amount, &mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }
}

impl BillingDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_invoice(&self, invoice_id: i64) -> Result<Option<Invoice>, DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        invoices::fetch_invoice(invoice_id, &mut conn).await
    }

    async fn insert_transaction(
        &self,
        invoice_id: i64,
        amount: Money,
    ) -> Result<Transaction, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let transaction = transactions::insert_transaction(invoice_id, amount, &mut *tx).await?;
        tx.commit().await?;
        Ok(transaction)
    }

    async fn fetch_transaction(&self, id: i64) -> Result<Option<Transaction>, DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        transactions::fetch_transaction(id, &mut conn).await
    }

    async fn full_history(&self) -> Result<Vec<TransactionView>, DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        transactions::full_history(&mut conn).await
    }

    async fn history_for_user(&self, user_id: i64) -> Result<Vec<TransactionView>, DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        transactions::history_for_user(user_id, &mut conn).await
    }

    async fn checked_status_update(
        &self,
        id: i64,
        new_status: TransactionStatus,
    ) -> Result<Option<Transaction>, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let transaction = transactions::checked_status_update(id, new_status, &mut *tx).await?;
        tx.commit().await?;
        Ok(transaction)
    }

    async fn close(&mut self) -> Result<(), DatabaseError> {
        self.pool.close().await;
        Ok(())
    }
}
