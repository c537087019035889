use billing_common::Money;
use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db::traits::DatabaseError,
    db_types::{Invoice, InvoiceStatus},
};

const INVOICE_COLUMNS: &str = "id, user_id, total_amount, status, created_at, updated_at";

pub async fn fetch_invoice(
    invoice_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Invoice>, DatabaseError> {
    let invoice = sqlx::query_as::<_, Invoice>(&format!(
        "SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1"
    ))
    .bind(invoice_id)
    .fetch_optional(conn)
    .await?;
    Ok(invoice)
}

/// Inserts an invoice row. The engine itself never calls this; it stands in for the invoice
/// service's writes, and tests use it to seed state.
pub async fn insert_invoice(
    user_id: i64,
    total_amount: Money,
    status: InvoiceStatus,
    conn: &mut SqliteConnection,
) -> Result<Invoice, DatabaseError> {
    let invoice = sqlx::query_as::<_, Invoice>(
        r#"
            INSERT INTO invoices (user_id, total_amount, status)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, total_amount, status, created_at, updated_at;
        "#,
    )
    .bind(user_id)
    .bind(total_amount)
    .bind(status)
    .fetch_one(conn)
    .await?;
    trace!("🗃️ Invoice #{} created for user #{user_id}", invoice.id);
    Ok(invoice)
}

/// Replaces the invoice total, as the invoice service would when products are added or removed.
/// Existing transactions keep their snapshotted amounts.
pub async fn update_invoice_total(
    invoice_id: i64,
    total_amount: Money,
    conn: &mut SqliteConnection,
) -> Result<(), DatabaseError> {
    let _ = sqlx::query(
        "UPDATE invoices SET total_amount = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2",
    )
    .bind(total_amount)
    .bind(invoice_id)
    .execute(conn)
    .await?;
    trace!("🗃️ Invoice #{invoice_id} total updated to {total_amount}");
    Ok(())
}
