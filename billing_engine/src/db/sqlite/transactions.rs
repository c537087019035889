use billing_common::Money;
use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db::traits::DatabaseError,
    db_types::{Transaction, TransactionStatus, TransactionView},
};

const TRANSACTION_COLUMNS: &str = "id, invoice_id, amount, status, created_at";

/// Inserts a new transaction row. The status defaults to `PENDING` and the creation timestamp is
/// assigned by the database. This is not atomic on its own; embed it in a transaction if needed.
pub async fn insert_transaction(
    invoice_id: i64,
    amount: Money,
    conn: &mut SqliteConnection,
) -> Result<Transaction, DatabaseError> {
    let txn = sqlx::query_as::<_, Transaction>(
        r#"
            INSERT INTO transactions (invoice_id, amount)
            VALUES ($1, $2)
            RETURNING id, invoice_id, amount, status, created_at;
        "#,
    )
    .bind(invoice_id)
    .bind(amount)
    .fetch_one(conn)
    .await?;
    trace!("🗃️ Transaction #{} recorded against invoice #{invoice_id}", txn.id);
    Ok(txn)
}

pub async fn fetch_transaction(
    id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, DatabaseError> {
    let txn = sqlx::query_as::<_, Transaction>(&format!(
        "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(txn)
}

const HISTORY_SELECT: &str = r#"
    SELECT
        t.id,
        t.invoice_id,
        i.status AS invoice_status,
        t.amount,
        t.status,
        t.created_at AS transaction_date
    FROM transactions t
    INNER JOIN invoices i ON i.id = t.invoice_id
"#;

/// Fetches every transaction, joined with the owning invoice's status.
///
/// Results are ordered by creation time and then id, so a single call is deterministic.
pub async fn full_history(conn: &mut SqliteConnection) -> Result<Vec<TransactionView>, DatabaseError> {
    let sql = format!("{HISTORY_SELECT} ORDER BY t.created_at, t.id");
    let views = sqlx::query_as::<_, TransactionView>(&sql).fetch_all(conn).await?;
    trace!("🗃️ Fetched {} transactions", views.len());
    Ok(views)
}

/// Fetches the transactions whose invoice belongs to `user_id`. Same ordering as
/// [`full_history`].
pub async fn history_for_user(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<TransactionView>, DatabaseError> {
    let sql = format!("{HISTORY_SELECT} WHERE i.user_id = $1 ORDER BY t.created_at, t.id");
    let views = sqlx::query_as::<_, TransactionView>(&sql).bind(user_id).fetch_all(conn).await?;
    trace!("🗃️ Fetched {} transactions for user #{user_id}", views.len());
    Ok(views)
}

/// Compare-and-swap on the status column. The row is updated only if it is currently `PENDING`
/// and the requested status is something else; otherwise no row matches and `None` is returned.
/// Racing callers therefore resolve to exactly one winner inside the database.
pub async fn checked_status_update(
    id: i64,
    new_status: TransactionStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, DatabaseError> {
    let updated = sqlx::query_as::<_, Transaction>(
        r#"
            UPDATE transactions
            SET status = $1
            WHERE id = $2 AND status = 'PENDING' AND $1 <> 'PENDING'
            RETURNING id, invoice_id, amount, status, created_at;
        "#,
    )
    .bind(new_status)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    if let Some(txn) = &updated {
        trace!("🗃️ Transaction #{id} is now {}", txn.status);
    }
    Ok(updated)
}
