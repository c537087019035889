use std::fmt::Debug;

use log::*;

use crate::{
    api::{errors::TransactionApiError, objects::Identity},
    db::traits::BillingDatabase,
    db_types::{Invoice, Transaction, TransactionStatus, TransactionView},
    events::{EventProducers, TransactionEvent},
};

/// `TransactionApi` is the primary API for creating transactions against invoices and driving
/// them through their status lifecycle. Every accepted write emits a [`TransactionEvent`]
/// through the injected producers as an explicit step after the database commit.
pub struct TransactionApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for TransactionApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TransactionApi")
    }
}

impl<B> TransactionApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> TransactionApi<B>
where B: BillingDatabase
{
    /// Registers a new transaction against an invoice.
    ///
    /// The caller must be staff, or the invoice must belong to them. The transaction amount is
    /// the invoice total as read at this instant; edits to the invoice afterwards do not touch
    /// transactions that already exist. The new transaction starts in `PENDING`.
    pub async fn create_transaction(
        &self,
        identity: &Identity,
        invoice_id: i64,
    ) -> Result<TransactionView, TransactionApiError> {
        let invoice = self
            .db
            .fetch_invoice(invoice_id)
            .await?
            .ok_or(TransactionApiError::InvoiceNotFound(invoice_id))?;
        if !identity.can_access(&invoice) {
            debug!(
                "🔄️🧾️ User #{} tried to create a transaction for invoice #{invoice_id}, which \
                 belongs to user #{}",
                identity.user_id, invoice.user_id
            );
            return Err(TransactionApiError::forbidden(
                "You may only create transactions for your own invoices.",
            ));
        }
        let txn = self.db.insert_transaction(invoice.id, invoice.total_amount).await?;
        let view = TransactionView::from_parts(&txn, &invoice);
        self.call_transaction_changed_hook(invoice.user_id, &view).await;
        debug!(
            "🔄️🧾️ Transaction #{} for {} registered against invoice #{invoice_id}",
            txn.id, txn.amount
        );
        Ok(view)
    }

    /// Returns the transaction history visible to the caller: everything for staff, only the
    /// caller's own invoices otherwise. Ordering is stable within a single call.
    pub async fn transaction_history(
        &self,
        identity: &Identity,
    ) -> Result<Vec<TransactionView>, TransactionApiError> {
        let history = if identity.is_staff {
            self.db.full_history().await?
        } else {
            self.db.history_for_user(identity.user_id).await?
        };
        trace!("🔄️🧾️ {} transactions in history for user #{}", history.len(), identity.user_id);
        Ok(history)
    }

    /// Fetches a single transaction. Non-owners get a forbidden error; a truly absent id gets
    /// not-found.
    pub async fn fetch_transaction(
        &self,
        identity: &Identity,
        id: i64,
    ) -> Result<TransactionView, TransactionApiError> {
        let (txn, invoice) = self.authorized_fetch(identity, id).await?;
        Ok(TransactionView::from_parts(&txn, &invoice))
    }

    /// Moves the transaction to `new_status`.
    ///
    /// The state machine is small and strict:
    ///
    /// | From \ To | PENDING | COMPLETED | FAILED |
    /// |-----------|---------|-----------|--------|
    /// | PENDING   | Err     | Ok        | Ok     |
    /// | COMPLETED | Err     | Err       | Err    |
    /// | FAILED    | Err     | Err       | Err    |
    ///
    /// `COMPLETED` and `FAILED` are terminal, and a transition to the current status is always
    /// rejected, including `PENDING -> PENDING`. The check-and-write is a compare-and-swap in
    /// the database, so two racing updates resolve to exactly one winner.
    ///
    /// On success the updated view is returned and a notification event is emitted.
    pub async fn update_status(
        &self,
        identity: &Identity,
        id: i64,
        new_status: TransactionStatus,
    ) -> Result<TransactionView, TransactionApiError> {
        let (txn, invoice) = self.authorized_fetch(identity, id).await?;
        let updated = if new_status == TransactionStatus::Pending {
            None
        } else {
            self.db.checked_status_update(id, new_status).await?
        };
        match updated {
            Some(txn) => {
                let view = TransactionView::from_parts(&txn, &invoice);
                self.call_transaction_changed_hook(invoice.user_id, &view).await;
                debug!("🔄️🧾️ Transaction #{id} is now {new_status}");
                Ok(view)
            },
            None => {
                // The CAS did not fire. Re-read the row to report the precise reason; a racing
                // winner may have moved the status since the authorization fetch.
                let current = self
                    .db
                    .fetch_transaction(id)
                    .await?
                    .map(|t| t.status)
                    .unwrap_or(txn.status);
                if current.is_terminal() && current != new_status {
                    Err(TransactionApiError::invalid_transition(
                        "Status cannot be changed once COMPLETED or FAILED.",
                    ))
                } else {
                    Err(TransactionApiError::invalid_transition(format!(
                        "Status is already {current}."
                    )))
                }
            },
        }
    }

    async fn authorized_fetch(
        &self,
        identity: &Identity,
        id: i64,
    ) -> Result<(Transaction, Invoice), TransactionApiError> {
        let txn = self
            .db
            .fetch_transaction(id)
            .await?
            .ok_or(TransactionApiError::TransactionNotFound(id))?;
        let invoice = self
            .db
            .fetch_invoice(txn.invoice_id)
            .await?
            .ok_or(TransactionApiError::InvoiceNotFound(txn.invoice_id))?;
        if identity.can_access(&invoice) {
            Ok((txn, invoice))
        } else {
            debug!(
                "🔄️🧾️ User #{} was denied access to transaction #{id} on invoice #{}",
                identity.user_id, invoice.id
            );
            Err(TransactionApiError::forbidden("You do not have access to this transaction."))
        }
    }

    async fn call_transaction_changed_hook(&self, user_id: i64, view: &TransactionView) {
        for producer in &self.producers.transaction_changed_producer {
            trace!("🔄️📣️ Notifying transaction change subscribers");
            producer.publish_event(TransactionEvent::new(user_id, view)).await;
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}
