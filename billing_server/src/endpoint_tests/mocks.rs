use billing_common::Money;
use billing_engine::{
    db_types::{Invoice, Transaction, TransactionStatus, TransactionView},
    BillingDatabase,
    DatabaseError,
};
use mockall::mock;

mock! {
    pub Database {}
    impl BillingDatabase for Database {
        fn url(&self) -> &str;
        async fn fetch_invoice(&self, invoice_id: i64) -> Result<Option<Invoice>, DatabaseError>;
        async fn insert_transaction(&self, invoice_id: i64, amount: Money) -> Result<Transaction, DatabaseError>;
        async fn fetch_transaction(&self, id: i64) -> Result<Option<Transaction>, DatabaseError>;
        async fn full_history(&self) -> Result<Vec<TransactionView>, DatabaseError>;
        async fn history_for_user(&self, user_id: i64) -> Result<Vec<TransactionView>, DatabaseError>;
        async fn checked_status_update(&self, id: i64, new_status: TransactionStatus) -> Result<Option<Transaction>, DatabaseError>;
        async fn close(&mut self) -> Result<(), DatabaseError>;
    }
}
