//! Billing Engine
//!
//! Core logic for the billing back office. The engine owns payment transactions raised against
//! invoices, enforces the transaction status state machine, and emits a notification event on
//! every accepted write so that live subscribers can be told about status changes.
//!
//! The library is divided into four sections:
//! 1. Database management ([`mod@db`]). SQLite via sqlx is the supported backend. Access goes
//!    through the [`BillingDatabase`] trait, so servers and tests can substitute their own
//!    implementation. The row types live in [`db_types`] and are public.
//! 2. The transaction API ([`TransactionApi`]). This is the public face of the engine: creation,
//!    history, retrieval and status updates, with authorization checks on every operation.
//! 3. The event plumbing ([`events`]). Hooks are registered up front and the resulting producers
//!    are injected into the API at construction time. There is no global channel singleton.
//! 4. The subscription registry ([`notify`]). A concurrency-safe map from user id to live
//!    connections, used by the fan-out hook to deliver notifications.
mod api;
mod db;

pub mod db_types;
pub mod events;
pub mod notify;

pub use api::{
    errors::TransactionApiError,
    objects::Identity,
    transaction_api::TransactionApi,
};
pub use db::{
    sqlite::SqliteDatabase,
    traits::{BillingDatabase, DatabaseError},
};
