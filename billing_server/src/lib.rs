//! # Billing server
//!
//! The HTTP boundary of the billing back office. It is responsible for:
//! * Verifying bearer JWTs and turning them into an [`billing_engine::Identity`].
//! * Exposing the transaction API under `/api`.
//! * Upgrading `/ws/transactions` connections and bridging them into the subscriber registry so
//!   that clients receive live transaction updates.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more
//! information.

pub mod auth;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod routes;
pub mod server;
pub mod ws;

#[cfg(test)]
mod endpoint_tests;
