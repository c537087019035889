use serde::{Deserialize, Serialize};

use crate::db_types::Invoice;

/// The caller's identity, as verified by the identity provider. The engine trusts these fields
/// and never derives them from request payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: i64,
    #[serde(default)]
    pub is_staff: bool,
}

impl Identity {
    pub fn user(user_id: i64) -> Self {
        Self { user_id, is_staff: false }
    }

    pub fn staff(user_id: i64) -> Self {
        Self { user_id, is_staff: true }
    }

    /// Staff may act on any invoice; everyone else only on their own.
    pub fn can_access(&self, invoice: &Invoice) -> bool {
        self.is_staff || invoice.user_id == self.user_id
    }
}
