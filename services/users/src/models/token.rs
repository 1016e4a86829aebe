//! Token ledger model

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Issued token record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub id: Uuid,
    pub token: String,
    pub user_id: Uuid,
    pub logged_out: bool,
    pub created_at: DateTime<Utc>,
}

/// New token creation payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewToken {
    pub token: String,
    pub user_id: Uuid,
    pub logged_out: bool,
}

impl NewToken {
    /// A freshly issued, still active token
    pub fn active(token: String, user_id: Uuid) -> Self {
        Self {
            token,
            user_id,
            logged_out: false,
        }
    }
}
