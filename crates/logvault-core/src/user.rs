//! Operator accounts and their access grants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Access tiers granted per client, ordered from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Read,
    Write,
    Admin,
}

/// A per-client access grant held by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientAccess {
    pub client_id: Uuid,
    pub level: AccessLevel,
}

/// Short-lived token for confirming an email address or phone number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// An operator account. Only consumed by the auth collaborator: the core
/// treats users as inputs to role and access checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,

    pub password_hash: String,
    pub password_salt: String,

    pub display_name: String,
    pub phone: Option<String>,

    pub email_confirmed: bool,
    pub phone_confirmed: bool,
    pub email_token: Option<ConfirmationToken>,
    pub phone_token: Option<ConfirmationToken>,
    pub two_factor_secret: Option<String>,

    pub failed_login_count: i64,
    pub locked_until: Option<DateTime<Utc>>,

    /// Role names (e.g. "Admin", "Support").
    pub roles: Vec<String>,
    pub client_access: Vec<ClientAccess>,
    pub preferences: HashMap<String, String>,

    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_levels_are_ordered() {
        assert!(AccessLevel::Read < AccessLevel::Write);
        assert!(AccessLevel::Write < AccessLevel::Admin);
    }
}
