//! Registered services: tenant-owned applications submitting logs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::LogLevel;

/// A service registered on the platform, authenticated by its API key.
///
/// `is_online` and `last_log_received_at` are derived: every accepted
/// submission flips them. `api_key` is unique across all services and can
/// be regenerated, which invalidates the previous key immediately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredService {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub version: String,
    /// Kind of service (web application, worker, scheduled job, ...).
    pub service_type: String,

    pub api_key: String,

    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    pub last_log_received_at: Option<DateTime<Utc>>,

    pub client_id: Uuid,
    pub client_name: String,

    pub environment: String,

    /// Expected maximum gap between reports, in minutes. Services quiet for
    /// longer than this (times the store's staleness factor) are listed as
    /// offline.
    pub reporting_interval_minutes: i64,

    pub is_active: bool,
    pub is_online: bool,

    pub alerts_enabled: bool,
    /// Minimum level that triggers an alert for this service.
    pub alert_threshold: LogLevel,
    pub alert_recipients: Vec<String>,
    pub webhook_url: Option<String>,

    pub metadata: Option<HashMap<String, String>>,
    pub source_path: Option<String>,
}

impl RegisteredService {
    /// Generate a fresh API key: two random tokens joined with a dash.
    pub fn issue_api_key() -> String {
        format!("{}-{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_keys_are_unique_and_well_formed() {
        let a = RegisteredService::issue_api_key();
        let b = RegisteredService::issue_api_key();
        assert_ne!(a, b);
        assert_eq!(a.len(), 65);
        assert_eq!(a.matches('-').count(), 1);
    }
}
