//! Clients (tenants) owning one or more registered services.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::LogLevel;

/// A tenant/customer. Owns zero or more registered services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    /// External customer number, unique across clients.
    pub client_number: String,
    pub description: String,

    pub email: String,
    pub phone: String,
    pub address: String,

    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    pub is_active: bool,

    pub contacts: Vec<ContactPerson>,
    pub notification_settings: NotificationSettings,
    pub metadata: Option<HashMap<String, String>>,
}

/// Technical contact attached to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPerson {
    pub id: Uuid,
    pub name: String,
    pub role: String,
    pub email: String,
    pub phone: String,
    /// Whether this contact receives alert notifications.
    pub receive_alerts: bool,
}

/// Per-client notification channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    pub email_enabled: bool,
    pub sms_enabled: bool,
    pub webhook_enabled: bool,
    pub webhook_url: Option<String>,
    /// Minimum log level that triggers a notification.
    pub threshold: LogLevel,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email_enabled: true,
            sms_enabled: false,
            webhook_enabled: false,
            webhook_url: None,
            threshold: LogLevel::Error,
        }
    }
}
