use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use uuid::Uuid;

use logvault_core::{LogLevel, NotificationSettings};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchLogsRequest {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub service_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub min_level: Option<LogLevel>,
    pub search_text: Option<String>,
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_take")]
    pub take: u32,
}

fn default_take() -> u32 {
    100
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub service_type: String,
    pub client_id: Uuid,
    #[serde(default)]
    pub environment: String,
    #[serde(default = "default_reporting_interval")]
    pub reporting_interval_minutes: i64,
    #[serde(default = "default_true")]
    pub alerts_enabled: bool,
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold: LogLevel,
    #[serde(default)]
    pub alert_email_recipients: Vec<String>,
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
    #[serde(default)]
    pub source_code_path: Option<String>,
}

fn default_reporting_interval() -> i64 {
    60
}

fn default_true() -> bool {
    true
}

fn default_alert_threshold() -> LogLevel {
    LogLevel::Error
}

/// Partial update: absent or null fields are left untouched.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub service_type: Option<String>,
    pub environment: Option<String>,
    pub reporting_interval_minutes: Option<i64>,
    pub alerts_enabled: Option<bool>,
    pub alert_threshold: Option<LogLevel>,
    pub alert_email_recipients: Option<Vec<String>>,
    pub webhook_url: Option<String>,
    pub metadata: Option<HashMap<String, String>>,
    pub source_code_path: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchServicesRequest {
    pub search_term: Option<String>,
    pub client_id: Option<Uuid>,
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientRequest {
    pub name: String,
    pub client_number: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
}

/// Partial update: absent or null fields are left untouched.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClientRequest {
    pub name: Option<String>,
    pub client_number: Option<String>,
    pub description: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub metadata: Option<HashMap<String, String>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    pub name: String,
    #[serde(default)]
    pub role: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub receive_alerts: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettingsRequest {
    pub email_enabled: bool,
    pub sms_enabled: bool,
    pub webhook_enabled: bool,
    pub webhook_url: Option<String>,
    pub threshold: LogLevel,
}

impl From<NotificationSettingsRequest> for NotificationSettings {
    fn from(req: NotificationSettingsRequest) -> Self {
        Self {
            email_enabled: req.email_enabled,
            sms_enabled: req.sms_enabled,
            webhook_enabled: req.webhook_enabled,
            webhook_url: req.webhook_url,
            threshold: req.threshold,
        }
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}
