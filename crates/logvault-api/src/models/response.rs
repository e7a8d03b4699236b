use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use logvault_core::{Client, ContactPerson, LogEntry, LogLevel, RegisteredService};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLogResponse {
    pub id: Uuid,
    pub received_at: DateTime<Utc>,
    pub success: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntryDto {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    pub service_id: Uuid,
    pub service_name: String,
    pub service_version: String,
    pub environment: String,
    pub category: String,
    pub client_id: Option<Uuid>,
    pub client_name: Option<String>,
    pub exception_details: Option<String>,
    pub stack_trace: Option<String>,
    pub correlation_id: Option<String>,
    pub context_data: Option<String>,
    pub ip_address: Option<String>,
    pub analyzed: bool,
    pub analysis_result: Option<String>,
    pub received_at: DateTime<Utc>,
    pub metadata: Option<HashMap<String, String>>,
}

impl From<LogEntry> for LogEntryDto {
    fn from(entry: LogEntry) -> Self {
        Self {
            id: entry.id,
            timestamp: entry.timestamp,
            level: entry.level,
            message: entry.message,
            service_id: entry.service_id,
            service_name: entry.service_name,
            service_version: entry.service_version,
            environment: entry.environment,
            category: entry.category,
            client_id: entry.client_id,
            client_name: entry.client_name,
            exception_details: entry.exception_details,
            stack_trace: entry.stack_trace,
            correlation_id: entry.correlation_id,
            context_data: entry.context_data,
            ip_address: entry.ip_address,
            analyzed: entry.analyzed,
            analysis_result: entry.analysis_result,
            received_at: entry.received_at,
            metadata: entry.metadata,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchLogsResponse {
    pub logs: Vec<LogEntryDto>,
    pub total_count: u64,
    pub success: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDto {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub version: String,
    pub service_type: String,
    pub api_key: String,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    pub last_log_received_at: Option<DateTime<Utc>>,
    pub client_id: Uuid,
    pub client_name: String,
    pub environment: String,
    pub reporting_interval_minutes: i64,
    pub is_active: bool,
    pub is_online: bool,
    pub alerts_enabled: bool,
    pub alert_threshold: LogLevel,
    pub alert_email_recipients: Vec<String>,
    pub webhook_url: Option<String>,
    pub metadata: Option<HashMap<String, String>>,
    pub source_code_path: Option<String>,
}

impl From<RegisteredService> for ServiceDto {
    fn from(service: RegisteredService) -> Self {
        Self {
            id: service.id,
            name: service.name,
            description: service.description,
            version: service.version,
            service_type: service.service_type,
            api_key: service.api_key,
            created_at: service.created_at,
            last_updated_at: service.last_updated_at,
            last_log_received_at: service.last_log_received_at,
            client_id: service.client_id,
            client_name: service.client_name,
            environment: service.environment,
            reporting_interval_minutes: service.reporting_interval_minutes,
            is_active: service.is_active,
            is_online: service.is_online,
            alerts_enabled: service.alerts_enabled,
            alert_threshold: service.alert_threshold,
            alert_email_recipients: service.alert_recipients,
            webhook_url: service.webhook_url,
            metadata: service.metadata,
            source_code_path: service.source_path,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerateApiKeyResponse {
    pub api_key: String,
    pub service_id: Uuid,
    pub success: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDto {
    pub id: Uuid,
    pub name: String,
    pub client_number: String,
    pub description: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    pub is_active: bool,
    pub contacts: Vec<ContactPerson>,
    pub notification_settings: logvault_core::NotificationSettings,
    pub metadata: Option<HashMap<String, String>>,
}

impl From<Client> for ClientDto {
    fn from(client: Client) -> Self {
        Self {
            id: client.id,
            name: client.name,
            client_number: client.client_number,
            description: client.description,
            email: client.email,
            phone: client.phone,
            address: client.address,
            created_at: client.created_at,
            last_updated_at: client.last_updated_at,
            is_active: client.is_active,
            contacts: client.contacts,
            notification_settings: client.notification_settings,
            metadata: client.metadata,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub roles: Vec<String>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}
