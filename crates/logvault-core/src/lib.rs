//! Core types for the log management platform.
//! This crate contains the shared domain records and the repository
//! contracts used across all components.

pub mod client;
pub mod error;
pub mod report;
pub mod repository;
pub mod service;
pub mod user;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

pub use client::{Client, ContactPerson, NotificationSettings};
pub use error::StoreError;
pub use report::{AnalysisAnomaly, AnalysisReport, AnalysisResult, Suggestion, WorkflowOutcome};
pub use repository::{
    ClientRepository, LogQuery, LogRepository, Page, ServiceRepository, UserRepository,
};
pub use service::RegisteredService;
pub use user::{AccessLevel, ClientAccess, ConfirmationToken, User};

// LOG LEVEL //

/// Log severity levels (ordered from lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[serde(alias = "info")]
    Information,
    #[serde(alias = "warn")]
    Warning,
    #[serde(alias = "err")]
    Error,
    #[serde(alias = "fatal")]
    Critical,
}

impl LogLevel {
    /// Parse log level from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "information" | "info" => Some(Self::Information),
            "warning" | "warn" => Some(Self::Warning),
            "error" | "err" => Some(Self::Error),
            "critical" | "crit" | "fatal" => Some(Self::Critical),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Information => "information",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }

    /// Numeric form used by the storage layer and level-range queries.
    pub fn as_i64(self) -> i64 {
        self as i64
    }

    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Trace),
            1 => Some(Self::Debug),
            2 => Some(Self::Information),
            3 => Some(Self::Warning),
            4 => Some(Self::Error),
            5 => Some(Self::Critical),
            _ => None,
        }
    }
}

// LOG DRAFT (what the ingestion API receives) //

/// Unprocessed log submission as sent by an authenticated service.
/// Service identity is attached server-side after API-key resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogDraft {
    pub message: String,

    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,

    #[serde(default)]
    pub level: Option<LogLevel>,

    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub correlation_id: Option<String>,

    #[serde(default)]
    pub exception_details: Option<String>,

    #[serde(default)]
    pub stack_trace: Option<String>,

    #[serde(default)]
    pub context_data: Option<String>,

    #[serde(default)]
    pub contains_sensitive_data: bool,

    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
}

// LOG ENTRY (persisted record) //

/// A stored log entry. Service and client identity are denormalized onto
/// the entry at write time so searches never need a join. Immutable after
/// insert except for the analysis pair, which is set once by the analysis
/// path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
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

    pub contains_sensitive_data: bool,
    pub ip_address: Option<String>,

    pub analyzed: bool,
    pub analysis_result: Option<String>,

    /// When the platform received the entry (server-assigned).
    pub received_at: DateTime<Utc>,

    pub metadata: Option<HashMap<String, String>>,
}

impl LogEntry {
    /// Build a persistable entry from a raw submission, copying the
    /// resolved service's identity onto it.
    pub fn from_draft(draft: LogDraft, service: &RegisteredService, ip: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            timestamp: draft.timestamp.unwrap_or(now),
            level: draft.level.unwrap_or(LogLevel::Information),
            message: draft.message,
            service_id: service.id,
            service_name: service.name.clone(),
            service_version: service.version.clone(),
            environment: service.environment.clone(),
            category: draft.category.unwrap_or_default(),
            client_id: Some(service.client_id),
            client_name: Some(service.client_name.clone()),
            exception_details: draft.exception_details,
            stack_trace: draft.stack_trace,
            correlation_id: draft.correlation_id,
            context_data: draft.context_data,
            contains_sensitive_data: draft.contains_sensitive_data,
            ip_address: ip,
            analyzed: false,
            analysis_result: None,
            received_at: now,
            metadata: draft.metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_ordering() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Warning < LogLevel::Error);
        assert!(LogLevel::Error < LogLevel::Critical);
    }

    #[test]
    fn level_parsing_aliases() {
        assert_eq!(LogLevel::from_str("INFO"), Some(LogLevel::Information));
        assert_eq!(LogLevel::from_str("warn"), Some(LogLevel::Warning));
        assert_eq!(LogLevel::from_str("fatal"), Some(LogLevel::Critical));
        assert_eq!(LogLevel::from_str("nope"), None);
    }

    #[test]
    fn level_roundtrips_through_i64() {
        for level in [
            LogLevel::Trace,
            LogLevel::Debug,
            LogLevel::Information,
            LogLevel::Warning,
            LogLevel::Error,
            LogLevel::Critical,
        ] {
            assert_eq!(LogLevel::from_i64(level.as_i64()), Some(level));
        }
        assert_eq!(LogLevel::from_i64(6), None);
    }

    fn fixture_service() -> RegisteredService {
        RegisteredService {
            id: Uuid::new_v4(),
            name: "billing-worker".to_string(),
            description: String::new(),
            version: "2.1.0".to_string(),
            service_type: "worker".to_string(),
            api_key: RegisteredService::issue_api_key(),
            created_at: Utc::now(),
            last_updated_at: Utc::now(),
            last_log_received_at: None,
            client_id: Uuid::new_v4(),
            client_name: "Acme".to_string(),
            environment: "production".to_string(),
            reporting_interval_minutes: 60,
            is_active: true,
            is_online: false,
            alerts_enabled: true,
            alert_threshold: LogLevel::Error,
            alert_recipients: Vec::new(),
            webhook_url: None,
            metadata: None,
            source_path: None,
        }
    }

    #[test]
    fn draft_becomes_entry_with_service_identity() {
        let service = fixture_service();
        let draft = LogDraft {
            message: "boom".to_string(),
            timestamp: None,
            level: Some(LogLevel::Error),
            category: Some("billing".to_string()),
            correlation_id: None,
            exception_details: None,
            stack_trace: None,
            context_data: None,
            contains_sensitive_data: false,
            metadata: None,
        };

        let entry = LogEntry::from_draft(draft, &service, Some("10.0.0.9".to_string()));
        assert_eq!(entry.service_id, service.id);
        assert_eq!(entry.service_name, service.name);
        assert_eq!(entry.client_id, Some(service.client_id));
        assert_eq!(entry.level, LogLevel::Error);
        assert!(!entry.analyzed);
        assert!(entry.analysis_result.is_none());
    }
}
