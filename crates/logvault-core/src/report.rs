//! Results produced by the analysis collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::LogLevel;

/// Outcome of analyzing a single entry or a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub id: Uuid,
    pub analyzed_at: DateTime<Utc>,
    pub summary: String,
    /// 0-100 confidence in the summary.
    pub confidence: u8,
    pub anomalies: Vec<AnalysisAnomaly>,
    pub suggestions: Vec<Suggestion>,
    pub raw: Option<String>,
}

/// A pattern or spike worth attention.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisAnomaly {
    pub id: Uuid,
    pub kind: String,
    pub description: String,
    pub severity: LogLevel,
    pub related_log_ids: Vec<Uuid>,
    pub occurrences: u64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// A proposed remediation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub action: Option<String>,
    pub kind: String,
    pub confidence: u8,
    pub references: Vec<String>,
}

/// Aggregate report over a service and a time range.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub id: Uuid,
    pub service_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub executive_summary: String,
    pub level_counts: HashMap<LogLevel, u64>,
    pub anomalies: Vec<AnalysisAnomaly>,
    pub suggestions: Vec<Suggestion>,
    pub trends: Vec<String>,
}

/// Result of running a named workflow on the external engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowOutcome {
    pub id: Uuid,
    pub workflow: String,
    pub executed_at: DateTime<Utc>,
    pub status: String,
    pub result: Option<String>,
    pub error: Option<String>,
}
