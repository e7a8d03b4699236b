// Analysis engine
// Orchestrates: heuristic triage -> anomaly grouping -> suggestions,
// with an optional external workflow engine backend.

use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;

use logvault_core::{
    AnalysisAnomaly, AnalysisReport, AnalysisResult, LogEntry, LogLevel, Suggestion,
    WorkflowOutcome,
};

use crate::workflow_client::WorkflowClient;

/// Engine configuration. A workflow engine is attached when both the URL
/// and key are present; otherwise the built-in heuristics run alone.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub workflow_url: Option<String>,
    pub workflow_api_key: Option<String>,
    /// How many repeated-message groups to surface per batch.
    pub max_pattern_groups: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            workflow_url: None,
            workflow_api_key: None,
            max_pattern_groups: 5,
        }
    }
}

/// Active backend.
enum Backend {
    Builtin,
    Workflow(WorkflowClient),
}

pub struct AnalysisEngine {
    config: AnalysisConfig,
    backend: Backend,
}

impl AnalysisEngine {
    pub fn new(config: AnalysisConfig) -> Self {
        let backend = match (&config.workflow_url, &config.workflow_api_key) {
            (Some(url), Some(key)) => Backend::Workflow(WorkflowClient::new(url, key)),
            _ => Backend::Builtin,
        };
        Self { config, backend }
    }

    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            Backend::Builtin => "builtin",
            Backend::Workflow(_) => "workflow",
        }
    }

    /// Analyze a single entry. Prefers the workflow engine when one is
    /// configured and falls back to the built-in heuristics on any failure,
    /// so this never errors out of the ingestion path.
    pub async fn analyze_log(&self, entry: &LogEntry) -> AnalysisResult {
        info!(id = %entry.id, level = ?entry.level, "analyzing log entry");

        if let Backend::Workflow(client) = &self.backend {
            let payload = json!({
                "logId": entry.id,
                "service": entry.service_name,
                "level": entry.level.as_str(),
                "message": entry.message,
                "exceptionDetails": entry.exception_details,
            });
            match client.run("analyze-log", &payload).await {
                Ok(value) => {
                    let summary = value
                        .get("summary")
                        .and_then(|v| v.as_str())
                        .map(str::to_string)
                        .unwrap_or_else(|| self.builtin_summary(entry));
                    let mut result = self.builtin_analysis(entry);
                    result.summary = summary;
                    result.raw = Some(value.to_string());
                    return result;
                }
                Err(e) => {
                    warn!(id = %entry.id, "workflow analysis failed, using builtin: {e}");
                }
            }
        }

        self.builtin_analysis(entry)
    }

    /// Analyze a batch for recurring patterns.
    pub async fn analyze_pattern(&self, logs: &[LogEntry]) -> AnalysisResult {
        let error_count = logs.iter().filter(|l| l.level >= LogLevel::Error).count();
        let warning_count = logs.iter().filter(|l| l.level == LogLevel::Warning).count();
        let services: std::collections::HashSet<Uuid> =
            logs.iter().map(|l| l.service_id).collect();

        let anomalies = self.detect_anomalies(logs);
        let suggestions = anomalies
            .iter()
            .take(1)
            .flat_map(|a| {
                logs.iter()
                    .find(|l| a.related_log_ids.contains(&l.id))
                    .map(|l| self.suggest_solutions(l, None))
                    .unwrap_or_default()
            })
            .collect();

        AnalysisResult {
            id: Uuid::new_v4(),
            analyzed_at: Utc::now(),
            summary: format!(
                "Analyzed {} logs across {} services. Found {} errors and {} warnings.",
                logs.len(),
                services.len(),
                error_count,
                warning_count
            ),
            confidence: 75,
            anomalies,
            suggestions,
            raw: None,
        }
    }

    /// Group error-level entries by identical message; groups seen more
    /// than once become anomalies, largest first.
    pub fn detect_anomalies(&self, logs: &[LogEntry]) -> Vec<AnalysisAnomaly> {
        let mut groups: HashMap<&str, Vec<&LogEntry>> = HashMap::new();
        for entry in logs.iter().filter(|l| l.level >= LogLevel::Error) {
            groups.entry(entry.message.as_str()).or_default().push(entry);
        }

        let mut repeated: Vec<(&str, Vec<&LogEntry>)> = groups
            .into_iter()
            .filter(|(_, members)| members.len() > 1)
            .collect();
        repeated.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then(a.0.cmp(b.0)));
        repeated.truncate(self.config.max_pattern_groups);

        repeated
            .into_iter()
            .map(|(message, members)| {
                let severity = members
                    .iter()
                    .map(|l| l.level)
                    .max()
                    .unwrap_or(LogLevel::Error);
                let first_seen = members
                    .iter()
                    .map(|l| l.timestamp)
                    .min()
                    .unwrap_or_else(Utc::now);
                let last_seen = members
                    .iter()
                    .map(|l| l.timestamp)
                    .max()
                    .unwrap_or_else(Utc::now);
                AnalysisAnomaly {
                    id: Uuid::new_v4(),
                    kind: "Recurring Error".to_string(),
                    description: format!(
                        "Message repeated {} times: {}",
                        members.len(),
                        message
                    ),
                    severity,
                    related_log_ids: members.iter().map(|l| l.id).collect(),
                    occurrences: members.len() as u64,
                    first_seen,
                    last_seen,
                }
            })
            .collect()
    }

    /// Remediation hints for one entry, based on its categories.
    pub fn suggest_solutions(&self, entry: &LogEntry, source: Option<&str>) -> Vec<Suggestion> {
        let mut suggestions = vec![Suggestion {
            id: Uuid::new_v4(),
            title: "Investigate error source".to_string(),
            description: format!(
                "Investigate the root cause of the {:?} in {}. Check the error message and stack trace for details.",
                entry.level, entry.service_name
            ),
            action: None,
            kind: "troubleshooting".to_string(),
            confidence: 85,
            references: vec!["error logs".to_string(), "service documentation".to_string()],
        }];

        for category in self.categorize(entry) {
            let (title, description) = match category.as_str() {
                "timeout" => (
                    "Review timeout budgets",
                    "A timeout was reported. Compare the configured deadline against the dependency's current latency.",
                ),
                "connection" => (
                    "Check network reachability",
                    "A connection failure was reported. Verify the target host is up and reachable from this environment.",
                ),
                "database" => (
                    "Inspect database health",
                    "A database failure was reported. Check connection pool saturation and recent migrations.",
                ),
                "authentication" => (
                    "Audit credentials",
                    "An authentication failure was reported. Confirm the credentials or tokens in use have not expired or been rotated.",
                ),
                "memory" => (
                    "Profile memory usage",
                    "Memory exhaustion was reported. Capture a heap profile and review recent allocation-heavy changes.",
                ),
                _ => continue,
            };
            suggestions.push(Suggestion {
                id: Uuid::new_v4(),
                title: title.to_string(),
                description: description.to_string(),
                action: None,
                kind: category,
                confidence: 70,
                references: Vec::new(),
            });
        }

        if let Some(path) = source {
            suggestions.push(Suggestion {
                id: Uuid::new_v4(),
                title: "Review source".to_string(),
                description: format!("Inspect {path} around the failing call site."),
                action: None,
                kind: "code-review".to_string(),
                confidence: 60,
                references: vec![path.to_string()],
            });
        }

        suggestions
    }

    /// Aggregate report over one service's entries in a date range.
    pub fn generate_report(
        &self,
        service_id: Uuid,
        logs: &[LogEntry],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AnalysisReport {
        let mut level_counts: HashMap<LogLevel, u64> = HashMap::new();
        for entry in logs {
            *level_counts.entry(entry.level).or_default() += 1;
        }

        let errors = level_counts
            .iter()
            .filter(|(level, _)| **level >= LogLevel::Error)
            .map(|(_, count)| count)
            .sum::<u64>();

        let anomalies = self.detect_anomalies(logs);
        let suggestions = logs
            .iter()
            .filter(|l| l.level >= LogLevel::Error)
            .max_by_key(|l| l.timestamp)
            .map(|l| self.suggest_solutions(l, None))
            .unwrap_or_default();

        let mut trends = Vec::new();
        if errors > 0 {
            trends.push(format!(
                "{errors} error-level entries out of {} in the period",
                logs.len()
            ));
        }
        if let Some(anomaly) = anomalies.first() {
            trends.push(format!(
                "most frequent failure repeated {} times",
                anomaly.occurrences
            ));
        }

        AnalysisReport {
            id: Uuid::new_v4(),
            service_id,
            generated_at: Utc::now(),
            start_date: start,
            end_date: end,
            executive_summary: format!(
                "{} entries between {} and {}; {} at error level or above.",
                logs.len(),
                start.format("%Y-%m-%d %H:%M"),
                end.format("%Y-%m-%d %H:%M"),
                errors
            ),
            level_counts,
            anomalies,
            suggestions,
            trends,
        }
    }

    /// Keyword categorization over message and exception text.
    pub fn categorize(&self, entry: &LogEntry) -> Vec<String> {
        let mut haystack = entry.message.to_lowercase();
        if let Some(exception) = &entry.exception_details {
            haystack.push(' ');
            haystack.push_str(&exception.to_lowercase());
        }

        const RULES: &[(&str, &[&str])] = &[
            ("timeout", &["timeout", "timed out", "deadline exceeded"]),
            ("connection", &["connection refused", "connection reset", "unreachable", "broken pipe"]),
            ("database", &["database", "sql", "deadlock", "constraint"]),
            ("authentication", &["unauthorized", "forbidden", "authentication", "invalid token"]),
            ("memory", &["out of memory", "oom", "heap", "allocation failed"]),
            ("http", &["status code", "http 5", "http 4", "bad gateway"]),
        ];

        let mut categories: Vec<String> = RULES
            .iter()
            .filter(|(_, needles)| needles.iter().any(|n| haystack.contains(n)))
            .map(|(name, _)| name.to_string())
            .collect();
        if categories.is_empty() {
            categories.push("general".to_string());
        }
        categories
    }

    /// Run a named workflow on the external engine. Engine failures come
    /// back as a failed outcome, never as an error; without a configured
    /// engine the execution is simulated, matching the stub contract.
    pub async fn execute_workflow(
        &self,
        log_id: Uuid,
        workflow: &str,
        parameters: Option<serde_json::Value>,
    ) -> WorkflowOutcome {
        info!(%log_id, workflow, "executing workflow");
        match &self.backend {
            Backend::Workflow(client) => {
                let payload = json!({ "logId": log_id, "parameters": parameters });
                match client.run(workflow, &payload).await {
                    Ok(value) => WorkflowOutcome {
                        id: Uuid::new_v4(),
                        workflow: workflow.to_string(),
                        executed_at: Utc::now(),
                        status: "completed".to_string(),
                        result: Some(value.to_string()),
                        error: None,
                    },
                    Err(e) => WorkflowOutcome {
                        id: Uuid::new_v4(),
                        workflow: workflow.to_string(),
                        executed_at: Utc::now(),
                        status: "failed".to_string(),
                        result: None,
                        error: Some(e.to_string()),
                    },
                }
            }
            Backend::Builtin => WorkflowOutcome {
                id: Uuid::new_v4(),
                workflow: workflow.to_string(),
                executed_at: Utc::now(),
                status: "simulated".to_string(),
                result: Some(format!("workflow {workflow} queued for log {log_id}")),
                error: None,
            },
        }
    }

    fn builtin_summary(&self, entry: &LogEntry) -> String {
        let categories = self.categorize(entry).join(", ");
        format!(
            "{:?} in {} ({}): {} [categories: {}]",
            entry.level, entry.service_name, entry.environment, entry.message, categories
        )
    }

    fn builtin_analysis(&self, entry: &LogEntry) -> AnalysisResult {
        let mut anomalies = Vec::new();
        let mut suggestions = Vec::new();

        if entry.level >= LogLevel::Error {
            anomalies.push(AnalysisAnomaly {
                id: Uuid::new_v4(),
                kind: if entry.level == LogLevel::Error {
                    "Error".to_string()
                } else {
                    "Critical Error".to_string()
                },
                description: format!(
                    "Detected {:?} in service {}: {}",
                    entry.level, entry.service_name, entry.message
                ),
                severity: entry.level,
                related_log_ids: vec![entry.id],
                occurrences: 1,
                first_seen: entry.timestamp,
                last_seen: entry.timestamp,
            });
            suggestions = self.suggest_solutions(entry, None);
        }

        AnalysisResult {
            id: Uuid::new_v4(),
            analyzed_at: Utc::now(),
            summary: self.builtin_summary(entry),
            confidence: 80,
            anomalies,
            suggestions,
            raw: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(level: LogLevel, message: &str) -> LogEntry {
        LogEntry {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            level,
            message: message.to_string(),
            service_id: Uuid::new_v4(),
            service_name: "orders".to_string(),
            service_version: "1.0.0".to_string(),
            environment: "production".to_string(),
            category: String::new(),
            client_id: None,
            client_name: None,
            exception_details: None,
            stack_trace: None,
            correlation_id: None,
            context_data: None,
            contains_sensitive_data: false,
            ip_address: None,
            analyzed: false,
            analysis_result: None,
            received_at: Utc::now(),
            metadata: None,
        }
    }

    #[tokio::test]
    async fn error_entries_get_anomalies_and_suggestions() {
        let engine = AnalysisEngine::new(AnalysisConfig::default());
        let result = engine
            .analyze_log(&entry(LogLevel::Error, "connection refused to db-01"))
            .await;

        assert!(!result.summary.is_empty());
        assert_eq!(result.anomalies.len(), 1);
        assert!(!result.suggestions.is_empty());
        assert_eq!(result.confidence, 80);
    }

    #[tokio::test]
    async fn info_entries_stay_clean() {
        let engine = AnalysisEngine::new(AnalysisConfig::default());
        let result = engine
            .analyze_log(&entry(LogLevel::Information, "started ok"))
            .await;
        assert!(result.anomalies.is_empty());
        assert!(result.suggestions.is_empty());
    }

    #[test]
    fn categorize_finds_known_failure_classes() {
        let engine = AnalysisEngine::new(AnalysisConfig::default());
        let categories =
            engine.categorize(&entry(LogLevel::Error, "Deadline exceeded calling payments"));
        assert_eq!(categories, vec!["timeout".to_string()]);

        let mut with_exception = entry(LogLevel::Error, "request failed");
        with_exception.exception_details = Some("SqlException: deadlock detected".to_string());
        let categories = engine.categorize(&with_exception);
        assert!(categories.contains(&"database".to_string()));

        let categories = engine.categorize(&entry(LogLevel::Error, "something odd"));
        assert_eq!(categories, vec!["general".to_string()]);
    }

    #[test]
    fn detect_anomalies_groups_repeated_messages() {
        let engine = AnalysisEngine::new(AnalysisConfig::default());
        let mut logs = vec![
            entry(LogLevel::Error, "connection refused"),
            entry(LogLevel::Error, "connection refused"),
            entry(LogLevel::Critical, "connection refused"),
            entry(LogLevel::Error, "one-off failure"),
            entry(LogLevel::Information, "noise"),
        ];
        logs[0].timestamp = Utc::now() - chrono::Duration::minutes(10);

        let anomalies = engine.detect_anomalies(&logs);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].occurrences, 3);
        assert_eq!(anomalies[0].severity, LogLevel::Critical);
        assert!(anomalies[0].first_seen < anomalies[0].last_seen);
    }

    #[tokio::test]
    async fn pattern_summary_counts_levels_and_services() {
        let engine = AnalysisEngine::new(AnalysisConfig::default());
        let logs = vec![
            entry(LogLevel::Error, "a"),
            entry(LogLevel::Warning, "b"),
            entry(LogLevel::Information, "c"),
        ];
        let result = engine.analyze_pattern(&logs).await;
        assert!(result.summary.contains("3 logs"));
        assert!(result.summary.contains("1 errors"));
        assert!(result.summary.contains("1 warnings"));
    }

    #[tokio::test]
    async fn builtin_workflow_execution_is_simulated() {
        let engine = AnalysisEngine::new(AnalysisConfig::default());
        let outcome = engine.execute_workflow(Uuid::new_v4(), "escalate", None).await;
        assert_eq!(outcome.status, "simulated");
        assert!(outcome.error.is_none());
    }

    #[test]
    fn report_tallies_levels() {
        let engine = AnalysisEngine::new(AnalysisConfig::default());
        let logs = vec![
            entry(LogLevel::Error, "x failed"),
            entry(LogLevel::Error, "x failed"),
            entry(LogLevel::Information, "fine"),
        ];
        let start = Utc::now() - chrono::Duration::hours(1);
        let end = Utc::now();
        let report = engine.generate_report(Uuid::new_v4(), &logs, start, end);

        assert_eq!(report.level_counts.get(&LogLevel::Error), Some(&2));
        assert_eq!(report.level_counts.get(&LogLevel::Information), Some(&1));
        assert_eq!(report.anomalies.len(), 1);
        assert!(!report.trends.is_empty());
        assert!(!report.suggestions.is_empty());
    }
}
