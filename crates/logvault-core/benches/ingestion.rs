//! Benchmark for entry construction on the ingestion path.
//! Run: cargo bench -p logvault-core --bench ingestion

use chrono::Utc;
use criterion::{criterion_group, criterion_main, Criterion};
use logvault_core::{LogDraft, LogEntry, LogLevel, RegisteredService};
use std::hint::black_box;
use uuid::Uuid;

const MESSAGE: &str =
    "Failed to connect to database: connection refused (host=db-01 port=5432 retries=3)";

fn bench_level_parsing(c: &mut Criterion) {
    c.bench_function("level_parse_single", |b| {
        b.iter(|| LogLevel::from_str(black_box("Warning")))
    });
}

fn bench_entry_construction(c: &mut Criterion) {
    let service = RegisteredService {
        id: Uuid::new_v4(),
        name: "payment-api".to_string(),
        description: String::new(),
        version: "1.4.2".to_string(),
        service_type: "web".to_string(),
        api_key: RegisteredService::issue_api_key(),
        created_at: Utc::now(),
        last_updated_at: Utc::now(),
        last_log_received_at: None,
        client_id: Uuid::new_v4(),
        client_name: "Acme".to_string(),
        environment: "production".to_string(),
        reporting_interval_minutes: 60,
        is_active: true,
        is_online: true,
        alerts_enabled: true,
        alert_threshold: LogLevel::Error,
        alert_recipients: Vec::new(),
        webhook_url: None,
        metadata: None,
        source_path: None,
    };

    c.bench_function("entry_from_draft", |b| {
        b.iter(|| {
            let draft = LogDraft {
                message: MESSAGE.to_string(),
                timestamp: None,
                level: Some(LogLevel::Error),
                category: Some("database".to_string()),
                correlation_id: None,
                exception_details: None,
                stack_trace: None,
                context_data: None,
                contains_sensitive_data: false,
                metadata: None,
            };
            LogEntry::from_draft(black_box(draft), black_box(&service), None)
        })
    });
}

criterion_group!(benches, bench_level_parsing, bench_entry_construction);
criterion_main!(benches);
