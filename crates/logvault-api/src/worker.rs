//! Background analysis: a bounded queue drained by a fixed pool of worker
//! tasks. Submission never blocks the request path; when the queue is full
//! the job is dropped with a warning. Workers swallow and log their own
//! failures, and the pool is detached from request lifetimes but torn down
//! at process shutdown.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use logvault_analysis::AnalysisEngine;
use logvault_core::{ClientRepository, LogEntry, LogRepository, ServiceRepository};
use logvault_notify::{Notifier, WebhookAlert};

/// Submission handle held by the request path.
#[derive(Clone)]
pub struct AnalysisQueue {
    tx: mpsc::Sender<LogEntry>,
}

impl AnalysisQueue {
    /// Non-blocking enqueue.
    pub fn submit(&self, entry: LogEntry) {
        match self.tx.try_send(entry) {
            Ok(()) => {}
            Err(TrySendError::Full(entry)) => {
                warn!(id = %entry.id, "analysis queue full, dropping job");
            }
            Err(TrySendError::Closed(entry)) => {
                warn!(id = %entry.id, "analysis queue closed, dropping job");
            }
        }
    }
}

/// Worker task handles, kept by the binary for shutdown.
pub struct AnalysisWorkers {
    handles: Vec<JoinHandle<()>>,
}

impl AnalysisWorkers {
    pub fn shutdown(self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

pub struct WorkerDeps {
    pub logs: Arc<dyn LogRepository>,
    pub services: Arc<dyn ServiceRepository>,
    pub clients: Arc<dyn ClientRepository>,
    pub engine: Arc<AnalysisEngine>,
    pub notifier: Arc<Notifier>,
}

pub fn spawn_workers(
    count: usize,
    capacity: usize,
    deps: WorkerDeps,
) -> (AnalysisQueue, AnalysisWorkers) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let rx = Arc::new(Mutex::new(rx));
    let deps = Arc::new(deps);

    let count = count.max(1);
    let mut handles = Vec::with_capacity(count);
    for worker in 0..count {
        let rx = Arc::clone(&rx);
        let deps = Arc::clone(&deps);
        handles.push(tokio::spawn(async move {
            loop {
                let entry = {
                    let mut rx = rx.lock().await;
                    rx.recv().await
                };
                let Some(entry) = entry else { break };
                process(&deps, entry).await;
            }
            debug!(worker, "analysis worker stopped");
        }));
    }

    info!(workers = count, capacity, "analysis worker pool started");
    (AnalysisQueue { tx }, AnalysisWorkers { handles })
}

/// Analyze one entry, persist the summary, then dispatch alerts if the
/// owning service wants them. Every failure is logged and swallowed; this
/// path must never surface errors to the request that queued it.
async fn process(deps: &WorkerDeps, entry: LogEntry) {
    let result = deps.engine.analyze_log(&entry).await;

    match deps.logs.set_analysis(entry.id, &result.summary).await {
        Ok(true) => info!(id = %entry.id, "analysis stored"),
        Ok(false) => warn!(id = %entry.id, "entry vanished before analysis was stored"),
        Err(e) => error!(id = %entry.id, "failed to store analysis: {e}"),
    }

    let service = match deps.services.get(entry.service_id).await {
        Ok(Some(service)) => service,
        Ok(None) => return,
        Err(e) => {
            error!(id = %entry.id, "failed to load service for alerting: {e}");
            return;
        }
    };
    if !service.alerts_enabled || entry.level < service.alert_threshold {
        return;
    }

    let client = match entry.client_id {
        Some(client_id) => match deps.clients.get(client_id).await {
            Ok(found) => found,
            Err(e) => {
                error!(id = %entry.id, "failed to load client for alerting: {e}");
                None
            }
        },
        None => None,
    };

    let recipients = deps.notifier.recipients_for_service(&service, client.as_ref());
    let mut annotated = entry.clone();
    annotated.analysis_result = Some(result.summary.clone());
    if let Err(e) = deps.notifier.send_critical_error(&annotated, &recipients).await {
        warn!(id = %entry.id, "alert email dispatch failed: {e}");
    }

    let webhook_url = service.webhook_url.clone().or_else(|| {
        client.as_ref().and_then(|c| {
            c.notification_settings
                .webhook_enabled
                .then(|| c.notification_settings.webhook_url.clone())
                .flatten()
        })
    });
    if let Some(url) = webhook_url {
        let payload = WebhookAlert {
            kind: "log-alert".to_string(),
            service: service.name.clone(),
            severity: entry.level.as_str().to_string(),
            message: entry.message.clone(),
            occurred_at: entry.timestamp,
        };
        if let Err(e) = deps.notifier.send_webhook(&payload, &url).await {
            warn!(id = %entry.id, "alert webhook dispatch failed: {e}");
        }
    }
}
