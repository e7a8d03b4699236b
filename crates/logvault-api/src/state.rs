use std::sync::Arc;

use logvault_analysis::AnalysisEngine;
use logvault_auth::AuthService;
use logvault_core::{ClientRepository, LogRepository, ServiceRepository};
use logvault_notify::Notifier;

use crate::worker::AnalysisQueue;

// App state - shared across handlers
pub struct AppState {
    pub logs: Arc<dyn LogRepository>,
    pub services: Arc<dyn ServiceRepository>,
    pub clients: Arc<dyn ClientRepository>,
    pub auth: Arc<AuthService>,
    pub engine: Arc<AnalysisEngine>,
    pub notifier: Arc<Notifier>,
    pub analysis_queue: AnalysisQueue,
}
