use std::sync::Arc;
use tracing::info;

use logvault_analysis::AnalysisEngine;
use logvault_api::config::ApiConfig;
use logvault_api::state::AppState;
use logvault_api::worker::{self, WorkerDeps};
use logvault_api::router;
use logvault_auth::AuthService;
use logvault_core::{ClientRepository, LogRepository, ServiceRepository};
use logvault_notify::Notifier;
use logvault_store::{
    db, SqliteClientRepository, SqliteLogRepository, SqliteServiceRepository,
    SqliteUserRepository,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenvy::dotenv().ok();

    // logging setup
    tracing_subscriber::fmt::init();

    let config = ApiConfig::load()?;

    info!("Connecting to database...");
    let pool = db::connect(&config.database_url).await?;
    db::init_schema(&pool).await?;
    info!("Database ready");

    let logs: Arc<dyn LogRepository> = Arc::new(SqliteLogRepository::new(pool.clone()));
    let services: Arc<dyn ServiceRepository> = Arc::new(
        SqliteServiceRepository::new(pool.clone()).with_staleness(config.staleness_factor),
    );
    let clients: Arc<dyn ClientRepository> = Arc::new(SqliteClientRepository::new(pool.clone()));
    let users = Arc::new(SqliteUserRepository::new(pool));

    let auth = Arc::new(AuthService::new(
        users,
        services.clone(),
        config.auth_config(),
    ));
    let engine = Arc::new(AnalysisEngine::new(config.analysis_config()));
    info!(backend = engine.backend_name(), "analysis engine ready");
    let notifier = Arc::new(Notifier::new(config.notifier_settings()));

    let (analysis_queue, workers) = worker::spawn_workers(
        config.worker.workers,
        config.worker.queue_capacity,
        WorkerDeps {
            logs: logs.clone(),
            services: services.clone(),
            clients: clients.clone(),
            engine: engine.clone(),
            notifier: notifier.clone(),
        },
    );

    let state = Arc::new(AppState {
        logs,
        services,
        clients,
        auth,
        engine,
        notifier,
        analysis_queue,
    });
    let app = router(state);

    info!("Starting server on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    workers.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
    info!("Shutdown signal received");
}
