//! Pool construction and schema bootstrap.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

/// Open (and create if missing) the database at `url`,
/// e.g. `sqlite://logvault.db`.
pub async fn connect(url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}

/// In-memory database for tests. Capped at one connection: every pooled
/// connection to `:memory:` would otherwise see its own empty database.
pub async fn connect_memory() -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS logs (
        id TEXT PRIMARY KEY,
        timestamp INTEGER NOT NULL,
        level INTEGER NOT NULL,
        message TEXT NOT NULL,
        service_id TEXT NOT NULL,
        service_name TEXT NOT NULL,
        service_version TEXT NOT NULL DEFAULT '',
        environment TEXT NOT NULL DEFAULT '',
        category TEXT NOT NULL DEFAULT '',
        client_id TEXT,
        client_name TEXT,
        exception_details TEXT,
        stack_trace TEXT,
        correlation_id TEXT,
        context_data TEXT,
        contains_sensitive_data INTEGER NOT NULL DEFAULT 0,
        ip_address TEXT,
        analyzed INTEGER NOT NULL DEFAULT 0,
        analysis_result TEXT,
        received_at INTEGER NOT NULL,
        metadata TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_logs_timestamp ON logs(timestamp)",
    "CREATE INDEX IF NOT EXISTS idx_logs_service ON logs(service_id, timestamp)",
    "CREATE INDEX IF NOT EXISTS idx_logs_client ON logs(client_id, timestamp)",
    "CREATE INDEX IF NOT EXISTS idx_logs_level ON logs(level, timestamp)",
    "CREATE TABLE IF NOT EXISTS services (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        version TEXT NOT NULL DEFAULT '',
        service_type TEXT NOT NULL DEFAULT '',
        api_key TEXT NOT NULL UNIQUE,
        created_at INTEGER NOT NULL,
        last_updated_at INTEGER NOT NULL,
        last_log_received_at INTEGER,
        client_id TEXT NOT NULL,
        client_name TEXT NOT NULL DEFAULT '',
        environment TEXT NOT NULL DEFAULT '',
        reporting_interval_minutes INTEGER NOT NULL DEFAULT 60,
        is_active INTEGER NOT NULL DEFAULT 1,
        is_online INTEGER NOT NULL DEFAULT 0,
        alerts_enabled INTEGER NOT NULL DEFAULT 1,
        alert_threshold INTEGER NOT NULL DEFAULT 4,
        alert_recipients TEXT NOT NULL DEFAULT '[]',
        webhook_url TEXT,
        metadata TEXT,
        source_path TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_services_client ON services(client_id)",
    "CREATE TABLE IF NOT EXISTS clients (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        client_number TEXT NOT NULL UNIQUE,
        description TEXT NOT NULL DEFAULT '',
        email TEXT NOT NULL DEFAULT '',
        phone TEXT NOT NULL DEFAULT '',
        address TEXT NOT NULL DEFAULT '',
        created_at INTEGER NOT NULL,
        last_updated_at INTEGER NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 1,
        contacts TEXT NOT NULL DEFAULT '[]',
        notification_settings TEXT NOT NULL,
        metadata TEXT
    )",
    "CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        password_salt TEXT NOT NULL,
        display_name TEXT NOT NULL DEFAULT '',
        phone TEXT,
        email_confirmed INTEGER NOT NULL DEFAULT 0,
        phone_confirmed INTEGER NOT NULL DEFAULT 0,
        email_token TEXT,
        phone_token TEXT,
        two_factor_secret TEXT,
        failed_login_count INTEGER NOT NULL DEFAULT 0,
        locked_until INTEGER,
        roles TEXT NOT NULL DEFAULT '[]',
        client_access TEXT NOT NULL DEFAULT '[]',
        preferences TEXT NOT NULL DEFAULT '{}',
        created_at INTEGER NOT NULL,
        last_login_at INTEGER
    )",
];

/// Create all tables and indexes if they do not exist yet.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    info!("Database schema ready");
    Ok(())
}
