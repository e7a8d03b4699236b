//! Registered service repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use logvault_core::{LogLevel, RegisteredService, ServiceRepository, StoreError};
use sqlx::sqlite::SqlitePool;
use sqlx::{QueryBuilder, Sqlite};
use uuid::Uuid;

use crate::convert::{db_err, from_millis, millis, opt_json, parse_uuid, to_json};

/// Default multiplier on a service's reporting interval before it counts
/// as offline.
pub const DEFAULT_STALENESS_FACTOR: f64 = 2.0;

pub struct SqliteServiceRepository {
    pool: SqlitePool,
    staleness_factor: f64,
}

impl SqliteServiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            staleness_factor: DEFAULT_STALENESS_FACTOR,
        }
    }

    /// Override the staleness multiplier used by [`ServiceRepository::stale`].
    pub fn with_staleness(mut self, factor: f64) -> Self {
        self.staleness_factor = factor.max(0.0);
        self
    }
}

#[derive(sqlx::FromRow)]
struct ServiceRow {
    id: String,
    name: String,
    description: String,
    version: String,
    service_type: String,
    api_key: String,
    created_at: i64,
    last_updated_at: i64,
    last_log_received_at: Option<i64>,
    client_id: String,
    client_name: String,
    environment: String,
    reporting_interval_minutes: i64,
    is_active: bool,
    is_online: bool,
    alerts_enabled: bool,
    alert_threshold: i64,
    alert_recipients: String,
    webhook_url: Option<String>,
    metadata: Option<String>,
    source_path: Option<String>,
}

impl ServiceRow {
    fn into_service(self) -> Result<RegisteredService, StoreError> {
        Ok(RegisteredService {
            id: parse_uuid(&self.id)?,
            name: self.name,
            description: self.description,
            version: self.version,
            service_type: self.service_type,
            api_key: self.api_key,
            created_at: from_millis(self.created_at)?,
            last_updated_at: from_millis(self.last_updated_at)?,
            last_log_received_at: self.last_log_received_at.map(from_millis).transpose()?,
            client_id: parse_uuid(&self.client_id)?,
            client_name: self.client_name,
            environment: self.environment,
            reporting_interval_minutes: self.reporting_interval_minutes,
            is_active: self.is_active,
            is_online: self.is_online,
            alerts_enabled: self.alerts_enabled,
            alert_threshold: LogLevel::from_i64(self.alert_threshold).ok_or_else(|| {
                StoreError::Decode(format!("unknown alert threshold {}", self.alert_threshold))
            })?,
            alert_recipients: crate::convert::from_json(&self.alert_recipients)?,
            webhook_url: self.webhook_url,
            metadata: opt_json(self.metadata.as_deref())?,
            source_path: self.source_path,
        })
    }
}

fn collect(rows: Vec<ServiceRow>) -> Result<Vec<RegisteredService>, StoreError> {
    rows.into_iter().map(ServiceRow::into_service).collect()
}

#[async_trait]
impl ServiceRepository for SqliteServiceRepository {
    async fn add(&self, service: &RegisteredService) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO services (
                id, name, description, version, service_type, api_key,
                created_at, last_updated_at, last_log_received_at,
                client_id, client_name, environment, reporting_interval_minutes,
                is_active, is_online, alerts_enabled, alert_threshold,
                alert_recipients, webhook_url, metadata, source_path
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21
            )",
        )
        .bind(service.id.to_string())
        .bind(&service.name)
        .bind(&service.description)
        .bind(&service.version)
        .bind(&service.service_type)
        .bind(&service.api_key)
        .bind(millis(service.created_at))
        .bind(millis(service.last_updated_at))
        .bind(service.last_log_received_at.map(millis))
        .bind(service.client_id.to_string())
        .bind(&service.client_name)
        .bind(&service.environment)
        .bind(service.reporting_interval_minutes)
        .bind(service.is_active)
        .bind(service.is_online)
        .bind(service.alerts_enabled)
        .bind(service.alert_threshold.as_i64())
        .bind(to_json(&service.alert_recipients))
        .bind(&service.webhook_url)
        .bind(service.metadata.as_ref().map(to_json))
        .bind(&service.source_path)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn update(&self, service: &RegisteredService) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE services SET
                name = ?1, description = ?2, version = ?3, service_type = ?4,
                last_updated_at = ?5, environment = ?6,
                reporting_interval_minutes = ?7, alerts_enabled = ?8,
                alert_threshold = ?9, alert_recipients = ?10, webhook_url = ?11,
                metadata = ?12, source_path = ?13
             WHERE id = ?14",
        )
        .bind(&service.name)
        .bind(&service.description)
        .bind(&service.version)
        .bind(&service.service_type)
        .bind(millis(service.last_updated_at))
        .bind(&service.environment)
        .bind(service.reporting_interval_minutes)
        .bind(service.alerts_enabled)
        .bind(service.alert_threshold.as_i64())
        .bind(to_json(&service.alert_recipients))
        .bind(&service.webhook_url)
        .bind(service.metadata.as_ref().map(to_json))
        .bind(&service.source_path)
        .bind(service.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn get(&self, id: Uuid) -> Result<Option<RegisteredService>, StoreError> {
        let row = sqlx::query_as::<_, ServiceRow>("SELECT * FROM services WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(ServiceRow::into_service).transpose()
    }

    async fn get_by_api_key(
        &self,
        api_key: &str,
    ) -> Result<Option<RegisteredService>, StoreError> {
        let row = sqlx::query_as::<_, ServiceRow>("SELECT * FROM services WHERE api_key = ?1")
            .bind(api_key)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(ServiceRow::into_service).transpose()
    }

    async fn by_client(&self, client_id: Uuid) -> Result<Vec<RegisteredService>, StoreError> {
        let rows = sqlx::query_as::<_, ServiceRow>(
            "SELECT * FROM services WHERE client_id = ?1 ORDER BY name",
        )
        .bind(client_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        collect(rows)
    }

    async fn all(&self, include_inactive: bool) -> Result<Vec<RegisteredService>, StoreError> {
        let sql = if include_inactive {
            "SELECT * FROM services ORDER BY name"
        } else {
            "SELECT * FROM services WHERE is_active = 1 ORDER BY name"
        };
        let rows = sqlx::query_as::<_, ServiceRow>(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        collect(rows)
    }

    async fn set_online(
        &self,
        id: Uuid,
        online: bool,
        last_log_received_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE services SET is_online = ?1, last_log_received_at = ?2 WHERE id = ?3",
        )
        .bind(online)
        .bind(millis(last_log_received_at))
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn activate(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE services SET is_active = 1, last_updated_at = ?1 WHERE id = ?2")
            .bind(millis(Utc::now()))
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn deactivate(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE services SET is_active = 0, last_updated_at = ?1 WHERE id = ?2")
            .bind(millis(Utc::now()))
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn regenerate_api_key(&self, id: Uuid) -> Result<Option<String>, StoreError> {
        let api_key = RegisteredService::issue_api_key();
        let result = sqlx::query(
            "UPDATE services SET api_key = ?1, last_updated_at = ?2 WHERE id = ?3",
        )
        .bind(&api_key)
        .bind(millis(Utc::now()))
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok((result.rows_affected() > 0).then_some(api_key))
    }

    async fn search(
        &self,
        term: &str,
        client_id: Option<Uuid>,
    ) -> Result<Vec<RegisteredService>, StoreError> {
        let pattern = format!("%{}%", term.to_lowercase());
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT * FROM services WHERE (lower(name) LIKE ",
        );
        builder.push_bind(pattern.clone());
        builder.push(" OR lower(description) LIKE ").push_bind(pattern.clone());
        builder.push(" OR lower(service_type) LIKE ").push_bind(pattern);
        builder.push(")");
        if let Some(client_id) = client_id {
            builder.push(" AND client_id = ").push_bind(client_id.to_string());
        }
        builder.push(" ORDER BY name");

        let rows = builder
            .build_query_as::<ServiceRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        collect(rows)
    }

    async fn exists(&self, id: Uuid) -> Result<bool, StoreError> {
        let found: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM services WHERE id = ?1)")
            .bind(id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(found != 0)
    }

    async fn stale(&self) -> Result<Vec<RegisteredService>, StoreError> {
        let now = millis(Utc::now());
        let interval_unit_ms = self.staleness_factor * 60_000.0;
        let rows = sqlx::query_as::<_, ServiceRow>(
            "SELECT * FROM services WHERE is_active = 1 AND (
                (last_log_received_at IS NOT NULL
                    AND last_log_received_at < ?1 - CAST(reporting_interval_minutes * ?2 AS INTEGER))
                OR (last_log_received_at IS NULL
                    AND created_at < ?1 - CAST(reporting_interval_minutes * ?2 AS INTEGER))
             ) ORDER BY name",
        )
        .bind(now)
        .bind(interval_unit_ms)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        collect(rows)
    }
}
