//! Log entry repository.

use async_trait::async_trait;
use logvault_core::{LogEntry, LogLevel, LogQuery, LogRepository, Page, StoreError};
use sqlx::sqlite::SqlitePool;
use sqlx::{QueryBuilder, Sqlite};
use uuid::Uuid;

use crate::convert::{db_err, from_millis, millis, opt_json, parse_uuid, to_json};

/// Hard cap on page size regardless of what the caller asks for.
const MAX_TAKE: u32 = 1000;

pub struct SqliteLogRepository {
    pool: SqlitePool,
}

impl SqliteLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct LogRow {
    id: String,
    timestamp: i64,
    level: i64,
    message: String,
    service_id: String,
    service_name: String,
    service_version: String,
    environment: String,
    category: String,
    client_id: Option<String>,
    client_name: Option<String>,
    exception_details: Option<String>,
    stack_trace: Option<String>,
    correlation_id: Option<String>,
    context_data: Option<String>,
    contains_sensitive_data: bool,
    ip_address: Option<String>,
    analyzed: bool,
    analysis_result: Option<String>,
    received_at: i64,
    metadata: Option<String>,
}

impl LogRow {
    fn into_entry(self) -> Result<LogEntry, StoreError> {
        Ok(LogEntry {
            id: parse_uuid(&self.id)?,
            timestamp: from_millis(self.timestamp)?,
            level: LogLevel::from_i64(self.level)
                .ok_or_else(|| StoreError::Decode(format!("unknown log level {}", self.level)))?,
            message: self.message,
            service_id: parse_uuid(&self.service_id)?,
            service_name: self.service_name,
            service_version: self.service_version,
            environment: self.environment,
            category: self.category,
            client_id: self.client_id.as_deref().map(parse_uuid).transpose()?,
            client_name: self.client_name,
            exception_details: self.exception_details,
            stack_trace: self.stack_trace,
            correlation_id: self.correlation_id,
            context_data: self.context_data,
            contains_sensitive_data: self.contains_sensitive_data,
            ip_address: self.ip_address,
            analyzed: self.analyzed,
            analysis_result: self.analysis_result,
            received_at: from_millis(self.received_at)?,
            metadata: opt_json(self.metadata.as_deref())?,
        })
    }
}

fn collect(rows: Vec<LogRow>) -> Result<Vec<LogEntry>, StoreError> {
    rows.into_iter().map(LogRow::into_entry).collect()
}

fn page_limits(page: Page) -> (i64, i64) {
    (i64::from(page.take.min(MAX_TAKE)), i64::from(page.skip))
}

const SELECT: &str = "SELECT * FROM logs";

#[async_trait]
impl LogRepository for SqliteLogRepository {
    async fn add(&self, entry: &LogEntry) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO logs (
                id, timestamp, level, message,
                service_id, service_name, service_version, environment,
                category, client_id, client_name,
                exception_details, stack_trace, correlation_id, context_data,
                contains_sensitive_data, ip_address,
                analyzed, analysis_result, received_at, metadata
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21
            )",
        )
        .bind(entry.id.to_string())
        .bind(millis(entry.timestamp))
        .bind(entry.level.as_i64())
        .bind(&entry.message)
        .bind(entry.service_id.to_string())
        .bind(&entry.service_name)
        .bind(&entry.service_version)
        .bind(&entry.environment)
        .bind(&entry.category)
        .bind(entry.client_id.map(|id| id.to_string()))
        .bind(&entry.client_name)
        .bind(&entry.exception_details)
        .bind(&entry.stack_trace)
        .bind(&entry.correlation_id)
        .bind(&entry.context_data)
        .bind(entry.contains_sensitive_data)
        .bind(&entry.ip_address)
        .bind(entry.analyzed)
        .bind(&entry.analysis_result)
        .bind(millis(entry.received_at))
        .bind(entry.metadata.as_ref().map(to_json))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<LogEntry>, StoreError> {
        let row = sqlx::query_as::<_, LogRow>("SELECT * FROM logs WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(LogRow::into_entry).transpose()
    }

    async fn by_service(&self, service_id: Uuid, page: Page) -> Result<Vec<LogEntry>, StoreError> {
        let (take, skip) = page_limits(page);
        let rows = sqlx::query_as::<_, LogRow>(
            "SELECT * FROM logs WHERE service_id = ?1
             ORDER BY timestamp DESC LIMIT ?2 OFFSET ?3",
        )
        .bind(service_id.to_string())
        .bind(take)
        .bind(skip)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        collect(rows)
    }

    async fn by_client(&self, client_id: Uuid, page: Page) -> Result<Vec<LogEntry>, StoreError> {
        let (take, skip) = page_limits(page);
        let rows = sqlx::query_as::<_, LogRow>(
            "SELECT * FROM logs WHERE client_id = ?1
             ORDER BY timestamp DESC LIMIT ?2 OFFSET ?3",
        )
        .bind(client_id.to_string())
        .bind(take)
        .bind(skip)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        collect(rows)
    }

    async fn by_level(&self, level: LogLevel, page: Page) -> Result<Vec<LogEntry>, StoreError> {
        let (take, skip) = page_limits(page);
        let rows = sqlx::query_as::<_, LogRow>(
            "SELECT * FROM logs WHERE level = ?1
             ORDER BY timestamp DESC LIMIT ?2 OFFSET ?3",
        )
        .bind(level.as_i64())
        .bind(take)
        .bind(skip)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        collect(rows)
    }

    async fn search(&self, query: &LogQuery) -> Result<Vec<LogEntry>, StoreError> {
        let (take, skip) = page_limits(query.page);
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT);
        builder.push(" WHERE timestamp >= ").push_bind(millis(query.start));
        builder.push(" AND timestamp <= ").push_bind(millis(query.end));
        if let Some(service_id) = query.service_id {
            builder.push(" AND service_id = ").push_bind(service_id.to_string());
        }
        if let Some(client_id) = query.client_id {
            builder.push(" AND client_id = ").push_bind(client_id.to_string());
        }
        if let Some(level) = query.min_level {
            builder.push(" AND level >= ").push_bind(level.as_i64());
        }
        builder.push(" ORDER BY timestamp DESC LIMIT ").push_bind(take);
        builder.push(" OFFSET ").push_bind(skip);

        let rows = builder
            .build_query_as::<LogRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        collect(rows)
    }

    async fn search_text(&self, text: &str, query: &LogQuery) -> Result<Vec<LogEntry>, StoreError> {
        let (take, skip) = page_limits(query.page);
        let pattern = format!("%{}%", text.to_lowercase());

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT);
        builder.push(" WHERE timestamp >= ").push_bind(millis(query.start));
        builder.push(" AND timestamp <= ").push_bind(millis(query.end));
        builder.push(" AND (lower(message) LIKE ").push_bind(pattern.clone());
        builder.push(" OR lower(category) LIKE ").push_bind(pattern.clone());
        builder
            .push(" OR lower(coalesce(exception_details, '')) LIKE ")
            .push_bind(pattern.clone());
        builder
            .push(" OR lower(coalesce(stack_trace, '')) LIKE ")
            .push_bind(pattern);
        builder.push(")");
        if let Some(service_id) = query.service_id {
            builder.push(" AND service_id = ").push_bind(service_id.to_string());
        }
        if let Some(client_id) = query.client_id {
            builder.push(" AND client_id = ").push_bind(client_id.to_string());
        }
        builder.push(" ORDER BY timestamp DESC LIMIT ").push_bind(take);
        builder.push(" OFFSET ").push_bind(skip);

        let rows = builder
            .build_query_as::<LogRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        collect(rows)
    }

    async fn set_analysis(&self, id: Uuid, summary: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE logs SET analyzed = 1, analysis_result = ?1 WHERE id = ?2")
            .bind(summary)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_by_service(&self, service_id: Uuid) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM logs WHERE service_id = ?1")
            .bind(service_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(count as u64)
    }

    async fn count_by_client(&self, client_id: Uuid) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM logs WHERE client_id = ?1")
            .bind(client_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(count as u64)
    }

    async fn count_by_level(&self, level: LogLevel) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM logs WHERE level >= ?1")
            .bind(level.as_i64())
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(count as u64)
    }
}
