//! Log ingestion, retrieval, search and on-demand analysis.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use logvault_auth::{roles, AuthError};
use logvault_core::{AccessLevel, AnalysisResult, LogDraft, LogEntry, LogLevel, LogQuery, Page};

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::{CreateLogResponse, SearchLogsRequest, SearchLogsResponse};
use crate::state::AppState;

/// Caller address, preferring proxy headers.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        })
}

/// `POST /api/logs` - authenticated by the `X-API-Key` header.
pub async fn create_log(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<LogDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateLogResponse>), ApiError> {
    // Absent or malformed bodies are validation failures, not 415/422.
    let Json(draft) =
        body.map_err(|e| ApiError::bad_request(format!("invalid request body: {e}")))?;
    if draft.message.trim().is_empty() {
        return Err(ApiError::bad_request("message is required"));
    }

    let api_key = headers
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let identity = match state.auth.authenticate_service(api_key).await {
        Ok(identity) => identity,
        Err(AuthError::Store(e)) => return Err(e.into()),
        Err(_) => return Err(ApiError::unauthorized("invalid or unauthorized API key")),
    };

    let Some(service) = state.services.get(identity.service_id).await? else {
        return Err(ApiError::unauthorized("service not found"));
    };

    // Best-effort: losing the online-status write must not fail ingestion.
    if let Err(e) = state.services.set_online(service.id, true, Utc::now()).await {
        warn!(service = %service.id, "failed to update online status: {e}");
    }

    let entry = LogEntry::from_draft(draft, &service, client_ip(&headers));
    state.logs.add(&entry).await?;

    if entry.level >= LogLevel::Error {
        state.analysis_queue.submit(entry.clone());
    }

    info!(
        id = %entry.id,
        level = ?entry.level,
        service = %entry.service_name,
        "log accepted"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateLogResponse {
            id: entry.id,
            received_at: entry.received_at,
            success: true,
        }),
    ))
}

/// `GET /api/logs/{id}` - requires read access to the owning service.
pub async fn get_log(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<crate::models::LogEntryDto>, ApiError> {
    let Some(entry) = state.logs.get(id).await? else {
        return Err(ApiError::not_found("log not found"));
    };

    let allowed = state
        .auth
        .has_service_access(user.user_id, entry.service_id, AccessLevel::Read)
        .await?;
    if !allowed {
        return Err(ApiError::forbidden("no access to this service's logs"));
    }

    Ok(Json(entry.into()))
}

/// `POST /api/logs/search`.
pub async fn search_logs(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    body: Result<Json<SearchLogsRequest>, JsonRejection>,
) -> Result<Json<SearchLogsResponse>, ApiError> {
    let Json(req) =
        body.map_err(|e| ApiError::bad_request(format!("invalid request body: {e}")))?;
    let start = req
        .start_date
        .unwrap_or_else(|| Utc::now() - Duration::days(7));
    let end = req.end_date.unwrap_or_else(Utc::now);
    if start > end {
        return Err(ApiError::bad_request("startDate must not be after endDate"));
    }

    let query = LogQuery {
        start,
        end,
        service_id: req.service_id,
        client_id: req.client_id,
        min_level: req.min_level,
        page: Page {
            skip: req.skip,
            take: req.take,
        },
    };

    let text = req
        .search_text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    // Totals are only computed for scoped searches; a text search without a
    // service or client filter reports zero even when the page is non-empty.
    let (logs, total_count) = match text {
        Some(text) => {
            let logs = state.logs.search_text(text, &query).await?;
            let total = if logs.is_empty() {
                0
            } else if let Some(service_id) = req.service_id {
                state.logs.count_by_service(service_id).await?
            } else if let Some(client_id) = req.client_id {
                state.logs.count_by_client(client_id).await?
            } else {
                0
            };
            (logs, total)
        }
        None => {
            let logs = state.logs.search(&query).await?;
            let total = if let Some(level) = req.min_level {
                state.logs.count_by_level(level).await?
            } else if let Some(service_id) = req.service_id {
                state.logs.count_by_service(service_id).await?
            } else if let Some(client_id) = req.client_id {
                state.logs.count_by_client(client_id).await?
            } else {
                0
            };
            (logs, total)
        }
    };

    Ok(Json(SearchLogsResponse {
        logs: logs.into_iter().map(Into::into).collect(),
        total_count,
        success: true,
    }))
}

/// `POST /api/logs/{id}/analyze` - synchronous re-analysis, Admin/Support.
pub async fn analyze_log(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<AnalysisResult>, ApiError> {
    user.require_any_role(&[roles::ADMIN, roles::SUPPORT])?;

    let Some(entry) = state.logs.get(id).await? else {
        return Err(ApiError::not_found("log not found"));
    };

    let result = state.engine.analyze_log(&entry).await;
    state.logs.set_analysis(id, &result.summary).await?;

    info!(id = %id, "on-demand analysis stored");
    Ok(Json(result))
}
