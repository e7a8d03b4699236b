//! Service registry: CRUD, lifecycle toggles, key rotation, search,
//! offline detection and reports.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use logvault_auth::roles;
use logvault_core::{AccessLevel, AnalysisReport, LogQuery, Page, RegisteredService};

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::{
    CreateServiceRequest, ListQuery, MessageResponse, RegenerateApiKeyResponse, ReportRequest,
    SearchServicesRequest, ServiceDto, UpdateServiceRequest,
};
use crate::state::AppState;

async fn require_service_access(
    state: &AppState,
    user: &AuthUser,
    service_id: Uuid,
    level: AccessLevel,
) -> Result<(), ApiError> {
    let allowed = state
        .auth
        .has_service_access(user.user_id, service_id, level)
        .await?;
    if allowed {
        Ok(())
    } else {
        Err(ApiError::forbidden("no access to this service"))
    }
}

/// `GET /api/services` - Admin/Support listing.
pub async fn list_services(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ServiceDto>>, ApiError> {
    user.require_any_role(&[roles::ADMIN, roles::SUPPORT])?;
    let services = state.services.all(query.include_inactive).await?;
    Ok(Json(services.into_iter().map(Into::into).collect()))
}

/// `GET /api/services/{id}`.
pub async fn get_service(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ServiceDto>, ApiError> {
    let Some(service) = state.services.get(id).await? else {
        return Err(ApiError::not_found("service not found"));
    };
    require_service_access(&state, &user, id, AccessLevel::Read).await?;
    Ok(Json(service.into()))
}

/// `POST /api/services` - Admin only; the client must exist.
pub async fn create_service(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreateServiceRequest>,
) -> Result<(StatusCode, Json<ServiceDto>), ApiError> {
    user.require_any_role(&[roles::ADMIN])?;
    if req.name.trim().is_empty() {
        return Err(ApiError::bad_request("name is required"));
    }

    let Some(client) = state.clients.get(req.client_id).await? else {
        return Err(ApiError::bad_request("the specified client does not exist"));
    };

    let allowed = state
        .auth
        .has_client_access(user.user_id, req.client_id, AccessLevel::Write)
        .await?;
    if !allowed {
        return Err(ApiError::forbidden("no access to this client"));
    }

    let now = Utc::now();
    let service = RegisteredService {
        id: Uuid::new_v4(),
        name: req.name,
        description: req.description,
        version: req.version,
        service_type: req.service_type,
        api_key: RegisteredService::issue_api_key(),
        created_at: now,
        last_updated_at: now,
        last_log_received_at: None,
        client_id: client.id,
        client_name: client.name,
        environment: req.environment,
        reporting_interval_minutes: req.reporting_interval_minutes,
        is_active: true,
        is_online: false,
        alerts_enabled: req.alerts_enabled,
        alert_threshold: req.alert_threshold,
        alert_recipients: req.alert_email_recipients,
        webhook_url: req.webhook_url,
        metadata: req.metadata,
        source_path: req.source_code_path,
    };
    state.services.add(&service).await?;

    info!(id = %service.id, name = %service.name, "service registered");
    Ok((StatusCode::CREATED, Json(service.into())))
}

/// `PUT /api/services/{id}` - partial update; absent fields are untouched.
pub async fn update_service(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateServiceRequest>,
) -> Result<Json<ServiceDto>, ApiError> {
    user.require_any_role(&[roles::ADMIN])?;
    let Some(mut service) = state.services.get(id).await? else {
        return Err(ApiError::not_found("service not found"));
    };
    require_service_access(&state, &user, id, AccessLevel::Write).await?;

    if let Some(name) = req.name {
        service.name = name;
    }
    if let Some(description) = req.description {
        service.description = description;
    }
    if let Some(version) = req.version {
        service.version = version;
    }
    if let Some(service_type) = req.service_type {
        service.service_type = service_type;
    }
    if let Some(environment) = req.environment {
        service.environment = environment;
    }
    if let Some(interval) = req.reporting_interval_minutes {
        service.reporting_interval_minutes = interval;
    }
    if let Some(alerts_enabled) = req.alerts_enabled {
        service.alerts_enabled = alerts_enabled;
    }
    if let Some(threshold) = req.alert_threshold {
        service.alert_threshold = threshold;
    }
    if let Some(recipients) = req.alert_email_recipients {
        service.alert_recipients = recipients;
    }
    if let Some(webhook_url) = req.webhook_url {
        service.webhook_url = Some(webhook_url);
    }
    if let Some(metadata) = req.metadata {
        service.metadata = Some(metadata);
    }
    if let Some(source_path) = req.source_code_path {
        service.source_path = Some(source_path);
    }
    service.last_updated_at = Utc::now();

    if !state.services.update(&service).await? {
        return Err(ApiError::internal("service update failed"));
    }
    Ok(Json(service.into()))
}

/// `PATCH /api/services/{id}/activate`.
pub async fn activate_service(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    user.require_any_role(&[roles::ADMIN])?;
    if state.services.get(id).await?.is_none() {
        return Err(ApiError::not_found("service not found"));
    }
    require_service_access(&state, &user, id, AccessLevel::Write).await?;

    if !state.services.activate(id).await? {
        return Err(ApiError::internal("service activation failed"));
    }
    Ok(Json(MessageResponse {
        message: "service activated".to_string(),
    }))
}

/// `PATCH /api/services/{id}/deactivate`.
pub async fn deactivate_service(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    user.require_any_role(&[roles::ADMIN])?;
    if state.services.get(id).await?.is_none() {
        return Err(ApiError::not_found("service not found"));
    }
    require_service_access(&state, &user, id, AccessLevel::Write).await?;

    if !state.services.deactivate(id).await? {
        return Err(ApiError::internal("service deactivation failed"));
    }
    Ok(Json(MessageResponse {
        message: "service deactivated".to_string(),
    }))
}

/// `POST /api/services/{id}/regenerate-api-key` - needs an Admin-level
/// grant on the owning client.
pub async fn regenerate_api_key(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<RegenerateApiKeyResponse>, ApiError> {
    user.require_any_role(&[roles::ADMIN])?;
    if state.services.get(id).await?.is_none() {
        return Err(ApiError::not_found("service not found"));
    }
    require_service_access(&state, &user, id, AccessLevel::Admin).await?;

    let Some(api_key) = state.services.regenerate_api_key(id).await? else {
        return Err(ApiError::internal("API key regeneration failed"));
    };

    info!(service = %id, "API key regenerated");
    Ok(Json(RegenerateApiKeyResponse {
        api_key,
        service_id: id,
        success: true,
    }))
}

/// `POST /api/services/search` - precedence: term, then client, then all.
pub async fn search_services(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<SearchServicesRequest>,
) -> Result<Json<Vec<ServiceDto>>, ApiError> {
    user.require_any_role(&[roles::ADMIN, roles::SUPPORT])?;

    let term = req
        .search_term
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let services = if let Some(term) = term {
        state.services.search(term, req.client_id).await?
    } else if let Some(client_id) = req.client_id {
        state.services.by_client(client_id).await?
    } else {
        state.services.all(req.include_inactive).await?
    };

    Ok(Json(services.into_iter().map(Into::into).collect()))
}

/// `GET /api/services/offline` - services past their reporting interval.
pub async fn offline_services(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Vec<ServiceDto>>, ApiError> {
    user.require_any_role(&[roles::ADMIN, roles::SUPPORT])?;
    let services = state.services.stale().await?;
    Ok(Json(services.into_iter().map(Into::into).collect()))
}

/// `POST /api/services/{id}/report` - aggregate analysis over a range.
pub async fn service_report(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ReportRequest>,
) -> Result<Json<AnalysisReport>, ApiError> {
    user.require_any_role(&[roles::ADMIN, roles::SUPPORT])?;
    if !state.services.exists(id).await? {
        return Err(ApiError::not_found("service not found"));
    }

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
        service_id: Some(id),
        client_id: None,
        min_level: None,
        page: Page {
            skip: 0,
            take: 1000,
        },
    };
    let logs = state.logs.search(&query).await?;
    let report = state.engine.generate_report(id, &logs, start, end);
    Ok(Json(report))
}
