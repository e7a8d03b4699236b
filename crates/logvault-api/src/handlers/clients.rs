//! Client registry: CRUD, lifecycle, contacts and notification settings.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use logvault_auth::roles;
use logvault_core::{AccessLevel, Client, ContactPerson, NotificationSettings, StoreError};

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::{
    ClientDto, ContactRequest, CreateClientRequest, ListQuery, MessageResponse,
    NotificationSettingsRequest, UpdateClientRequest,
};
use crate::state::AppState;

async fn require_client_access(
    state: &AppState,
    user: &AuthUser,
    client_id: Uuid,
    level: AccessLevel,
) -> Result<(), ApiError> {
    let allowed = state
        .auth
        .has_client_access(user.user_id, client_id, level)
        .await?;
    if allowed {
        Ok(())
    } else {
        Err(ApiError::forbidden("no access to this client"))
    }
}

/// `GET /api/clients` - Admin/Support listing.
pub async fn list_clients(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ClientDto>>, ApiError> {
    user.require_any_role(&[roles::ADMIN, roles::SUPPORT])?;
    let clients = state.clients.all(query.include_inactive).await?;
    Ok(Json(clients.into_iter().map(Into::into).collect()))
}

/// `GET /api/clients/{id}`.
pub async fn get_client(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ClientDto>, ApiError> {
    let Some(client) = state.clients.get(id).await? else {
        return Err(ApiError::not_found("client not found"));
    };
    require_client_access(&state, &user, id, AccessLevel::Read).await?;
    Ok(Json(client.into()))
}

/// `POST /api/clients` - Admin only; client numbers are unique.
pub async fn create_client(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreateClientRequest>,
) -> Result<(StatusCode, Json<ClientDto>), ApiError> {
    user.require_any_role(&[roles::ADMIN])?;
    if req.name.trim().is_empty() || req.client_number.trim().is_empty() {
        return Err(ApiError::bad_request("name and clientNumber are required"));
    }
    if state.clients.is_number_taken(&req.client_number, None).await? {
        return Err(ApiError::bad_request("client number already in use"));
    }

    let now = Utc::now();
    let client = Client {
        id: Uuid::new_v4(),
        name: req.name,
        client_number: req.client_number,
        description: req.description,
        email: req.email,
        phone: req.phone,
        address: req.address,
        created_at: now,
        last_updated_at: now,
        is_active: true,
        contacts: Vec::new(),
        notification_settings: NotificationSettings::default(),
        metadata: req.metadata,
    };
    match state.clients.add(&client).await {
        Ok(()) => {}
        Err(StoreError::Conflict(_)) => {
            return Err(ApiError::bad_request("client number already in use"));
        }
        Err(e) => return Err(e.into()),
    }

    info!(id = %client.id, name = %client.name, "client created");
    Ok((StatusCode::CREATED, Json(client.into())))
}

/// `PUT /api/clients/{id}` - partial update; absent fields are untouched.
pub async fn update_client(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateClientRequest>,
) -> Result<Json<ClientDto>, ApiError> {
    user.require_any_role(&[roles::ADMIN])?;
    let Some(mut client) = state.clients.get(id).await? else {
        return Err(ApiError::not_found("client not found"));
    };
    require_client_access(&state, &user, id, AccessLevel::Write).await?;

    if let Some(number) = &req.client_number {
        if state.clients.is_number_taken(number, Some(id)).await? {
            return Err(ApiError::bad_request("client number already in use"));
        }
    }

    if let Some(name) = req.name {
        client.name = name;
    }
    if let Some(number) = req.client_number {
        client.client_number = number;
    }
    if let Some(description) = req.description {
        client.description = description;
    }
    if let Some(email) = req.email {
        client.email = email;
    }
    if let Some(phone) = req.phone {
        client.phone = phone;
    }
    if let Some(address) = req.address {
        client.address = address;
    }
    if let Some(metadata) = req.metadata {
        client.metadata = Some(metadata);
    }
    client.last_updated_at = Utc::now();

    if !state.clients.update(&client).await? {
        return Err(ApiError::internal("client update failed"));
    }
    Ok(Json(client.into()))
}

/// `PATCH /api/clients/{id}/activate`.
pub async fn activate_client(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    user.require_any_role(&[roles::ADMIN])?;
    if !state.clients.activate(id).await? {
        return Err(ApiError::not_found("client not found"));
    }
    Ok(Json(MessageResponse {
        message: "client activated".to_string(),
    }))
}

/// `PATCH /api/clients/{id}/deactivate`.
pub async fn deactivate_client(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    user.require_any_role(&[roles::ADMIN])?;
    if !state.clients.deactivate(id).await? {
        return Err(ApiError::not_found("client not found"));
    }
    Ok(Json(MessageResponse {
        message: "client deactivated".to_string(),
    }))
}

/// `POST /api/clients/{id}/contacts`.
pub async fn add_contact(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ContactRequest>,
) -> Result<(StatusCode, Json<ContactPerson>), ApiError> {
    user.require_any_role(&[roles::ADMIN])?;
    require_client_access(&state, &user, id, AccessLevel::Write).await?;

    let contact = ContactPerson {
        id: Uuid::new_v4(),
        name: req.name,
        role: req.role,
        email: req.email,
        phone: req.phone,
        receive_alerts: req.receive_alerts,
    };
    if !state.clients.add_contact(id, &contact).await? {
        return Err(ApiError::not_found("client not found"));
    }
    Ok((StatusCode::CREATED, Json(contact)))
}

/// `DELETE /api/clients/{id}/contacts/{contact_id}`.
pub async fn remove_contact(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path((id, contact_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<MessageResponse>, ApiError> {
    user.require_any_role(&[roles::ADMIN])?;
    require_client_access(&state, &user, id, AccessLevel::Write).await?;

    if !state.clients.remove_contact(id, contact_id).await? {
        return Err(ApiError::not_found("contact not found"));
    }
    Ok(Json(MessageResponse {
        message: "contact removed".to_string(),
    }))
}

/// `PUT /api/clients/{id}/notification-settings`.
pub async fn set_notification_settings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<NotificationSettingsRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    user.require_any_role(&[roles::ADMIN])?;
    require_client_access(&state, &user, id, AccessLevel::Write).await?;

    if !state
        .clients
        .set_notification_settings(id, &req.into())
        .await?
    {
        return Err(ApiError::not_found("client not found"));
    }
    Ok(Json(MessageResponse {
        message: "notification settings updated".to_string(),
    }))
}
