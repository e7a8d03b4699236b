//! Persistence contracts consumed by the HTTP layer and the background
//! workers. One concrete implementation lives in the store crate; tests may
//! substitute their own.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::client::{Client, ContactPerson, NotificationSettings};
use crate::error::StoreError;
use crate::service::RegisteredService;
use crate::user::User;
use crate::{LogEntry, LogLevel};

/// Pagination window. `take` is clamped by implementations.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub skip: u32,
    pub take: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self { skip: 0, take: 100 }
    }
}

/// Filter set for log searches. `start`/`end` always bound the scan;
/// the remaining predicates are optional.
#[derive(Debug, Clone)]
pub struct LogQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub service_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub min_level: Option<LogLevel>,
    pub page: Page,
}

#[async_trait]
pub trait LogRepository: Send + Sync {
    async fn add(&self, entry: &LogEntry) -> Result<(), StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<LogEntry>, StoreError>;

    /// Newest-first listing for one service.
    async fn by_service(&self, service_id: Uuid, page: Page) -> Result<Vec<LogEntry>, StoreError>;

    /// Newest-first listing for one client.
    async fn by_client(&self, client_id: Uuid, page: Page) -> Result<Vec<LogEntry>, StoreError>;

    /// Newest-first listing of entries at exactly `level`.
    async fn by_level(&self, level: LogLevel, page: Page) -> Result<Vec<LogEntry>, StoreError>;

    /// Range + predicate search. `min_level` filters `level >= min_level`.
    async fn search(&self, query: &LogQuery) -> Result<Vec<LogEntry>, StoreError>;

    /// Case-insensitive substring search over message, category, exception
    /// details and stack trace, restricted to the query's date range and
    /// service/client predicates. The level predicate does not apply here.
    async fn search_text(&self, text: &str, query: &LogQuery) -> Result<Vec<LogEntry>, StoreError>;

    /// Record an analysis summary. Returns false when the entry is gone.
    async fn set_analysis(&self, id: Uuid, summary: &str) -> Result<bool, StoreError>;

    async fn count_by_service(&self, service_id: Uuid) -> Result<u64, StoreError>;

    async fn count_by_client(&self, client_id: Uuid) -> Result<u64, StoreError>;

    /// Count of entries at `level` or above.
    async fn count_by_level(&self, level: LogLevel) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait ServiceRepository: Send + Sync {
    async fn add(&self, service: &RegisteredService) -> Result<(), StoreError>;

    /// Persist all mutable fields. Returns false for an unknown id.
    async fn update(&self, service: &RegisteredService) -> Result<bool, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<RegisteredService>, StoreError>;

    async fn get_by_api_key(&self, api_key: &str)
        -> Result<Option<RegisteredService>, StoreError>;

    async fn by_client(&self, client_id: Uuid) -> Result<Vec<RegisteredService>, StoreError>;

    async fn all(&self, include_inactive: bool) -> Result<Vec<RegisteredService>, StoreError>;

    /// Flip the online flag and stamp the last report time. Last write wins
    /// under concurrent submissions.
    async fn set_online(
        &self,
        id: Uuid,
        online: bool,
        last_log_received_at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    async fn activate(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn deactivate(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Replace the API key, invalidating the old one immediately.
    /// Returns the new key, or None for an unknown id.
    async fn regenerate_api_key(&self, id: Uuid) -> Result<Option<String>, StoreError>;

    /// Term match over name, description and service type, optionally
    /// scoped to a client.
    async fn search(
        &self,
        term: &str,
        client_id: Option<Uuid>,
    ) -> Result<Vec<RegisteredService>, StoreError>;

    async fn exists(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Active services whose last report (or creation, if they never
    /// reported) is older than their reporting interval times the store's
    /// staleness factor.
    async fn stale(&self) -> Result<Vec<RegisteredService>, StoreError>;
}

#[async_trait]
pub trait ClientRepository: Send + Sync {
    async fn add(&self, client: &Client) -> Result<(), StoreError>;

    async fn update(&self, client: &Client) -> Result<bool, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Client>, StoreError>;

    async fn get_by_number(&self, client_number: &str) -> Result<Option<Client>, StoreError>;

    async fn all(&self, include_inactive: bool) -> Result<Vec<Client>, StoreError>;

    /// Term match over name, client number and email.
    async fn search(&self, term: &str) -> Result<Vec<Client>, StoreError>;

    async fn activate(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn deactivate(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn add_contact(&self, client_id: Uuid, contact: &ContactPerson)
        -> Result<bool, StoreError>;

    async fn update_contact(
        &self,
        client_id: Uuid,
        contact: &ContactPerson,
    ) -> Result<bool, StoreError>;

    async fn remove_contact(&self, client_id: Uuid, contact_id: Uuid)
        -> Result<bool, StoreError>;

    async fn set_notification_settings(
        &self,
        client_id: Uuid,
        settings: &NotificationSettings,
    ) -> Result<bool, StoreError>;

    async fn exists(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn is_number_taken(
        &self,
        client_number: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn add(&self, user: &User) -> Result<(), StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn get_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn update(&self, user: &User) -> Result<bool, StoreError>;

    async fn is_username_taken(&self, username: &str) -> Result<bool, StoreError>;

    async fn is_email_taken(&self, email: &str) -> Result<bool, StoreError>;
}
