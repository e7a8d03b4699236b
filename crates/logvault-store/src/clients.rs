//! Client (tenant) repository. Contacts and notification settings live in
//! JSON text columns and are rewritten whole on change.

use async_trait::async_trait;
use chrono::Utc;
use logvault_core::{
    Client, ClientRepository, ContactPerson, NotificationSettings, StoreError,
};
use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

use crate::convert::{db_err, from_json, from_millis, millis, opt_json, parse_uuid, to_json};

pub struct SqliteClientRepository {
    pool: SqlitePool,
}

impl SqliteClientRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn contacts_of(&self, client_id: Uuid) -> Result<Option<Vec<ContactPerson>>, StoreError> {
        let raw: Option<String> =
            sqlx::query_scalar("SELECT contacts FROM clients WHERE id = ?1")
                .bind(client_id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
        raw.map(|json| from_json(&json)).transpose()
    }

    async fn save_contacts(
        &self,
        client_id: Uuid,
        contacts: &[ContactPerson],
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE clients SET contacts = ?1, last_updated_at = ?2 WHERE id = ?3",
        )
        .bind(to_json(&contacts))
        .bind(millis(Utc::now()))
        .bind(client_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(sqlx::FromRow)]
struct ClientRow {
    id: String,
    name: String,
    client_number: String,
    description: String,
    email: String,
    phone: String,
    address: String,
    created_at: i64,
    last_updated_at: i64,
    is_active: bool,
    contacts: String,
    notification_settings: String,
    metadata: Option<String>,
}

impl ClientRow {
    fn into_client(self) -> Result<Client, StoreError> {
        Ok(Client {
            id: parse_uuid(&self.id)?,
            name: self.name,
            client_number: self.client_number,
            description: self.description,
            email: self.email,
            phone: self.phone,
            address: self.address,
            created_at: from_millis(self.created_at)?,
            last_updated_at: from_millis(self.last_updated_at)?,
            is_active: self.is_active,
            contacts: from_json(&self.contacts)?,
            notification_settings: from_json(&self.notification_settings)?,
            metadata: opt_json(self.metadata.as_deref())?,
        })
    }
}

fn collect(rows: Vec<ClientRow>) -> Result<Vec<Client>, StoreError> {
    rows.into_iter().map(ClientRow::into_client).collect()
}

#[async_trait]
impl ClientRepository for SqliteClientRepository {
    async fn add(&self, client: &Client) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO clients (
                id, name, client_number, description, email, phone, address,
                created_at, last_updated_at, is_active,
                contacts, notification_settings, metadata
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        )
        .bind(client.id.to_string())
        .bind(&client.name)
        .bind(&client.client_number)
        .bind(&client.description)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(&client.address)
        .bind(millis(client.created_at))
        .bind(millis(client.last_updated_at))
        .bind(client.is_active)
        .bind(to_json(&client.contacts))
        .bind(to_json(&client.notification_settings))
        .bind(client.metadata.as_ref().map(to_json))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn update(&self, client: &Client) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE clients SET
                name = ?1, client_number = ?2, description = ?3, email = ?4,
                phone = ?5, address = ?6, last_updated_at = ?7, metadata = ?8
             WHERE id = ?9",
        )
        .bind(&client.name)
        .bind(&client.client_number)
        .bind(&client.description)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(&client.address)
        .bind(millis(client.last_updated_at))
        .bind(client.metadata.as_ref().map(to_json))
        .bind(client.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Client>, StoreError> {
        let row = sqlx::query_as::<_, ClientRow>("SELECT * FROM clients WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(ClientRow::into_client).transpose()
    }

    async fn get_by_number(&self, client_number: &str) -> Result<Option<Client>, StoreError> {
        let row =
            sqlx::query_as::<_, ClientRow>("SELECT * FROM clients WHERE client_number = ?1")
                .bind(client_number)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
        row.map(ClientRow::into_client).transpose()
    }

    async fn all(&self, include_inactive: bool) -> Result<Vec<Client>, StoreError> {
        let sql = if include_inactive {
            "SELECT * FROM clients ORDER BY name"
        } else {
            "SELECT * FROM clients WHERE is_active = 1 ORDER BY name"
        };
        let rows = sqlx::query_as::<_, ClientRow>(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        collect(rows)
    }

    async fn search(&self, term: &str) -> Result<Vec<Client>, StoreError> {
        let pattern = format!("%{}%", term.to_lowercase());
        let rows = sqlx::query_as::<_, ClientRow>(
            "SELECT * FROM clients WHERE lower(name) LIKE ?1
                OR lower(client_number) LIKE ?1
                OR lower(email) LIKE ?1
             ORDER BY name",
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        collect(rows)
    }

    async fn activate(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE clients SET is_active = 1, last_updated_at = ?1 WHERE id = ?2")
            .bind(millis(Utc::now()))
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn deactivate(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE clients SET is_active = 0, last_updated_at = ?1 WHERE id = ?2")
            .bind(millis(Utc::now()))
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_contact(
        &self,
        client_id: Uuid,
        contact: &ContactPerson,
    ) -> Result<bool, StoreError> {
        let Some(mut contacts) = self.contacts_of(client_id).await? else {
            return Ok(false);
        };
        contacts.push(contact.clone());
        self.save_contacts(client_id, &contacts).await
    }

    async fn update_contact(
        &self,
        client_id: Uuid,
        contact: &ContactPerson,
    ) -> Result<bool, StoreError> {
        let Some(mut contacts) = self.contacts_of(client_id).await? else {
            return Ok(false);
        };
        let Some(slot) = contacts.iter_mut().find(|c| c.id == contact.id) else {
            return Ok(false);
        };
        *slot = contact.clone();
        self.save_contacts(client_id, &contacts).await
    }

    async fn remove_contact(
        &self,
        client_id: Uuid,
        contact_id: Uuid,
    ) -> Result<bool, StoreError> {
        let Some(mut contacts) = self.contacts_of(client_id).await? else {
            return Ok(false);
        };
        let before = contacts.len();
        contacts.retain(|c| c.id != contact_id);
        if contacts.len() == before {
            return Ok(false);
        }
        self.save_contacts(client_id, &contacts).await
    }

    async fn set_notification_settings(
        &self,
        client_id: Uuid,
        settings: &NotificationSettings,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE clients SET notification_settings = ?1, last_updated_at = ?2 WHERE id = ?3",
        )
        .bind(to_json(settings))
        .bind(millis(Utc::now()))
        .bind(client_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn exists(&self, id: Uuid) -> Result<bool, StoreError> {
        let found: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM clients WHERE id = ?1)")
            .bind(id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(found != 0)
    }

    async fn is_number_taken(
        &self,
        client_number: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, StoreError> {
        let found: i64 = match exclude {
            Some(id) => sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM clients WHERE client_number = ?1 AND id != ?2)",
            )
            .bind(client_number)
            .bind(id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?,
            None => sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM clients WHERE client_number = ?1)",
            )
            .bind(client_number)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?,
        };
        Ok(found != 0)
    }
}
