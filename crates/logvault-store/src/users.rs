//! Operator account repository.

use async_trait::async_trait;
use logvault_core::{StoreError, User, UserRepository};
use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

use crate::convert::{db_err, from_json, from_millis, millis, opt_json, parse_uuid, to_json};

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    username: String,
    email: String,
    password_hash: String,
    password_salt: String,
    display_name: String,
    phone: Option<String>,
    email_confirmed: bool,
    phone_confirmed: bool,
    email_token: Option<String>,
    phone_token: Option<String>,
    two_factor_secret: Option<String>,
    failed_login_count: i64,
    locked_until: Option<i64>,
    roles: String,
    client_access: String,
    preferences: String,
    created_at: i64,
    last_login_at: Option<i64>,
}

impl UserRow {
    fn into_user(self) -> Result<User, StoreError> {
        Ok(User {
            id: parse_uuid(&self.id)?,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            password_salt: self.password_salt,
            display_name: self.display_name,
            phone: self.phone,
            email_confirmed: self.email_confirmed,
            phone_confirmed: self.phone_confirmed,
            email_token: opt_json(self.email_token.as_deref())?,
            phone_token: opt_json(self.phone_token.as_deref())?,
            two_factor_secret: self.two_factor_secret,
            failed_login_count: self.failed_login_count,
            locked_until: self.locked_until.map(from_millis).transpose()?,
            roles: from_json(&self.roles)?,
            client_access: from_json(&self.client_access)?,
            preferences: from_json(&self.preferences)?,
            created_at: from_millis(self.created_at)?,
            last_login_at: self.last_login_at.map(from_millis).transpose()?,
        })
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn add(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO users (
                id, username, email, password_hash, password_salt,
                display_name, phone, email_confirmed, phone_confirmed,
                email_token, phone_token, two_factor_secret,
                failed_login_count, locked_until,
                roles, client_access, preferences, created_at, last_login_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19
            )",
        )
        .bind(user.id.to_string())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.password_salt)
        .bind(&user.display_name)
        .bind(&user.phone)
        .bind(user.email_confirmed)
        .bind(user.phone_confirmed)
        .bind(user.email_token.as_ref().map(to_json))
        .bind(user.phone_token.as_ref().map(to_json))
        .bind(&user.two_factor_secret)
        .bind(user.failed_login_count)
        .bind(user.locked_until.map(millis))
        .bind(to_json(&user.roles))
        .bind(to_json(&user.client_access))
        .bind(to_json(&user.preferences))
        .bind(millis(user.created_at))
        .bind(user.last_login_at.map(millis))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(UserRow::into_user).transpose()
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE username = ?1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(UserRow::into_user).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = ?1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(UserRow::into_user).transpose()
    }

    async fn update(&self, user: &User) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE users SET
                username = ?1, email = ?2, password_hash = ?3, password_salt = ?4,
                display_name = ?5, phone = ?6, email_confirmed = ?7,
                phone_confirmed = ?8, email_token = ?9, phone_token = ?10,
                two_factor_secret = ?11, failed_login_count = ?12,
                locked_until = ?13, roles = ?14, client_access = ?15,
                preferences = ?16, last_login_at = ?17
             WHERE id = ?18",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.password_salt)
        .bind(&user.display_name)
        .bind(&user.phone)
        .bind(user.email_confirmed)
        .bind(user.phone_confirmed)
        .bind(user.email_token.as_ref().map(to_json))
        .bind(user.phone_token.as_ref().map(to_json))
        .bind(&user.two_factor_secret)
        .bind(user.failed_login_count)
        .bind(user.locked_until.map(millis))
        .bind(to_json(&user.roles))
        .bind(to_json(&user.client_access))
        .bind(to_json(&user.preferences))
        .bind(user.last_login_at.map(millis))
        .bind(user.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn is_username_taken(&self, username: &str) -> Result<bool, StoreError> {
        let found: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(found != 0)
    }

    async fn is_email_taken(&self, email: &str) -> Result<bool, StoreError> {
        let found: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(found != 0)
    }
}
