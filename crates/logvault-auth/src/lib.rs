//! Authentication and authorization: operator credentials and JWTs,
//! service API keys, and the role / per-client / per-service access checks
//! consumed by the HTTP layer.

pub mod error;
pub mod jwt;
pub mod password;

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use logvault_core::{AccessLevel, ServiceRepository, UserRepository};

pub use error::AuthError;
pub use jwt::{Claims, JwtConfig};

/// Well-known role names.
pub mod roles {
    pub const ADMIN: &str = "Admin";
    pub const SUPPORT: &str = "Support";
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt: JwtConfig,
    pub max_failed_logins: i64,
    pub lockout_minutes: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt: JwtConfig::default(),
            max_failed_logins: 5,
            lockout_minutes: 15,
        }
    }
}

/// Successful user authentication.
#[derive(Debug, Clone)]
pub struct AuthOutcome {
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub roles: Vec<String>,
}

/// Identity of a service resolved from its API key.
#[derive(Debug, Clone)]
pub struct ServiceIdentity {
    pub service_id: Uuid,
    pub name: String,
    pub client_id: Uuid,
    pub environment: String,
}

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    services: Arc<dyn ServiceRepository>,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        services: Arc<dyn ServiceRepository>,
        config: AuthConfig,
    ) -> Self {
        Self {
            users,
            services,
            config,
        }
    }

    /// Verify a username/password pair and issue a bearer token.
    /// Failed attempts count toward a temporary lockout.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthOutcome, AuthError> {
        let Some(mut user) = self.users.get_by_username(username).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        if let Some(until) = user.locked_until {
            if until > Utc::now() {
                warn!(username, "login rejected: account locked");
                return Err(AuthError::Locked);
            }
        }

        if !password::verify_password(password, &user.password_salt, &user.password_hash) {
            user.failed_login_count += 1;
            if user.failed_login_count >= self.config.max_failed_logins {
                user.locked_until =
                    Some(Utc::now() + Duration::minutes(self.config.lockout_minutes));
                user.failed_login_count = 0;
                warn!(username, "account locked after repeated failures");
            }
            self.users.update(&user).await?;
            return Err(AuthError::InvalidCredentials);
        }

        user.failed_login_count = 0;
        user.locked_until = None;
        user.last_login_at = Some(Utc::now());
        self.users.update(&user).await?;

        let (token, expires_at) = jwt::issue(&self.config.jwt, user.id, &user.roles)?;
        info!(username, user_id = %user.id, "user authenticated");
        Ok(AuthOutcome {
            user_id: user.id,
            token,
            expires_at,
            roles: user.roles,
        })
    }

    /// Validate a bearer token and return its claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        jwt::validate(&self.config.jwt, token)
    }

    /// Resolve an API key to a service identity. Unknown keys and inactive
    /// services are both rejected.
    pub async fn authenticate_service(
        &self,
        api_key: &str,
    ) -> Result<ServiceIdentity, AuthError> {
        if api_key.is_empty() {
            return Err(AuthError::InvalidApiKey);
        }
        let Some(service) = self.services.get_by_api_key(api_key).await? else {
            return Err(AuthError::InvalidApiKey);
        };
        if !service.is_active {
            warn!(service = %service.id, "API key for deactivated service rejected");
            return Err(AuthError::InvalidApiKey);
        }
        Ok(ServiceIdentity {
            service_id: service.id,
            name: service.name,
            client_id: service.client_id,
            environment: service.environment,
        })
    }

    pub async fn is_in_role(&self, user_id: Uuid, role: &str) -> Result<bool, AuthError> {
        let Some(user) = self.users.get(user_id).await? else {
            return Ok(false);
        };
        Ok(user.roles.iter().any(|r| r == role))
    }

    /// Admins pass every check; everyone else needs a grant on the client
    /// at `level` or above.
    pub async fn has_client_access(
        &self,
        user_id: Uuid,
        client_id: Uuid,
        level: AccessLevel,
    ) -> Result<bool, AuthError> {
        let Some(user) = self.users.get(user_id).await? else {
            return Ok(false);
        };
        if user.roles.iter().any(|r| r == roles::ADMIN) {
            return Ok(true);
        }
        Ok(user
            .client_access
            .iter()
            .any(|grant| grant.client_id == client_id && grant.level >= level))
    }

    /// Service access delegates to the owning client's grant.
    pub async fn has_service_access(
        &self,
        user_id: Uuid,
        service_id: Uuid,
        level: AccessLevel,
    ) -> Result<bool, AuthError> {
        let Some(service) = self.services.get(service_id).await? else {
            return Ok(false);
        };
        self.has_client_access(user_id, service.client_id, level).await
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        current: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let Some(mut user) = self.users.get(user_id).await? else {
            return Err(AuthError::UnknownUser);
        };
        if !password::verify_password(current, &user.password_salt, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }
        user.password_salt = password::new_salt();
        user.password_hash = password::hash_password(new_password, &user.password_salt);
        self.users.update(&user).await?;
        info!(user_id = %user.id, "password changed");
        Ok(())
    }
}
