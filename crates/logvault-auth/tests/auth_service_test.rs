use chrono::Utc;
use logvault_auth::{password, roles, AuthConfig, AuthError, AuthService, JwtConfig};
use logvault_core::{
    AccessLevel, Client, ClientAccess, LogLevel, NotificationSettings, RegisteredService,
    ServiceRepository, User, UserRepository,
};
use logvault_store::{db, SqliteServiceRepository, SqliteUserRepository};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

struct Harness {
    auth: AuthService,
    users: Arc<SqliteUserRepository>,
    services: Arc<SqliteServiceRepository>,
}

async fn harness() -> Harness {
    let pool = db::connect_memory().await.unwrap();
    db::init_schema(&pool).await.unwrap();
    let users = Arc::new(SqliteUserRepository::new(pool.clone()));
    let services = Arc::new(SqliteServiceRepository::new(pool));
    let config = AuthConfig {
        jwt: JwtConfig {
            secret: "test-secret".to_string(),
            ..Default::default()
        },
        max_failed_logins: 3,
        lockout_minutes: 15,
    };
    let auth = AuthService::new(users.clone(), services.clone(), config);
    Harness {
        auth,
        users,
        services,
    }
}

fn make_user(username: &str, password_text: &str, roles: Vec<String>) -> User {
    let salt = password::new_salt();
    User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email: format!("{username}@example.test"),
        password_hash: password::hash_password(password_text, &salt),
        password_salt: salt,
        display_name: username.to_string(),
        phone: None,
        email_confirmed: true,
        phone_confirmed: false,
        email_token: None,
        phone_token: None,
        two_factor_secret: None,
        failed_login_count: 0,
        locked_until: None,
        roles,
        client_access: Vec::new(),
        preferences: HashMap::new(),
        created_at: Utc::now(),
        last_login_at: None,
    }
}

fn make_service(client: &Client) -> RegisteredService {
    RegisteredService {
        id: Uuid::new_v4(),
        name: "inventory".to_string(),
        description: String::new(),
        version: "0.9.0".to_string(),
        service_type: "worker".to_string(),
        api_key: RegisteredService::issue_api_key(),
        created_at: Utc::now(),
        last_updated_at: Utc::now(),
        last_log_received_at: None,
        client_id: client.id,
        client_name: client.name.clone(),
        environment: "staging".to_string(),
        reporting_interval_minutes: 60,
        is_active: true,
        is_online: false,
        alerts_enabled: true,
        alert_threshold: LogLevel::Error,
        alert_recipients: Vec::new(),
        webhook_url: None,
        metadata: None,
        source_path: None,
    }
}

fn make_client() -> Client {
    Client {
        id: Uuid::new_v4(),
        name: "Globex".to_string(),
        client_number: "C-1001".to_string(),
        description: String::new(),
        email: String::new(),
        phone: String::new(),
        address: String::new(),
        created_at: Utc::now(),
        last_updated_at: Utc::now(),
        is_active: true,
        contacts: Vec::new(),
        notification_settings: NotificationSettings::default(),
        metadata: None,
    }
}

#[tokio::test]
async fn login_issues_a_valid_token() {
    let h = harness().await;
    let user = make_user("alex", "s3cret", vec![roles::SUPPORT.to_string()]);
    h.users.add(&user).await.unwrap();

    let outcome = h.auth.authenticate("alex", "s3cret").await.unwrap();
    assert_eq!(outcome.user_id, user.id);
    assert_eq!(outcome.roles, vec![roles::SUPPORT.to_string()]);

    let claims = h.auth.validate_token(&outcome.token).unwrap();
    assert_eq!(claims.sub, user.id.to_string());
}

#[tokio::test]
async fn repeated_failures_lock_the_account() {
    let h = harness().await;
    let user = make_user("casey", "right", Vec::new());
    h.users.add(&user).await.unwrap();

    for _ in 0..3 {
        let err = h.auth.authenticate("casey", "wrong").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    // Even the correct password fails while locked.
    let err = h.auth.authenticate("casey", "right").await.unwrap_err();
    assert!(matches!(err, AuthError::Locked));
}

#[tokio::test]
async fn api_key_resolves_only_active_services() {
    let h = harness().await;
    let client = make_client();
    let service = make_service(&client);
    h.services.add(&service).await.unwrap();

    let identity = h
        .auth
        .authenticate_service(&service.api_key)
        .await
        .unwrap();
    assert_eq!(identity.service_id, service.id);
    assert_eq!(identity.client_id, client.id);

    assert!(matches!(
        h.auth.authenticate_service("bogus-key").await.unwrap_err(),
        AuthError::InvalidApiKey
    ));
    assert!(matches!(
        h.auth.authenticate_service("").await.unwrap_err(),
        AuthError::InvalidApiKey
    ));

    h.services.deactivate(service.id).await.unwrap();
    assert!(matches!(
        h.auth
            .authenticate_service(&service.api_key)
            .await
            .unwrap_err(),
        AuthError::InvalidApiKey
    ));
}

#[tokio::test]
async fn access_checks_follow_grants_and_admin_bypass() {
    let h = harness().await;
    let client = make_client();
    let service = make_service(&client);
    h.services.add(&service).await.unwrap();

    let mut reader = make_user("reader", "pw", Vec::new());
    reader.client_access = vec![ClientAccess {
        client_id: client.id,
        level: AccessLevel::Read,
    }];
    h.users.add(&reader).await.unwrap();

    let admin = make_user("root", "pw", vec![roles::ADMIN.to_string()]);
    h.users.add(&admin).await.unwrap();

    let outsider = make_user("outsider", "pw", Vec::new());
    h.users.add(&outsider).await.unwrap();

    assert!(h
        .auth
        .has_service_access(reader.id, service.id, AccessLevel::Read)
        .await
        .unwrap());
    assert!(!h
        .auth
        .has_service_access(reader.id, service.id, AccessLevel::Write)
        .await
        .unwrap());
    assert!(h
        .auth
        .has_service_access(admin.id, service.id, AccessLevel::Admin)
        .await
        .unwrap());
    assert!(!h
        .auth
        .has_service_access(outsider.id, service.id, AccessLevel::Read)
        .await
        .unwrap());
    assert!(h.auth.is_in_role(admin.id, roles::ADMIN).await.unwrap());
    assert!(!h.auth.is_in_role(reader.id, roles::ADMIN).await.unwrap());
}

#[tokio::test]
async fn change_password_requires_the_current_one() {
    let h = harness().await;
    let user = make_user("morgan", "old-pw", Vec::new());
    h.users.add(&user).await.unwrap();

    assert!(matches!(
        h.auth
            .change_password(user.id, "not-it", "new-pw")
            .await
            .unwrap_err(),
        AuthError::InvalidCredentials
    ));

    h.auth.change_password(user.id, "old-pw", "new-pw").await.unwrap();
    assert!(h.auth.authenticate("morgan", "old-pw").await.is_err());
    assert!(h.auth.authenticate("morgan", "new-pw").await.is_ok());
}
