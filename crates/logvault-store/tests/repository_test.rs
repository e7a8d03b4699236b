use chrono::{Duration, Utc};
use logvault_core::{
    Client, ClientRepository, ContactPerson, LogEntry, LogLevel, LogQuery, LogRepository,
    NotificationSettings, Page, RegisteredService, ServiceRepository, StoreError, User,
    UserRepository,
};
use logvault_store::{
    db, SqliteClientRepository, SqliteLogRepository, SqliteServiceRepository, SqliteUserRepository,
};
use std::collections::HashMap;
use uuid::Uuid;

async fn memory_pool() -> sqlx::SqlitePool {
    let pool = db::connect_memory().await.expect("open memory db");
    db::init_schema(&pool).await.expect("init schema");
    pool
}

fn sample_client() -> Client {
    Client {
        id: Uuid::new_v4(),
        name: "Acme Corp".to_string(),
        client_number: format!("C-{}", Uuid::new_v4().simple()),
        description: String::new(),
        email: "ops@acme.example".to_string(),
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

fn sample_service(client: &Client) -> RegisteredService {
    RegisteredService {
        id: Uuid::new_v4(),
        name: "payment-api".to_string(),
        description: "handles card payments".to_string(),
        version: "1.4.2".to_string(),
        service_type: "web".to_string(),
        api_key: RegisteredService::issue_api_key(),
        created_at: Utc::now(),
        last_updated_at: Utc::now(),
        last_log_received_at: None,
        client_id: client.id,
        client_name: client.name.clone(),
        environment: "production".to_string(),
        reporting_interval_minutes: 60,
        is_active: true,
        is_online: false,
        alerts_enabled: true,
        alert_threshold: LogLevel::Error,
        alert_recipients: vec!["oncall@acme.example".to_string()],
        webhook_url: None,
        metadata: None,
        source_path: None,
    }
}

fn sample_entry(service: &RegisteredService, level: LogLevel, message: &str) -> LogEntry {
    LogEntry {
        id: Uuid::new_v4(),
        timestamp: Utc::now(),
        level,
        message: message.to_string(),
        service_id: service.id,
        service_name: service.name.clone(),
        service_version: service.version.clone(),
        environment: service.environment.clone(),
        category: "checkout".to_string(),
        client_id: Some(service.client_id),
        client_name: Some(service.client_name.clone()),
        exception_details: None,
        stack_trace: None,
        correlation_id: None,
        context_data: None,
        contains_sensitive_data: false,
        ip_address: Some("10.1.2.3".to_string()),
        analyzed: false,
        analysis_result: None,
        received_at: Utc::now(),
        metadata: None,
    }
}

fn default_query() -> LogQuery {
    LogQuery {
        start: Utc::now() - Duration::days(7),
        end: Utc::now() + Duration::minutes(1),
        service_id: None,
        client_id: None,
        min_level: None,
        page: Page::default(),
    }
}

#[tokio::test]
async fn add_then_get_roundtrips_all_fields() {
    let pool = memory_pool().await;
    let logs = SqliteLogRepository::new(pool);

    let client = sample_client();
    let service = sample_service(&client);
    let mut entry = sample_entry(&service, LogLevel::Warning, "disk usage at 91%");
    entry.exception_details = Some("DiskPressureException".to_string());
    entry.stack_trace = Some("at monitor.rs:42".to_string());
    entry.correlation_id = Some("req-998".to_string());
    entry.metadata = Some(HashMap::from([(
        "host".to_string(),
        "node-3".to_string(),
    )]));

    logs.add(&entry).await.expect("insert");
    let stored = logs.get(entry.id).await.expect("query").expect("present");

    assert_eq!(stored.id, entry.id);
    assert_eq!(stored.level, LogLevel::Warning);
    assert_eq!(stored.message, entry.message);
    assert_eq!(stored.service_id, service.id);
    assert_eq!(stored.client_id, Some(client.id));
    assert_eq!(stored.exception_details, entry.exception_details);
    assert_eq!(stored.correlation_id, entry.correlation_id);
    assert_eq!(stored.metadata, entry.metadata);
    assert!(!stored.analyzed);
}

#[tokio::test]
async fn search_applies_range_and_min_level() {
    let pool = memory_pool().await;
    let logs = SqliteLogRepository::new(pool);
    let client = sample_client();
    let service = sample_service(&client);

    let mut old = sample_entry(&service, LogLevel::Error, "stale failure");
    old.timestamp = Utc::now() - Duration::days(30);
    logs.add(&old).await.unwrap();

    logs.add(&sample_entry(&service, LogLevel::Information, "routine"))
        .await
        .unwrap();
    logs.add(&sample_entry(&service, LogLevel::Error, "payment declined"))
        .await
        .unwrap();
    logs.add(&sample_entry(&service, LogLevel::Critical, "gateway down"))
        .await
        .unwrap();

    let mut query = default_query();
    query.min_level = Some(LogLevel::Error);
    let hits = logs.search(&query).await.unwrap();

    assert_eq!(hits.len(), 2);
    for hit in &hits {
        assert!(hit.level >= LogLevel::Error);
        assert!(hit.timestamp >= query.start && hit.timestamp <= query.end);
    }
}

#[tokio::test]
async fn text_search_scans_message_category_exception_and_stack() {
    let pool = memory_pool().await;
    let logs = SqliteLogRepository::new(pool);
    let client = sample_client();
    let service = sample_service(&client);

    let mut by_exception = sample_entry(&service, LogLevel::Error, "request failed");
    by_exception.exception_details = Some("java.net.SocketTimeoutException".to_string());
    logs.add(&by_exception).await.unwrap();

    let mut by_stack = sample_entry(&service, LogLevel::Error, "request failed");
    by_stack.stack_trace = Some("timeout waiting for connection pool".to_string());
    logs.add(&by_stack).await.unwrap();

    logs.add(&sample_entry(&service, LogLevel::Error, "TIMEOUT contacting upstream"))
        .await
        .unwrap();
    logs.add(&sample_entry(&service, LogLevel::Error, "unrelated"))
        .await
        .unwrap();

    let hits = logs.search_text("timeout", &default_query()).await.unwrap();
    assert_eq!(hits.len(), 3);
}

#[tokio::test]
async fn counts_follow_their_predicates() {
    let pool = memory_pool().await;
    let logs = SqliteLogRepository::new(pool);
    let client = sample_client();
    let service = sample_service(&client);

    logs.add(&sample_entry(&service, LogLevel::Information, "a"))
        .await
        .unwrap();
    logs.add(&sample_entry(&service, LogLevel::Error, "b"))
        .await
        .unwrap();
    logs.add(&sample_entry(&service, LogLevel::Critical, "c"))
        .await
        .unwrap();

    assert_eq!(logs.count_by_service(service.id).await.unwrap(), 3);
    assert_eq!(logs.count_by_client(client.id).await.unwrap(), 3);
    assert_eq!(logs.count_by_level(LogLevel::Error).await.unwrap(), 2);
    assert_eq!(logs.count_by_service(Uuid::new_v4()).await.unwrap(), 0);
}

#[tokio::test]
async fn listings_are_newest_first_and_paginated() {
    let pool = memory_pool().await;
    let logs = SqliteLogRepository::new(pool);
    let client = sample_client();
    let service = sample_service(&client);

    for i in 0..5 {
        let mut entry = sample_entry(&service, LogLevel::Information, &format!("event {i}"));
        entry.timestamp = Utc::now() - Duration::minutes(5 - i);
        logs.add(&entry).await.unwrap();
    }
    let mut error = sample_entry(&service, LogLevel::Error, "latest failure");
    error.timestamp = Utc::now();
    logs.add(&error).await.unwrap();

    let page = logs
        .by_service(service.id, Page { skip: 0, take: 3 })
        .await
        .unwrap();
    assert_eq!(page.len(), 3);
    assert!(page[0].timestamp >= page[1].timestamp);
    assert_eq!(page[0].message, "latest failure");

    let rest = logs
        .by_service(service.id, Page { skip: 3, take: 10 })
        .await
        .unwrap();
    assert_eq!(rest.len(), 3);

    let by_client = logs.by_client(client.id, Page::default()).await.unwrap();
    assert_eq!(by_client.len(), 6);

    // by_level lists exactly that level, not level-and-above.
    let errors = logs.by_level(LogLevel::Error, Page::default()).await.unwrap();
    assert_eq!(errors.len(), 1);
    let infos = logs
        .by_level(LogLevel::Information, Page::default())
        .await
        .unwrap();
    assert_eq!(infos.len(), 5);
}

#[tokio::test]
async fn client_lookup_by_number_and_search() {
    let pool = memory_pool().await;
    let clients = SqliteClientRepository::new(pool);
    let mut client = sample_client();
    client.name = "Initech".to_string();
    clients.add(&client).await.unwrap();

    let found = clients
        .get_by_number(&client.client_number)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, client.id);
    assert!(clients.get_by_number("missing").await.unwrap().is_none());

    let hits = clients.search("initech").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert!(clients.search("unrelated").await.unwrap().is_empty());
}

#[tokio::test]
async fn set_analysis_marks_entry_once() {
    let pool = memory_pool().await;
    let logs = SqliteLogRepository::new(pool);
    let client = sample_client();
    let service = sample_service(&client);
    let entry = sample_entry(&service, LogLevel::Error, "boom");
    logs.add(&entry).await.unwrap();

    assert!(logs.set_analysis(entry.id, "root cause: boom").await.unwrap());
    let stored = logs.get(entry.id).await.unwrap().unwrap();
    assert!(stored.analyzed);
    assert_eq!(stored.analysis_result.as_deref(), Some("root cause: boom"));

    assert!(!logs.set_analysis(Uuid::new_v4(), "nothing").await.unwrap());
}

#[tokio::test]
async fn regenerating_api_key_invalidates_the_old_one() {
    let pool = memory_pool().await;
    let services = SqliteServiceRepository::new(pool);
    let client = sample_client();
    let service = sample_service(&client);
    let old_key = service.api_key.clone();
    services.add(&service).await.unwrap();

    let new_key = services
        .regenerate_api_key(service.id)
        .await
        .unwrap()
        .expect("service exists");
    assert_ne!(new_key, old_key);

    assert!(services.get_by_api_key(&old_key).await.unwrap().is_none());
    let found = services.get_by_api_key(&new_key).await.unwrap().unwrap();
    assert_eq!(found.id, service.id);

    assert!(services.regenerate_api_key(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_api_key_is_a_conflict() {
    let pool = memory_pool().await;
    let services = SqliteServiceRepository::new(pool);
    let client = sample_client();
    let first = sample_service(&client);
    services.add(&first).await.unwrap();

    let mut second = sample_service(&client);
    second.api_key = first.api_key.clone();
    match services.add(&second).await {
        Err(StoreError::Conflict(_)) => {}
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn deactivate_then_activate_converges() {
    let pool = memory_pool().await;
    let services = SqliteServiceRepository::new(pool);
    let client = sample_client();
    let service = sample_service(&client);
    services.add(&service).await.unwrap();

    assert!(services.deactivate(service.id).await.unwrap());
    assert!(services.deactivate(service.id).await.unwrap());
    assert!(services.activate(service.id).await.unwrap());
    assert!(services.activate(service.id).await.unwrap());

    let stored = services.get(service.id).await.unwrap().unwrap();
    assert!(stored.is_active);

    assert!(!services.activate(Uuid::new_v4()).await.unwrap());
}

#[tokio::test]
async fn stale_lists_quiet_services_only() {
    let pool = memory_pool().await;
    let services = SqliteServiceRepository::new(pool).with_staleness(2.0);
    let client = sample_client();

    let mut quiet = sample_service(&client);
    quiet.name = "quiet".to_string();
    quiet.reporting_interval_minutes = 1;
    services.add(&quiet).await.unwrap();
    services
        .set_online(quiet.id, true, Utc::now() - Duration::minutes(10))
        .await
        .unwrap();

    let mut chatty = sample_service(&client);
    chatty.name = "chatty".to_string();
    chatty.reporting_interval_minutes = 1;
    services.add(&chatty).await.unwrap();
    services.set_online(chatty.id, true, Utc::now()).await.unwrap();

    let mut fresh = sample_service(&client);
    fresh.name = "fresh-never-reported".to_string();
    fresh.reporting_interval_minutes = 60;
    services.add(&fresh).await.unwrap();

    let stale = services.stale().await.unwrap();
    let names: Vec<_> = stale.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["quiet"]);
}

#[tokio::test]
async fn service_search_scopes_by_client() {
    let pool = memory_pool().await;
    let services = SqliteServiceRepository::new(pool);
    let acme = sample_client();
    let globex = sample_client();

    let mut a = sample_service(&acme);
    a.name = "payment-api".to_string();
    services.add(&a).await.unwrap();

    let mut b = sample_service(&globex);
    b.name = "payment-batch".to_string();
    services.add(&b).await.unwrap();

    let all = services.search("payment", None).await.unwrap();
    assert_eq!(all.len(), 2);

    let scoped = services.search("payment", Some(acme.id)).await.unwrap();
    assert_eq!(scoped.len(), 1);
    assert_eq!(scoped[0].id, a.id);
}

#[tokio::test]
async fn client_contacts_and_settings_roundtrip() {
    let pool = memory_pool().await;
    let clients = SqliteClientRepository::new(pool);
    let client = sample_client();
    clients.add(&client).await.unwrap();

    let contact = ContactPerson {
        id: Uuid::new_v4(),
        name: "Dana".to_string(),
        role: "SRE".to_string(),
        email: "dana@acme.example".to_string(),
        phone: String::new(),
        receive_alerts: true,
    };
    assert!(clients.add_contact(client.id, &contact).await.unwrap());

    let mut renamed = contact.clone();
    renamed.name = "Dana R.".to_string();
    assert!(clients.update_contact(client.id, &renamed).await.unwrap());

    let stored = clients.get(client.id).await.unwrap().unwrap();
    assert_eq!(stored.contacts.len(), 1);
    assert_eq!(stored.contacts[0].name, "Dana R.");

    let settings = NotificationSettings {
        email_enabled: false,
        sms_enabled: true,
        webhook_enabled: true,
        webhook_url: Some("https://hooks.acme.example/logs".to_string()),
        threshold: LogLevel::Critical,
    };
    assert!(clients
        .set_notification_settings(client.id, &settings)
        .await
        .unwrap());
    let stored = clients.get(client.id).await.unwrap().unwrap();
    assert!(stored.notification_settings.sms_enabled);
    assert_eq!(stored.notification_settings.threshold, LogLevel::Critical);

    assert!(clients.remove_contact(client.id, contact.id).await.unwrap());
    assert!(!clients.remove_contact(client.id, contact.id).await.unwrap());
}

#[tokio::test]
async fn client_numbers_are_unique() {
    let pool = memory_pool().await;
    let clients = SqliteClientRepository::new(pool);
    let first = sample_client();
    clients.add(&first).await.unwrap();

    assert!(clients
        .is_number_taken(&first.client_number, None)
        .await
        .unwrap());
    assert!(!clients
        .is_number_taken(&first.client_number, Some(first.id))
        .await
        .unwrap());

    let mut dup = sample_client();
    dup.client_number = first.client_number.clone();
    match clients.add(&dup).await {
        Err(StoreError::Conflict(_)) => {}
        other => panic!("expected conflict, got {other:?}"),
    }
}

fn sample_user() -> User {
    User {
        id: Uuid::new_v4(),
        username: format!("op-{}", Uuid::new_v4().simple()),
        email: format!("{}@acme.example", Uuid::new_v4().simple()),
        password_hash: "hash".to_string(),
        password_salt: "salt".to_string(),
        display_name: "Operator".to_string(),
        phone: None,
        email_confirmed: true,
        phone_confirmed: false,
        email_token: None,
        phone_token: None,
        two_factor_secret: None,
        failed_login_count: 0,
        locked_until: None,
        roles: vec!["Support".to_string()],
        client_access: Vec::new(),
        preferences: HashMap::new(),
        created_at: Utc::now(),
        last_login_at: None,
    }
}

#[tokio::test]
async fn users_roundtrip_and_enforce_uniqueness() {
    let pool = memory_pool().await;
    let users = SqliteUserRepository::new(pool);
    let user = sample_user();
    users.add(&user).await.unwrap();

    let stored = users.get_by_username(&user.username).await.unwrap().unwrap();
    assert_eq!(stored.id, user.id);
    assert_eq!(stored.roles, vec!["Support".to_string()]);
    let by_email = users.get_by_email(&user.email).await.unwrap().unwrap();
    assert_eq!(by_email.id, user.id);
    assert!(users.is_username_taken(&user.username).await.unwrap());
    assert!(users.is_email_taken(&user.email).await.unwrap());

    let mut dup = sample_user();
    dup.username = user.username.clone();
    match users.add(&dup).await {
        Err(StoreError::Conflict(_)) => {}
        other => panic!("expected conflict, got {other:?}"),
    }
}
