//! Server configuration: a TOML file selected by `LOGVAULT_CONFIG`,
//! with environment overrides for secrets and deployment-specific values.

use serde::Deserialize;
use std::fs;

use logvault_analysis::AnalysisConfig;
use logvault_auth::{AuthConfig, JwtConfig};
use logvault_notify::NotifierSettings;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub bind_addr: String,
    pub database_url: String,
    /// Multiplier on each service's reporting interval before it counts as
    /// offline.
    pub staleness_factor: f64,
    pub auth: AuthSection,
    pub analysis: AnalysisSection,
    pub notify: NotifySection,
    pub worker: WorkerSection,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            database_url: "sqlite://logvault.db".to_string(),
            staleness_factor: 2.0,
            auth: AuthSection::default(),
            analysis: AnalysisSection::default(),
            notify: NotifySection::default(),
            worker: WorkerSection::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    pub jwt_secret: String,
    pub issuer: String,
    pub audience: String,
    pub token_ttl_minutes: i64,
    pub leeway_secs: u64,
    pub max_failed_logins: i64,
    pub lockout_minutes: i64,
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            issuer: "logvault".to_string(),
            audience: "logvault-api".to_string(),
            token_ttl_minutes: 60,
            leeway_secs: 60,
            max_failed_logins: 5,
            lockout_minutes: 15,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct AnalysisSection {
    pub workflow_url: Option<String>,
    pub workflow_api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NotifySection {
    pub email_enabled: bool,
    pub sms_enabled: bool,
    pub webhooks_enabled: bool,
    pub sender: String,
}

impl Default for NotifySection {
    fn default() -> Self {
        Self {
            email_enabled: true,
            sms_enabled: false,
            webhooks_enabled: true,
            sender: "logvault@localhost".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WorkerSection {
    /// Number of background analysis workers.
    pub workers: usize,
    /// Bounded queue capacity; submissions past this are dropped.
    pub queue_capacity: usize,
}

impl Default for WorkerSection {
    fn default() -> Self {
        Self {
            workers: 2,
            queue_capacity: 64,
        }
    }
}

impl ApiConfig {
    /// Load from the file named by `LOGVAULT_CONFIG` (defaults otherwise),
    /// then apply environment overrides.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let mut config: ApiConfig = match std::env::var("LOGVAULT_CONFIG") {
            Ok(path) => toml::from_str(&fs::read_to_string(path)?)?,
            Err(_) => ApiConfig::default(),
        };

        if let Ok(addr) = std::env::var("LOGVAULT_BIND") {
            config.bind_addr = addr;
        }
        if let Ok(url) = std::env::var("LOGVAULT_DB") {
            config.database_url = url;
        }
        if let Ok(secret) = std::env::var("LOGVAULT_JWT_SECRET") {
            config.auth.jwt_secret = secret;
        }
        if let Ok(url) = std::env::var("LOGVAULT_WORKFLOW_URL") {
            config.analysis.workflow_url = Some(url);
        }
        if let Ok(key) = std::env::var("LOGVAULT_WORKFLOW_KEY") {
            config.analysis.workflow_api_key = Some(key);
        }

        Ok(config)
    }

    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            jwt: JwtConfig {
                secret: self.auth.jwt_secret.clone(),
                issuer: self.auth.issuer.clone(),
                audience: self.auth.audience.clone(),
                ttl_minutes: self.auth.token_ttl_minutes,
                leeway_secs: self.auth.leeway_secs,
            },
            max_failed_logins: self.auth.max_failed_logins,
            lockout_minutes: self.auth.lockout_minutes,
        }
    }

    pub fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            workflow_url: self.analysis.workflow_url.clone(),
            workflow_api_key: self.analysis.workflow_api_key.clone(),
            ..Default::default()
        }
    }

    pub fn notifier_settings(&self) -> NotifierSettings {
        NotifierSettings {
            email_enabled: self.notify.email_enabled,
            sms_enabled: self.notify.sms_enabled,
            webhooks_enabled: self.notify.webhooks_enabled,
            sender: self.notify.sender.clone(),
        }
    }
}
