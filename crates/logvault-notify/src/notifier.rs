//! Notification client.

use chrono::{DateTime, Utc};
use reqwest::Client as HttpClient;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use logvault_core::{AnalysisAnomaly, AnalysisReport, Client, LogEntry, RegisteredService};

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("webhook returned error: {0}")]
    WebhookRejected(String),
}

#[derive(Debug, Clone)]
pub struct NotifierSettings {
    pub email_enabled: bool,
    pub sms_enabled: bool,
    pub webhooks_enabled: bool,
    /// From-address stamped on outgoing mail.
    pub sender: String,
}

impl Default for NotifierSettings {
    fn default() -> Self {
        Self {
            email_enabled: true,
            sms_enabled: false,
            webhooks_enabled: true,
            sender: "logvault@localhost".to_string(),
        }
    }
}

/// Webhook payload for log-driven alerts.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAlert {
    pub kind: String,
    pub service: String,
    pub severity: String,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

pub struct Notifier {
    client: HttpClient,
    settings: NotifierSettings,
}

impl Notifier {
    pub fn new(settings: NotifierSettings) -> Self {
        Self {
            client: HttpClient::new(),
            settings,
        }
    }

    /// POST a JSON payload to a webhook URL. Non-2xx responses are errors.
    pub async fn send_webhook<T: Serialize + ?Sized>(
        &self,
        payload: &T,
        url: &str,
    ) -> Result<(), NotifyError> {
        if !self.settings.webhooks_enabled {
            return Ok(());
        }

        let response = self.client.post(url).json(payload).send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            let error_text = response.text().await.unwrap_or_default();
            Err(NotifyError::WebhookRejected(error_text))
        }
    }

    /// Hand mail to the outbound channel. Returns false when the channel is
    /// disabled or there is nobody to send to.
    // TODO: wire an SMTP transport behind this; today delivery is the
    // structured dispatch record below.
    pub async fn send_email(
        &self,
        subject: &str,
        body: &str,
        recipients: &[String],
        html: bool,
    ) -> Result<bool, NotifyError> {
        if !self.settings.email_enabled || recipients.is_empty() {
            return Ok(false);
        }
        info!(
            from = %self.settings.sender,
            to = ?recipients,
            subject,
            html,
            bytes = body.len(),
            "email dispatched"
        );
        Ok(true)
    }

    pub async fn send_sms(
        &self,
        message: &str,
        numbers: &[String],
    ) -> Result<bool, NotifyError> {
        if !self.settings.sms_enabled || numbers.is_empty() {
            return Ok(false);
        }
        info!(to = ?numbers, chars = message.len(), "sms dispatched");
        Ok(true)
    }

    /// Alert recipients about a critical log entry.
    pub async fn send_critical_error(
        &self,
        entry: &LogEntry,
        recipients: &[String],
    ) -> Result<bool, NotifyError> {
        let subject = format!(
            "[{}] {:?} in {}",
            entry.environment, entry.level, entry.service_name
        );
        let body = format!(
            "Service: {}\nLevel: {:?}\nAt: {}\n\n{}\n\n{}",
            entry.service_name,
            entry.level,
            entry.timestamp.to_rfc3339(),
            entry.message,
            entry
                .analysis_result
                .as_deref()
                .unwrap_or("No analysis available yet."),
        );
        self.send_email(&subject, &body, recipients, false).await
    }

    /// Tell recipients a service stopped reporting.
    pub async fn send_service_interruption(
        &self,
        service: &RegisteredService,
        last_seen_at: DateTime<Utc>,
        recipients: &[String],
    ) -> Result<bool, NotifyError> {
        let subject = format!("[{}] {} stopped reporting", service.environment, service.name);
        let body = format!(
            "{} last reported at {} and is past its {}-minute reporting interval.",
            service.name,
            last_seen_at.to_rfc3339(),
            service.reporting_interval_minutes
        );
        self.send_email(&subject, &body, recipients, false).await
    }

    pub async fn send_anomaly(
        &self,
        anomaly: &AnalysisAnomaly,
        service: &RegisteredService,
        recipients: &[String],
    ) -> Result<bool, NotifyError> {
        let subject = format!("[{}] anomaly in {}", service.environment, service.name);
        let body = format!(
            "{} ({} occurrences between {} and {})\n\n{}",
            anomaly.kind,
            anomaly.occurrences,
            anomaly.first_seen.to_rfc3339(),
            anomaly.last_seen.to_rfc3339(),
            anomaly.description
        );
        self.send_email(&subject, &body, recipients, false).await
    }

    pub async fn send_report(
        &self,
        report: &AnalysisReport,
        recipients: &[String],
    ) -> Result<bool, NotifyError> {
        let subject = format!(
            "Analysis report {} - {}",
            report.start_date.format("%Y-%m-%d"),
            report.end_date.format("%Y-%m-%d")
        );
        self.send_email(&subject, &report.executive_summary, recipients, true)
            .await
    }

    /// Recipients for a service alert: the service's own list plus the
    /// owning client's alert contacts, when the client's email channel is
    /// on. Duplicates removed, order preserved.
    pub fn recipients_for_service(
        &self,
        service: &RegisteredService,
        client: Option<&Client>,
    ) -> Vec<String> {
        let mut recipients = service.alert_recipients.clone();
        if let Some(client) = client {
            if client.notification_settings.email_enabled {
                recipients.extend(self.recipients_for_client(client));
            }
        }
        dedup_preserving_order(recipients)
    }

    pub fn recipients_for_client(&self, client: &Client) -> Vec<String> {
        let contacts = client
            .contacts
            .iter()
            .filter(|c| c.receive_alerts && !c.email.is_empty())
            .map(|c| c.email.clone());
        dedup_preserving_order(contacts.collect())
    }
}

fn dedup_preserving_order(addresses: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    addresses
        .into_iter()
        .filter(|a| seen.insert(a.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use logvault_core::{ContactPerson, LogLevel, NotificationSettings};
    use uuid::Uuid;

    fn service_with_recipients(recipients: Vec<String>) -> RegisteredService {
        RegisteredService {
            id: Uuid::new_v4(),
            name: "orders".to_string(),
            description: String::new(),
            version: "1.0.0".to_string(),
            service_type: "web".to_string(),
            api_key: RegisteredService::issue_api_key(),
            created_at: Utc::now(),
            last_updated_at: Utc::now(),
            last_log_received_at: None,
            client_id: Uuid::new_v4(),
            client_name: "Acme".to_string(),
            environment: "production".to_string(),
            reporting_interval_minutes: 60,
            is_active: true,
            is_online: true,
            alerts_enabled: true,
            alert_threshold: LogLevel::Error,
            alert_recipients: recipients,
            webhook_url: None,
            metadata: None,
            source_path: None,
        }
    }

    fn client_with_contacts(contacts: Vec<ContactPerson>, email_enabled: bool) -> Client {
        Client {
            id: Uuid::new_v4(),
            name: "Acme".to_string(),
            client_number: "C-1".to_string(),
            description: String::new(),
            email: String::new(),
            phone: String::new(),
            address: String::new(),
            created_at: Utc::now(),
            last_updated_at: Utc::now(),
            is_active: true,
            contacts,
            notification_settings: NotificationSettings {
                email_enabled,
                ..Default::default()
            },
            metadata: None,
        }
    }

    fn contact(email: &str, receive_alerts: bool) -> ContactPerson {
        ContactPerson {
            id: Uuid::new_v4(),
            name: "Someone".to_string(),
            role: String::new(),
            email: email.to_string(),
            phone: String::new(),
            receive_alerts,
        }
    }

    #[test]
    fn recipients_merge_service_list_and_alert_contacts() {
        let notifier = Notifier::new(NotifierSettings::default());
        let service =
            service_with_recipients(vec!["oncall@acme.test".to_string(), "sre@acme.test".to_string()]);
        let client = client_with_contacts(
            vec![
                contact("dana@acme.test", true),
                contact("quiet@acme.test", false),
                contact("oncall@acme.test", true),
            ],
            true,
        );

        let recipients = notifier.recipients_for_service(&service, Some(&client));
        assert_eq!(
            recipients,
            vec![
                "oncall@acme.test".to_string(),
                "sre@acme.test".to_string(),
                "dana@acme.test".to_string(),
            ]
        );
    }

    #[test]
    fn disabled_client_email_channel_keeps_contacts_out() {
        let notifier = Notifier::new(NotifierSettings::default());
        let service = service_with_recipients(vec!["oncall@acme.test".to_string()]);
        let client = client_with_contacts(vec![contact("dana@acme.test", true)], false);

        let recipients = notifier.recipients_for_service(&service, Some(&client));
        assert_eq!(recipients, vec!["oncall@acme.test".to_string()]);
    }

    #[tokio::test]
    async fn disabled_channels_short_circuit() {
        let notifier = Notifier::new(NotifierSettings {
            email_enabled: false,
            sms_enabled: false,
            webhooks_enabled: false,
            sender: String::new(),
        });

        let sent = notifier
            .send_email("s", "b", &["a@b.test".to_string()], false)
            .await
            .unwrap();
        assert!(!sent);

        let sent = notifier.send_sms("hi", &["+123".to_string()]).await.unwrap();
        assert!(!sent);

        // Disabled webhooks never touch the network, so a bogus URL is fine.
        notifier
            .send_webhook(&serde_json::json!({}), "http://127.0.0.1:1/hook")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn empty_recipient_lists_send_nothing() {
        let notifier = Notifier::new(NotifierSettings::default());
        let sent = notifier.send_email("s", "b", &[], false).await.unwrap();
        assert!(!sent);
    }

    #[tokio::test]
    async fn composed_notifications_reach_the_email_channel() {
        let notifier = Notifier::new(NotifierSettings::default());
        let service = service_with_recipients(vec!["oncall@acme.test".to_string()]);
        let recipients = notifier.recipients_for_service(&service, None);

        let sent = notifier
            .send_service_interruption(&service, Utc::now(), &recipients)
            .await
            .unwrap();
        assert!(sent);

        let anomaly = logvault_core::AnalysisAnomaly {
            id: Uuid::new_v4(),
            kind: "Recurring Error".to_string(),
            description: "charge failed repeated 4 times".to_string(),
            severity: LogLevel::Error,
            related_log_ids: Vec::new(),
            occurrences: 4,
            first_seen: Utc::now(),
            last_seen: Utc::now(),
        };
        let sent = notifier
            .send_anomaly(&anomaly, &service, &recipients)
            .await
            .unwrap();
        assert!(sent);

        let report = logvault_core::AnalysisReport {
            id: Uuid::new_v4(),
            service_id: service.id,
            generated_at: Utc::now(),
            start_date: Utc::now(),
            end_date: Utc::now(),
            executive_summary: "quiet week".to_string(),
            level_counts: std::collections::HashMap::new(),
            anomalies: Vec::new(),
            suggestions: Vec::new(),
            trends: Vec::new(),
        };
        let sent = notifier.send_report(&report, &recipients).await.unwrap();
        assert!(sent);
    }
}
