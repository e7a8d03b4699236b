//! Notification dispatch: webhooks over HTTP, email/SMS through the
//! configured channels, and recipient resolution from service alert lists
//! and client contacts.

pub mod notifier;

pub use notifier::{Notifier, NotifierSettings, NotifyError, WebhookAlert};
