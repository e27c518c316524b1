// Outgoing mail seam
use async_trait::async_trait;
use logger_redacted::redact;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl MailMessage {
    pub fn new(to: &str, subject: &str, body: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        }
    }
}

/// Hands messages to the delivery layer
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Returns the delivery id
    async fn deliver(&self, message: MailMessage) -> Result<String>;
}

/// Logs messages instead of sending them
#[derive(Debug, Default)]
pub struct LoggingMailer;

impl LoggingMailer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Mailer for LoggingMailer {
    async fn deliver(&self, message: MailMessage) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        info!(
            delivery_id = %id,
            to = %redact(&message.to),
            subject = %message.subject,
            "Mail delivered to log"
        );
        Ok(id)
    }
}
