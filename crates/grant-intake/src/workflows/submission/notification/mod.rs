//! Confirmation mail for applicant and administrator.

pub mod messages;
pub mod smtp;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use super::domain::ApplicationRecord;
pub use messages::{admin_message, applicant_message, Sender};
pub use smtp::SmtpMailTransport;

/// Envelope plus HTML body for one outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub from_name: String,
    pub from_address: String,
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub html_body: String,
}

/// Outbound mail sender; one call is one delivery attempt.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<(), TransportError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("invalid address `{0}`")]
    Address(String),
    #[error("message could not be built: {0}")]
    Build(String),
    #[error("mail relay refused delivery: {0}")]
    Relay(String),
    #[error("mail relay did not answer within {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recipient {
    Applicant,
    Administrator,
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recipient::Applicant => f.write_str("applicant"),
            Recipient::Administrator => f.write_str("administrator"),
        }
    }
}

/// Result of a single delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientOutcome {
    pub recipient: Recipient,
    pub address: String,
    pub error: Option<TransportError>,
}

impl RecipientOutcome {
    pub fn delivered(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-recipient outcome of one dispatch; the two attempts are independent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub applicant: RecipientOutcome,
    pub admin: RecipientOutcome,
}

impl DeliveryReport {
    pub fn failed_recipients(&self) -> Vec<Recipient> {
        [&self.applicant, &self.admin]
            .into_iter()
            .filter(|outcome| !outcome.delivered())
            .map(|outcome| outcome.recipient)
            .collect()
    }

    pub fn all_delivered(&self) -> bool {
        self.applicant.delivered() && self.admin.delivered()
    }
}

/// At least one message was not delivered. The report says which.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("delivery failed for {}", describe_failures(.report))]
pub struct DeliveryFailed {
    pub report: DeliveryReport,
}

fn describe_failures(report: &DeliveryReport) -> String {
    [&report.applicant, &report.admin]
        .into_iter()
        .filter_map(|outcome| {
            outcome
                .error
                .as_ref()
                .map(|err| format!("{} <{}>: {err}", outcome.recipient, outcome.address))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub struct NotificationDispatcher {
    transport: Arc<dyn MailTransport>,
    sender: Sender,
    admin_email: String,
    timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(
        transport: Arc<dyn MailTransport>,
        sender: Sender,
        admin_email: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            sender,
            admin_email: admin_email.into(),
            timeout,
        }
    }

    /// Send the applicant confirmation, then the administrator summary.
    ///
    /// The second attempt runs whatever happened to the first. No retries.
    pub async fn notify(
        &self,
        record: &ApplicationRecord,
        download_link: &str,
    ) -> Result<DeliveryReport, DeliveryFailed> {
        let applicant = self
            .attempt(
                Recipient::Applicant,
                applicant_message(record, download_link, &self.sender),
                record,
            )
            .await;
        let admin = self
            .attempt(
                Recipient::Administrator,
                admin_message(record, download_link, &self.sender, &self.admin_email),
                record,
            )
            .await;

        let report = DeliveryReport { applicant, admin };
        if report.all_delivered() {
            Ok(report)
        } else {
            Err(DeliveryFailed { report })
        }
    }

    async fn attempt(
        &self,
        recipient: Recipient,
        message: OutboundMessage,
        record: &ApplicationRecord,
    ) -> RecipientOutcome {
        let result = match tokio::time::timeout(self.timeout, self.transport.send(&message)).await
        {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(self.timeout)),
        };

        match &result {
            Ok(()) => info!(
                application_id = %record.id,
                %recipient,
                address = %message.to,
                "notification sent"
            ),
            Err(err) => warn!(
                application_id = %record.id,
                %recipient,
                address = %message.to,
                %err,
                "notification failed"
            ),
        }

        RecipientOutcome {
            recipient,
            address: message.to,
            error: result.err(),
        }
    }
}
