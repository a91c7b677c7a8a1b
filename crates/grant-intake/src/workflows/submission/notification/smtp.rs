use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Tokio1Executor};

use super::{MailTransport, OutboundMessage, TransportError};
use crate::config::MailConfig;

/// STARTTLS relay (Gmail app passwords, Brevo, and similar).
#[derive(Clone)]
pub struct SmtpMailTransport {
    inner: AsyncSmtpTransport<Tokio1Executor>,
}

impl std::fmt::Debug for SmtpMailTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailTransport").finish_non_exhaustive()
    }
}

impl SmtpMailTransport {
    pub fn from_config(config: &MailConfig) -> Result<Self, TransportError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|err| TransportError::Relay(err.to_string()))?
            .port(config.smtp_port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            inner: builder.build(),
        })
    }
}

fn address(raw: &str) -> Result<Address, TransportError> {
    raw.trim()
        .parse::<Address>()
        .map_err(|_| TransportError::Address(raw.to_string()))
}

/// Translate the transport-neutral envelope into a lettre message.
pub(crate) fn build_message(message: &OutboundMessage) -> Result<Message, TransportError> {
    let from = Mailbox::new(
        Some(message.from_name.clone()),
        address(&message.from_address)?,
    );
    let mut builder = Message::builder()
        .from(from)
        .to(Mailbox::new(None, address(&message.to)?))
        .subject(message.subject.clone())
        .header(ContentType::TEXT_HTML);
    if let Some(reply_to) = &message.reply_to {
        builder = builder.reply_to(Mailbox::new(None, address(reply_to)?));
    }

    builder
        .body(message.html_body.clone())
        .map_err(|err| TransportError::Build(err.to_string()))
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        let email = build_message(message)?;
        self.inner
            .send(email)
            .await
            .map(|_| ())
            .map_err(|err| TransportError::Relay(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outbound() -> OutboundMessage {
        OutboundMessage {
            from_name: "Asha Raman (Application)".to_string(),
            from_address: "intake@example.org".to_string(),
            to: "admin@example.org".to_string(),
            reply_to: Some("asha@example.com".to_string()),
            subject: "New Application Received from Asha Raman (Kiln Works)".to_string(),
            html_body: "<p>A new application has been submitted.</p>".to_string(),
        }
    }

    #[test]
    fn admin_envelope_routes_replies_to_the_applicant() {
        let message = build_message(&outbound()).expect("message builds");
        let headers = message.headers().to_string();
        assert!(headers.contains("Reply-To: asha@example.com"));
        assert!(headers.contains("To: admin@example.org"));
        assert!(headers.contains("intake@example.org"));
    }

    #[tokio::test]
    async fn starttls_relay_builds_from_mail_config() {
        let config = MailConfig {
            smtp_host: "smtp.example.org".to_string(),
            smtp_port: 587,
            username: Some("intake@example.org".to_string()),
            password: Some("app-password".to_string()),
            sender_address: "intake@example.org".to_string(),
            sender_name: "PSNA Technology Foundation".to_string(),
            admin_email: "admin@example.org".to_string(),
        };
        assert!(SmtpMailTransport::from_config(&config).is_ok());
    }

    #[test]
    fn rejects_malformed_recipient() {
        let mut message = outbound();
        message.to = "not an address".to_string();
        assert_eq!(
            build_message(&message).unwrap_err(),
            TransportError::Address("not an address".to_string())
        );
    }
}
