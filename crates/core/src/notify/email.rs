use crate::config::Settings;
use crate::notify::Notifier;
use anyhow::{Context, Result};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

#[derive(Clone)]
pub struct EmailNotifier {
    sender: Mailbox,
    receivers: Vec<Mailbox>,
    smtp_host: String,
    smtp_port: u16,
    credentials: Credentials,
}

impl std::fmt::Debug for EmailNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailNotifier")
            .field("sender", &self.sender.to_string())
            .field("receivers", &self.receivers.len())
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .finish_non_exhaustive()
    }
}

impl EmailNotifier {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let sender = settings.require_email_sender()?;
        let password = settings.require_email_password()?;

        anyhow::ensure!(
            !settings.email_receivers.is_empty(),
            "EMAIL_RECEIVERS must list at least one address"
        );

        let sender_mailbox = sender
            .parse::<Mailbox>()
            .with_context(|| format!("EMAIL_SENDER is not a valid address: {sender}"))?;
        let receivers = settings
            .email_receivers
            .iter()
            .map(|r| {
                r.parse::<Mailbox>()
                    .with_context(|| format!("EMAIL_RECEIVERS entry is not a valid address: {r}"))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            sender: sender_mailbox,
            receivers,
            smtp_host: settings.smtp_host.clone(),
            smtp_port: settings.smtp_port,
            credentials: Credentials::new(sender.to_string(), password.to_string()),
        })
    }

    pub fn recipient_count(&self) -> usize {
        self.receivers.len()
    }

    fn build_message(&self, subject: &str, html_body: &str) -> Result<Message> {
        let mut builder = Message::builder()
            .from(self.sender.clone())
            .subject(subject)
            .header(ContentType::TEXT_HTML);
        for to in &self.receivers {
            builder = builder.to(to.clone());
        }
        builder
            .body(html_body.to_string())
            .context("failed to build report email")
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        // Implicit TLS (SMTPS); port 465 on Gmail.
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.smtp_host)
            .with_context(|| format!("invalid SMTP relay {}", self.smtp_host))?
            .port(self.smtp_port)
            .credentials(self.credentials.clone())
            .build();
        Ok(transport)
    }
}

#[async_trait::async_trait]
impl Notifier for EmailNotifier {
    fn channel_name(&self) -> &'static str {
        "smtp"
    }

    async fn send_report(&self, subject: &str, html_body: &str) -> Result<()> {
        let message = self.build_message(subject, html_body)?;
        let transport = self.transport()?;

        transport
            .send(message)
            .await
            .with_context(|| format!("SMTP delivery via {}:{} failed", self.smtp_host, self.smtp_port))?;

        tracing::info!(
            recipients = self.receivers.len(),
            smtp_host = %self.smtp_host,
            "email sent successfully"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Settings {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|k| map.get(k).cloned()).unwrap()
    }

    #[test]
    fn requires_credentials_and_receivers() {
        assert!(EmailNotifier::from_settings(&settings(&[])).is_err());
        assert!(EmailNotifier::from_settings(&settings(&[
            ("EMAIL_SENDER", "bot@example.com"),
            ("EMAIL_PASSWORD", "pw"),
        ]))
        .is_err());
    }

    #[test]
    fn rejects_malformed_receiver() {
        let err = EmailNotifier::from_settings(&settings(&[
            ("EMAIL_SENDER", "bot@example.com"),
            ("EMAIL_PASSWORD", "pw"),
            ("EMAIL_RECEIVERS", "a@example.com,not-an-address"),
        ]))
        .unwrap_err();
        assert!(format!("{err:#}").contains("not-an-address"));
    }

    #[test]
    fn message_addresses_every_receiver_as_html() {
        let notifier = EmailNotifier::from_settings(&settings(&[
            ("EMAIL_SENDER", "bot@example.com"),
            ("EMAIL_PASSWORD", "pw"),
            ("EMAIL_RECEIVERS", "a@example.com, b@example.com"),
        ]))
        .unwrap();
        assert_eq!(notifier.recipient_count(), 2);

        let msg = notifier
            .build_message("NIFTY 50 Swing Trade Report", "<html></html>")
            .unwrap();
        assert_eq!(msg.envelope().to().len(), 2);

        let raw = String::from_utf8(msg.formatted()).unwrap();
        assert!(raw.contains("Subject: NIFTY 50 Swing Trade Report"));
        assert!(raw.contains("Content-Type: text/html"));
        assert!(raw.contains("From: bot@example.com"));
    }

    #[test]
    fn debug_hides_credentials() {
        let notifier = EmailNotifier::from_settings(&settings(&[
            ("EMAIL_SENDER", "bot@example.com"),
            ("EMAIL_PASSWORD", "hunter2"),
            ("EMAIL_RECEIVERS", "a@example.com"),
        ]))
        .unwrap();
        assert!(!format!("{notifier:?}").contains("hunter2"));
    }
}
