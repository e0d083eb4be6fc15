// Notification sinks for alert activations.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::EmailConfig;
use crate::error::{MonitorError, MonitorResult};

/// Something that can deliver a short text message to an address.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> MonitorResult<()>;

    fn name(&self) -> &str;
}

/// SMTP delivery. A disabled sink accepts every message without sending it.
pub struct EmailSink {
    config: EmailConfig,
}

impl EmailSink {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Host, port and sender address; SinkNotConfigured when any is missing.
    fn endpoint(&self) -> MonitorResult<(&str, u16, &str)> {
        let c = &self.config;
        match (c.smtp_host.trim(), c.smtp_port, c.smtp_from.trim()) {
            (host, Some(port), from) if !host.is_empty() && !from.is_empty() => {
                Ok((host, port, from))
            }
            _ => Err(MonitorError::SinkNotConfigured(
                "smtp_host, smtp_port and smtp_from are required".into(),
            )),
        }
    }

    fn build_message(&self, from: &str, to: &str, subject: &str, body: &str) -> MonitorResult<Message> {
        let from: Mailbox = from
            .parse()
            .map_err(|e| MonitorError::Delivery(format!("invalid sender {:?}: {}", from, e)))?;
        let to: Mailbox = to
            .parse()
            .map_err(|e| MonitorError::Delivery(format!("invalid recipient {:?}: {}", to, e)))?;
        Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| MonitorError::Delivery(format!("build message: {}", e)))
    }

    fn transport(&self, host: &str, port: u16) -> MonitorResult<AsyncSmtpTransport<Tokio1Executor>> {
        let tls = TlsParameters::new(host.to_string())
            .map_err(|e| MonitorError::Delivery(format!("tls parameters: {}", e)))?;
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
            .port(port)
            .tls(Tls::Opportunistic(tls));
        if !self.config.smtp_user.is_empty() || !self.config.smtp_pass.is_empty() {
            builder = builder.credentials(Credentials::new(
                self.config.smtp_user.clone(),
                self.config.smtp_pass.clone(),
            ));
        }
        Ok(builder.build())
    }
}

#[async_trait]
impl NotificationSink for EmailSink {
    async fn send(&self, to: &str, subject: &str, body: &str) -> MonitorResult<()> {
        if !self.config.enabled {
            return Ok(());
        }
        let (host, port, from) = self.endpoint()?;
        let message = self.build_message(from, to, subject, body)?;
        let mailer = self.transport(host, port)?;
        mailer
            .send(message)
            .await
            .map_err(|e| MonitorError::Delivery(format!("smtp {}:{}: {}", host, port, e)))?;
        tracing::debug!(to, subject, "alert email sent");
        Ok(())
    }

    fn name(&self) -> &str {
        "email"
    }
}
