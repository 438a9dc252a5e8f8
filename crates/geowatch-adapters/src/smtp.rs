//! SMTP notifier
//!
//! Sends one plain-text email per alert through a STARTTLS relay.

use async_trait::async_trait;
use geowatch_adapter_api::{Notifier, NotifyError, NotifyResult};
use geowatch_api::{AlertKind, NotificationRequest};
use geowatch_util::{format_datetime_full, now};
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::fmt;
use tracing::debug;

/// Connection and addressing for the mail relay
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub sender: String,
    pub recipient: String,
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("sender", &self.sender)
            .field("recipient", &self.recipient)
            .finish()
    }
}

/// Notifier that emails every alert to a single recipient
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
    recipient: Mailbox,
}

impl SmtpNotifier {
    /// Build the transport. Addresses are checked here so a bad config fails
    /// at startup rather than on the first alert.
    pub fn new(config: &SmtpConfig) -> NotifyResult<Self> {
        let sender = parse_mailbox("sender", &config.sender)?;
        let recipient = parse_mailbox("recipient", &config.recipient)?;

        let credentials = Credentials::new(config.username.clone(), config.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| NotifyError::Delivery(format!("Failed to create SMTP transport: {}", e)))?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            transport,
            sender,
            recipient,
        })
    }

    /// Compose the email for one alert
    pub fn compose(&self, request: &NotificationRequest) -> NotifyResult<Message> {
        compose_message(&self.sender, &self.recipient, request, &render_body(request))
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, request: &NotificationRequest) -> NotifyResult<()> {
        let email = self.compose(request)?;

        self.transport
            .send(email)
            .await
            .map_err(|e| NotifyError::Delivery(format!("Failed to send email via SMTP: {}", e)))?;

        debug!(
            entity_id = %request.entity_id,
            recipient = %self.recipient,
            "Alert email accepted by relay"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "smtp"
    }
}

fn parse_mailbox(field: &str, address: &str) -> NotifyResult<Mailbox> {
    address
        .parse()
        .map_err(|e| NotifyError::Message(format!("Invalid {} address {:?}: {}", field, address, e)))
}

fn compose_message(
    sender: &Mailbox,
    recipient: &Mailbox,
    request: &NotificationRequest,
    body: &str,
) -> NotifyResult<Message> {
    Message::builder()
        .from(sender.clone())
        .to(recipient.clone())
        .subject(request.reason.subject(&request.entity_id))
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())
        .map_err(|e| NotifyError::Message(format!("Failed to build email: {}", e)))
}

/// Plain-text body for one alert
pub fn render_body(request: &NotificationRequest) -> String {
    let id = &request.entity_id;
    let (status, instruction) = match request.reason.kind() {
        AlertKind::LeftZone | AlertKind::StillOut => (
            "Out of Safety Zone",
            format!("Please bring entity {} back to the safety zone.", id),
        ),
        AlertKind::Returned => (
            "Back in Safety Zone",
            "No further action is needed.".to_string(),
        ),
    };

    format!(
        "Safety Zone Alert\n\
         \n\
         Entity ID: {id}\n\
         Status: {status}\n\
         Reason: {reason}\n\
         Time: {time}\n\
         \n\
         {instruction}\n",
        id = id,
        status = status,
        reason = request.reason,
        time = format_datetime_full(&now()),
        instruction = instruction,
    )
}
