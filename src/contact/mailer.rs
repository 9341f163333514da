use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use log::{debug, info};
use std::time::Duration;
use thiserror::Error;

/// SMTP reply codes that mean the credentials were refused.
const AUTH_FAILURE_CODES: [&str; 3] = ["530", "534", "535"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub subject: String,
    pub body: String,
    pub reply_to: Option<String>,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail credentials are not configured")]
    NotConfigured,
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("{0}")]
    Other(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    fn is_configured(&self) -> bool;

    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError>;
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Operator inbox; falls back to `username`.
    pub recipient: Option<String>,
    pub timeout: Duration,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            username: None,
            password: None,
            recipient: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Sends through an authenticated STARTTLS relay.
pub struct SmtpMailer {
    config: MailConfig,
}

impl SmtpMailer {
    pub fn new(config: MailConfig) -> Self {
        Self { config }
    }

    fn build_message(&self, mail: &OutgoingMail, sender: &str) -> Result<Message, MailError> {
        let from: Mailbox = parse_mailbox(sender)?;
        let to: Mailbox = parse_mailbox(self.config.recipient.as_deref().unwrap_or(sender))?;

        let mut builder = Message::builder()
            .from(from)
            .to(to)
            .subject(mail.subject.clone())
            .header(ContentType::TEXT_PLAIN);
        if let Some(reply_to) = &mail.reply_to {
            builder = builder.reply_to(parse_mailbox(reply_to)?);
        }

        builder
            .body(mail.body.clone())
            .map_err(|e| MailError::Other(e.to_string()))
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .parse()
        .map_err(|e: lettre::address::AddressError| MailError::InvalidAddress(format!("{address}: {e}")))
}

fn classify(err: lettre::transport::smtp::Error) -> MailError {
    let code = err.status().map(|code| code.to_string());
    if code.as_deref().is_some_and(|c| AUTH_FAILURE_CODES.contains(&c)) {
        MailError::Authentication(err.to_string())
    } else if err.is_permanent() || err.is_transient() {
        MailError::Other(err.to_string())
    } else {
        MailError::Connection(err.to_string())
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    fn is_configured(&self) -> bool {
        self.config.username.is_some() && self.config.password.is_some()
    }

    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        let (Some(username), Some(password)) = (&self.config.username, &self.config.password) else {
            return Err(MailError::NotConfigured);
        };

        let message = self.build_message(mail, username)?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)
            .map_err(classify)?
            .port(self.config.port)
            .credentials(Credentials::new(username.clone(), password.clone()))
            .timeout(Some(self.config.timeout))
            .build();

        debug!("Sending mail via {}:{}", self.config.host, self.config.port);
        let response = transport.send(message).await.map_err(classify)?;
        info!("Mail accepted by relay: {:?}", response.code());
        Ok(())
    }
}
