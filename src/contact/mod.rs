pub mod mailer;

use log::{debug, error, info, warn};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use validator::{Validate, ValidationError};

pub use mailer::{MailConfig, MailError, Mailer, OutgoingMail, SmtpMailer};

const DEFAULT_SUBJECT: &str = "General Inquiry";

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ContactForm {
    #[serde(default)]
    #[validate(custom(function = "validate_name"))]
    pub name: String,
    #[serde(default)]
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

/// Letters, spaces and hyphens only; at least one letter.
fn validate_name(name: &str) -> Result<(), ValidationError> {
    let allowed = name.chars().all(|c| c.is_alphabetic() || c == ' ' || c == '-');
    if name.chars().any(char::is_alphabetic) && allowed {
        Ok(())
    } else {
        Err(ValidationError::new("name"))
    }
}

impl ContactForm {
    fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_string();
        self.subject = self.subject.trim().to_string();
        if self.subject.is_empty() {
            self.subject = DEFAULT_SUBJECT.to_string();
        }
        self
    }

    fn has_header_injection(&self) -> bool {
        [&self.name, &self.email, &self.subject]
            .iter()
            .any(|field| field.contains(|c: char| c == '\r' || c == '\n'))
    }

    fn to_mail(&self) -> OutgoingMail {
        OutgoingMail {
            subject: format!("Contact Form: {}", self.subject),
            body: format!(
                "Name: {}\nEmail: {}\nPhone: {}\nSubject: {}\nMessage: {}",
                self.name, self.email, self.phone, self.subject, self.message
            ),
            reply_to: Some(self.email.clone()),
        }
    }
}

/// Why a submission did not go out. The display text is shown to visitors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContactError {
    #[error("Please enter a valid name (letters, spaces and hyphens) and email address.")]
    InvalidInput,
    #[error("Invalid characters detected in your submission.")]
    HeaderInjection,
    #[error("Email service is not configured. Please try again later.")]
    NotConfigured,
    #[error("Email authentication failed. Please try again later.")]
    Authentication,
    #[error("Could not connect to the email server. Please try again later.")]
    Connection,
    #[error("Sorry, there was an error sending your message. Please try again later.")]
    Unknown,
}

impl ContactError {
    /// Stable machine-readable reason.
    pub fn reason(&self) -> &'static str {
        match self {
            ContactError::InvalidInput => "invalid-input",
            ContactError::HeaderInjection => "header-injection-rejected",
            ContactError::NotConfigured => "not-configured",
            ContactError::Authentication => "authentication-failed",
            ContactError::Connection => "connection-failed",
            ContactError::Unknown => "unknown",
        }
    }
}

impl From<MailError> for ContactError {
    fn from(err: MailError) -> Self {
        match err {
            MailError::NotConfigured => ContactError::NotConfigured,
            MailError::InvalidAddress(_) => ContactError::InvalidInput,
            MailError::Authentication(_) => ContactError::Authentication,
            MailError::Connection(_) => ContactError::Connection,
            MailError::Other(_) => ContactError::Unknown,
        }
    }
}

pub struct ContactNotifier {
    mailer: Arc<dyn Mailer>,
}

impl ContactNotifier {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }

    pub fn is_configured(&self) -> bool {
        self.mailer.is_configured()
    }

    pub async fn submit(&self, form: ContactForm) -> Result<(), ContactError> {
        // Checked on the raw fields; trimming would hide trailing CR/LF.
        if form.has_header_injection() {
            warn!("Rejected contact form with line breaks in header fields");
            return Err(ContactError::HeaderInjection);
        }

        let form = form.normalized();
        if let Err(errors) = form.validate() {
            warn!("Rejected contact form: {}", errors);
            return Err(ContactError::InvalidInput);
        }

        match self.mailer.send(&form.to_mail()).await {
            Ok(()) => {
                info!("Contact form forwarded ({} chars)", form.message.chars().count());
                debug!("Contact form sender: {}", form.email);
                Ok(())
            }
            Err(e) => {
                error!("Error sending contact email: {}", e);
                Err(e.into())
            }
        }
    }
}
