// Email Service Types - Shared types and structures for email module

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during email operations
#[derive(Error, Debug)]
pub enum EmailError {
    #[error("Failed to send email: {0}")]
    SendError(String),

    #[error("Template rendering error: {0}")]
    TemplateError(String),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Service unavailable")]
    ServiceUnavailable,

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Generic email message structure that can be sent
#[derive(Debug, Clone, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    pub text: Option<String>,
    pub reply_to: Option<String>,
}

impl EmailMessage {
    pub fn new(from: String, to: Vec<String>, subject: String, html: String) -> Self {
        Self {
            from,
            to,
            subject,
            html,
            text: None,
            reply_to: None,
        }
    }

    pub fn with_text(mut self, text: String) -> Self {
        self.text = Some(text);
        self
    }

    pub fn with_reply_to(mut self, reply_to: String) -> Self {
        self.reply_to = Some(reply_to);
        self
    }
}

/// Trait that all email builders must implement
pub trait EmailBuilder {
    fn build(&self) -> Result<EmailMessage, EmailError>;
}

/// Fields shared by every template
#[derive(Debug, Clone, Serialize)]
pub struct AcademyFooter {
    pub academy_name: String,
    pub support_email: String,
}

/// Data for a free-form notice written by staff
#[derive(Serialize)]
pub struct NotificationEmailData {
    pub student_name: String,
    pub title: String,
    pub message: String,
    #[serde(flatten)]
    pub footer: AcademyFooter,
}

/// Data for the "plan about to expire" reminder
#[derive(Serialize)]
pub struct PlanExpiringEmailData {
    pub student_name: String,
    pub plan_name: String,
    pub expires_at: String,
    pub days_left: i64,
    #[serde(flatten)]
    pub footer: AcademyFooter,
}

/// Data for the "plan expired" notice
#[derive(Serialize)]
pub struct PlanExpiredEmailData {
    pub student_name: String,
    pub plan_name: String,
    pub expired_at: String,
    #[serde(flatten)]
    pub footer: AcademyFooter,
}

/// Data for the payment receipt
#[derive(Serialize)]
pub struct PaymentReceiptEmailData {
    pub student_name: String,
    pub plan_name: String,
    pub amount: String,
    pub method: String,
    pub paid_at: String,
    pub period_start: String,
    pub period_end: String,
    pub receipt_id: String,
    #[serde(flatten)]
    pub footer: AcademyFooter,
}

/// Resend API specific email format. Optional fields are omitted when `None`.
#[derive(Debug, Serialize)]
pub struct ResendEmailPayload {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

impl From<EmailMessage> for ResendEmailPayload {
    fn from(message: EmailMessage) -> Self {
        Self {
            from: message.from,
            to: message.to,
            subject: message.subject,
            html: message.html,
            text: message.text,
            reply_to: message.reply_to,
        }
    }
}
