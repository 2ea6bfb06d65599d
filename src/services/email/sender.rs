// Email Sender - delivery through SMTP or the Resend HTTP API

use super::types::{EmailError, EmailMessage, ResendEmailPayload};
use crate::app_config::{EmailConfig, EmailProvider};
use lettre::message::{header::ContentType, Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

#[derive(Clone)]
enum Transport {
    Smtp(Arc<AsyncSmtpTransport<Tokio1Executor>>),
    Resend {
        client: Arc<Client>,
        api_key: String,
        api_url: String,
    },
    /// Logs and drops messages
    Disabled,
}

/// Email sender that handles delivery to the configured provider
#[derive(Clone)]
pub struct EmailSender {
    transport: Transport,
    max_retries: u32,
    retry_delay: Duration,
}

/// `base * 2^(attempt-1)`, capped at one minute
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let exp = 2_u32
        .checked_pow(attempt.saturating_sub(1))
        .unwrap_or(u32::MAX);
    base.checked_mul(exp)
        .unwrap_or(MAX_RETRY_DELAY)
        .min(MAX_RETRY_DELAY)
}

fn parse_mailbox(address: &str) -> Result<Mailbox, EmailError> {
    address
        .parse::<Mailbox>()
        .map_err(|e| EmailError::InvalidEmail(format!("{}: {}", address, e)))
}

/// Converts the provider-neutral message into a MIME message
pub fn to_mime(message: &EmailMessage) -> Result<Message, EmailError> {
    let mut builder = Message::builder()
        .from(parse_mailbox(&message.from)?)
        .subject(message.subject.clone());
    for to in &message.to {
        builder = builder.to(parse_mailbox(to)?);
    }
    if let Some(reply_to) = &message.reply_to {
        builder = builder.reply_to(parse_mailbox(reply_to)?);
    }

    let built = match &message.text {
        Some(text) => builder.multipart(MultiPart::alternative_plain_html(
            text.clone(),
            message.html.clone(),
        )),
        None => builder
            .header(ContentType::TEXT_HTML)
            .body(message.html.clone()),
    };
    built.map_err(|e| EmailError::SendError(format!("Failed to build message: {}", e)))
}

impl EmailSender {
    /// Sender for the provider selected in config
    pub fn from_config(config: &EmailConfig) -> Result<Self, EmailError> {
        let sender = match config.provider {
            EmailProvider::Smtp => Self::new_smtp(config)?,
            EmailProvider::Resend => {
                Self::new_resend(config.resend_api_key.clone(), config.resend_api_url.clone())
            },
            EmailProvider::Disabled => Self::disabled(),
        };
        Ok(sender.with_max_retries(config.max_retries.max(1)))
    }

    pub fn new_smtp(config: &EmailConfig) -> Result<Self, EmailError> {
        let builder = if config.smtp_starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
                .map_err(|e| EmailError::ConfigError(format!("Invalid SMTP host: {}", e)))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
        };

        let mut builder = builder.port(config.smtp_port);
        if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: Transport::Smtp(Arc::new(builder.build())),
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
        })
    }

    pub fn new_resend(api_key: String, api_url: String) -> Self {
        Self {
            transport: Transport::Resend {
                client: Arc::new(Client::new()),
                api_key,
                api_url,
            },
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
        }
    }

    pub fn disabled() -> Self {
        Self {
            transport: Transport::Disabled,
            max_retries: 1,
            retry_delay: Duration::from_secs(1),
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn provider_name(&self) -> &'static str {
        match self.transport {
            Transport::Smtp(_) => "smtp",
            Transport::Resend { .. } => "resend",
            Transport::Disabled => "disabled",
        }
    }

    /// Send an email message once
    #[instrument(skip(self, message), fields(to = ?message.to, subject = %message.subject))]
    pub async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        match &self.transport {
            Transport::Smtp(transport) => {
                let mime = to_mime(&message)?;
                transport.send(mime).await.map_err(|e| {
                    error!("SMTP delivery failed: {}", e);
                    if e.is_transient() {
                        EmailError::ServiceUnavailable
                    } else {
                        EmailError::SendError(format!("SMTP error: {}", e))
                    }
                })?;
                info!("Email sent via SMTP");
                Ok(())
            },
            Transport::Resend {
                client,
                api_key,
                api_url,
            } => Self::send_resend(client, api_key, api_url, message).await,
            Transport::Disabled => {
                info!("Email delivery disabled, dropping message");
                Ok(())
            },
        }
    }

    async fn send_resend(
        client: &Client,
        api_key: &str,
        api_url: &str,
        message: EmailMessage,
    ) -> Result<(), EmailError> {
        let payload: ResendEmailPayload = message.into();

        let response = client
            .post(api_url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await;

        match response {
            Ok(res) if res.status().is_success() => {
                info!("Email sent via Resend");
                Ok(())
            },
            Ok(res) => {
                let status = res.status();
                let error_text = res
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());

                error!(
                    "Failed to send email. Status: {}, Error: {}",
                    status, error_text
                );

                if status.as_u16() == 429 {
                    Err(EmailError::RateLimitExceeded)
                } else if status.is_server_error() {
                    Err(EmailError::ServiceUnavailable)
                } else {
                    Err(EmailError::SendError(format!(
                        "Email send failed with status {}: {}",
                        status, error_text
                    )))
                }
            },
            Err(e) => {
                error!("Network error while sending email: {:?}", e);
                Err(EmailError::SendError(format!("Network error: {}", e)))
            },
        }
    }

    /// Send with exponential backoff and jitter between attempts
    #[instrument(skip(self, message), fields(to = ?message.to, subject = %message.subject))]
    pub async fn send_with_retry(&self, message: EmailMessage) -> Result<(), EmailError> {
        let mut last_error = None;

        for attempt in 1..=self.max_retries {
            match self.send(message.clone()).await {
                Ok(()) => return Ok(()),
                Err(EmailError::RateLimitExceeded) => {
                    warn!("Rate limit hit, not retrying");
                    return Err(EmailError::RateLimitExceeded);
                },
                Err(e @ EmailError::InvalidEmail(_)) => return Err(e),
                Err(e) => {
                    warn!("Email send attempt {} failed: {:?}", attempt, e);
                    last_error = Some(e);

                    if attempt < self.max_retries {
                        let base_delay = backoff_delay(self.retry_delay, attempt);
                        let mut rng = StdRng::from_entropy();
                        let jitter_millis =
                            rng.gen_range(0..=(base_delay.as_millis() / 4) as u64);
                        let delay = base_delay + Duration::from_millis(jitter_millis);

                        info!("Retrying in {:?} (with jitter)", delay);
                        tokio::time::sleep(delay).await;
                    }
                },
            }
        }

        Err(last_error.unwrap_or_else(|| {
            EmailError::SendError("Failed after maximum retry attempts".to_string())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> EmailMessage {
        EmailMessage::new(
            "Academia <noreply@academia.com>".to_string(),
            vec!["aluno@example.com".to_string()],
            "Aviso".to_string(),
            "<p>Olá</p>".to_string(),
        )
    }

    #[test]
    fn test_resend_payload_conversion() {
        let payload: ResendEmailPayload = message().into();
        assert_eq!(payload.to, vec!["aluno@example.com"]);
        assert!(payload.text.is_none());
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("reply_to").is_none());
    }

    #[test]
    fn test_backoff_delay() {
        let base = Duration::from_secs(2);
        assert_eq!(backoff_delay(base, 1), Duration::from_secs(2));
        assert_eq!(backoff_delay(base, 2), Duration::from_secs(4));
        assert_eq!(backoff_delay(base, 3), Duration::from_secs(8));
        assert_eq!(backoff_delay(base, 50), MAX_RETRY_DELAY);
        assert_eq!(
            backoff_delay(Duration::from_secs(u32::MAX as u64), 2),
            MAX_RETRY_DELAY
        );
    }

    #[test]
    fn test_mime_conversion() {
        let mime = to_mime(&message().with_text("Olá".to_string())).unwrap();
        let raw = String::from_utf8(mime.formatted()).unwrap();
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("To: aluno@example.com"));
    }

    #[test]
    fn test_invalid_recipient() {
        let mut bad = message();
        bad.to = vec!["not an address".to_string()];
        assert!(matches!(to_mime(&bad), Err(EmailError::InvalidEmail(_))));
    }

    #[tokio::test]
    async fn test_disabled_sender_accepts_messages() {
        let sender = EmailSender::disabled();
        assert_eq!(sender.provider_name(), "disabled");
        assert!(sender.send_with_retry(message()).await.is_ok());
    }
}
