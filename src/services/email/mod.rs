// Email Service Module
// Main orchestration module that coordinates builders and sender

pub mod builders;
pub mod sender;
pub mod types;

use self::types::EmailBuilder;
use crate::app_config::{AcademyConfig, EmailConfig};
use crate::utils::formatting::{format_date, format_money};
use builders::{
    BuildContext, NotificationEmailBuilder, PaymentReceiptEmailBuilder, PlanExpiredEmailBuilder,
    PlanExpiringEmailBuilder, Recipient,
};
use chrono::{DateTime, NaiveDate, Utc};
use handlebars::Handlebars;
use sender::EmailSender;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

pub use types::{EmailError, EmailMessage};

/// Payment details rendered into the receipt
#[derive(Debug, Clone)]
pub struct ReceiptDetails<'a> {
    pub payment_id: Uuid,
    pub plan_name: &'a str,
    pub amount_cents: i64,
    pub method_label: &'a str,
    pub paid_at: DateTime<Utc>,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
}

/// Email service for the messages the academy sends to students
#[derive(Clone)]
pub struct EmailService {
    sender: EmailSender,
    config: EmailConfig,
    academy_name: String,
    currency_symbol: String,
    templates: Arc<Handlebars<'static>>,
}

impl EmailService {
    pub fn new(config: EmailConfig, academy: &AcademyConfig) -> Result<Self, EmailError> {
        let sender = EmailSender::from_config(&config)?;
        Self::with_sender(config, academy, sender)
    }

    /// Service over an explicit sender
    pub fn with_sender(
        config: EmailConfig,
        academy: &AcademyConfig,
        sender: EmailSender,
    ) -> Result<Self, EmailError> {
        let mut templates = Handlebars::new();
        templates.set_strict_mode(true);
        Self::register_templates(&mut templates)?;

        info!("Email service initialized with provider {}", sender.provider_name());

        Ok(Self {
            sender,
            config,
            academy_name: academy.name.clone(),
            currency_symbol: academy.currency_symbol.clone(),
            templates: Arc::new(templates),
        })
    }

    fn register_templates(templates: &mut Handlebars) -> Result<(), EmailError> {
        let sources = [
            ("notification", include_str!("../../../templates/email/notification.html")),
            ("plan_expiring", include_str!("../../../templates/email/plan_expiring.html")),
            ("plan_expired", include_str!("../../../templates/email/plan_expired.html")),
            ("payment_receipt", include_str!("../../../templates/email/payment_receipt.html")),
        ];
        for (name, source) in sources {
            templates
                .register_template_string(name, source)
                .map_err(|e| EmailError::TemplateError(e.to_string()))?;
        }
        Ok(())
    }

    fn context(&self) -> BuildContext<'_> {
        BuildContext {
            config: &self.config,
            academy_name: &self.academy_name,
            templates: &self.templates,
        }
    }

    async fn deliver(&self, message: EmailMessage) -> Result<(), EmailError> {
        self.sender.send_with_retry(message).await
    }

    #[instrument(skip(self, message))]
    pub async fn send_notification(
        &self,
        to_email: &str,
        student_name: &str,
        title: &str,
        message: &str,
    ) -> Result<(), EmailError> {
        let message = NotificationEmailBuilder {
            ctx: self.context(),
            to: Recipient {
                email: to_email,
                name: student_name,
            },
            title,
            message,
        }
        .build()?;
        self.deliver(message).await
    }

    #[instrument(skip(self))]
    pub async fn send_plan_expiring(
        &self,
        to_email: &str,
        student_name: &str,
        plan_name: &str,
        expires_at: NaiveDate,
        days_left: i64,
    ) -> Result<(), EmailError> {
        let message = PlanExpiringEmailBuilder {
            ctx: self.context(),
            to: Recipient {
                email: to_email,
                name: student_name,
            },
            plan_name,
            expires_at: format_date(expires_at),
            days_left,
        }
        .build()?;
        self.deliver(message).await
    }

    #[instrument(skip(self))]
    pub async fn send_plan_expired(
        &self,
        to_email: &str,
        student_name: &str,
        plan_name: &str,
        expired_at: NaiveDate,
    ) -> Result<(), EmailError> {
        let message = PlanExpiredEmailBuilder {
            ctx: self.context(),
            to: Recipient {
                email: to_email,
                name: student_name,
            },
            plan_name,
            expired_at: format_date(expired_at),
        }
        .build()?;
        self.deliver(message).await
    }

    #[instrument(skip(self, receipt), fields(payment_id = %receipt.payment_id))]
    pub async fn send_payment_receipt(
        &self,
        to_email: &str,
        student_name: &str,
        receipt: &ReceiptDetails<'_>,
    ) -> Result<(), EmailError> {
        let message = PaymentReceiptEmailBuilder {
            ctx: self.context(),
            to: Recipient {
                email: to_email,
                name: student_name,
            },
            plan_name: receipt.plan_name,
            amount: format_money(receipt.amount_cents, &self.currency_symbol),
            method: receipt.method_label,
            paid_at: format_date(receipt.paid_at.date_naive()),
            period_start: format_date(receipt.period_start),
            period_end: format_date(receipt.period_end),
            receipt_id: receipt.payment_id.to_string(),
        }
        .build()?;
        self.deliver(message).await
    }

    /// Renders without sending
    pub fn preview_notification(
        &self,
        to_email: &str,
        student_name: &str,
        title: &str,
        message: &str,
    ) -> Result<EmailMessage, EmailError> {
        NotificationEmailBuilder {
            ctx: self.context(),
            to: Recipient {
                email: to_email,
                name: student_name,
            },
            title,
            message,
        }
        .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_config::EmailProvider;

    fn test_email_config() -> EmailConfig {
        EmailConfig {
            provider: EmailProvider::Disabled,
            smtp_host: "localhost".to_string(),
            smtp_port: 1025,
            smtp_username: None,
            smtp_password: None,
            smtp_starttls: false,
            resend_api_key: String::new(),
            resend_api_url: "https://api.resend.com/emails".to_string(),
            from_email: "noreply@academia.com".to_string(),
            from_name: "Academia Teste".to_string(),
            support_email: "contato@academia.com".to_string(),
            max_retries: 1,
        }
    }

    fn test_academy() -> AcademyConfig {
        AcademyConfig {
            name: "Academia Teste".to_string(),
            legal_document: "12.345.678/0001-90".to_string(),
            address: "Rua A, 1".to_string(),
            currency_symbol: "R$".to_string(),
            enrollment_term_template_path: None,
        }
    }

    #[test]
    fn test_templates_render() {
        let service = EmailService::new(test_email_config(), &test_academy()).unwrap();
        let message = service
            .preview_notification("ana@example.com", "Ana", "Feriado", "Fechado <segunda>")
            .unwrap();

        assert_eq!(message.to, vec!["ana@example.com"]);
        assert_eq!(message.from, "Academia Teste <noreply@academia.com>");
        assert!(message.html.contains("Ana"));
        // HTML escaping applies to user text
        assert!(message.html.contains("Fechado &lt;segunda&gt;"));
        assert!(message.text.unwrap().contains("Fechado <segunda>"));
    }

    #[tokio::test]
    async fn test_receipt_with_disabled_provider() {
        let service = EmailService::new(test_email_config(), &test_academy()).unwrap();
        let receipt = ReceiptDetails {
            payment_id: Uuid::new_v4(),
            plan_name: "Mensal",
            amount_cents: 12990,
            method_label: "PIX",
            paid_at: Utc::now(),
            period_start: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        };
        assert!(service
            .send_payment_receipt("ana@example.com", "Ana", &receipt)
            .await
            .is_ok());
        assert!(service
            .send_plan_expiring(
                "ana@example.com",
                "Ana",
                "Mensal",
                NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
                3
            )
            .await
            .is_ok());
    }
}
