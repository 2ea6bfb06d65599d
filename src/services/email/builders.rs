// Email Builders - one builder per message the academy sends
// Each builder renders its Handlebars template plus a plain-text body

use super::types::{
    AcademyFooter, EmailBuilder, EmailError, EmailMessage, NotificationEmailData,
    PaymentReceiptEmailData, PlanExpiredEmailData, PlanExpiringEmailData,
};
use crate::app_config::EmailConfig;
use handlebars::Handlebars;
use serde::Serialize;
use tracing::instrument;

/// Recipient of an outgoing email
#[derive(Debug, Clone)]
pub struct Recipient<'a> {
    pub email: &'a str,
    pub name: &'a str,
}

/// Shared pieces every builder needs
pub struct BuildContext<'a> {
    pub config: &'a EmailConfig,
    pub academy_name: &'a str,
    pub templates: &'a Handlebars<'a>,
}

impl<'a> BuildContext<'a> {
    fn footer(&self) -> AcademyFooter {
        AcademyFooter {
            academy_name: self.academy_name.to_string(),
            support_email: self.config.support_email.clone(),
        }
    }

    fn render<T: Serialize>(&self, template: &str, data: &T) -> Result<String, EmailError> {
        self.templates
            .render(template, data)
            .map_err(|e| EmailError::TemplateError(e.to_string()))
    }

    fn message(&self, to: &Recipient<'_>, subject: String, html: String, text: String) -> EmailMessage {
        EmailMessage::new(
            format!("{} <{}>", self.config.from_name, self.config.from_email),
            vec![to.email.to_string()],
            subject,
            html,
        )
        .with_text(text)
        .with_reply_to(self.config.support_email.clone())
    }
}

/// Free-form notice written by staff
pub struct NotificationEmailBuilder<'a> {
    pub ctx: BuildContext<'a>,
    pub to: Recipient<'a>,
    pub title: &'a str,
    pub message: &'a str,
}

impl<'a> EmailBuilder for NotificationEmailBuilder<'a> {
    #[instrument(skip(self), fields(to = %self.to.email))]
    fn build(&self) -> Result<EmailMessage, EmailError> {
        let data = NotificationEmailData {
            student_name: self.to.name.to_string(),
            title: self.title.to_string(),
            message: self.message.to_string(),
            footer: self.ctx.footer(),
        };
        let html = self.ctx.render("notification", &data)?;

        let text = format!(
            "Olá, {},\n\n{}\n\n{}\n\nAtenciosamente,\n{}",
            self.to.name, self.title, self.message, self.ctx.academy_name
        );

        Ok(self.ctx.message(
            &self.to,
            format!("{} - {}", self.title, self.ctx.academy_name),
            html,
            text,
        ))
    }
}

/// Reminder sent a few days before the plan ends
pub struct PlanExpiringEmailBuilder<'a> {
    pub ctx: BuildContext<'a>,
    pub to: Recipient<'a>,
    pub plan_name: &'a str,
    pub expires_at: String,
    pub days_left: i64,
}

impl<'a> EmailBuilder for PlanExpiringEmailBuilder<'a> {
    #[instrument(skip(self), fields(to = %self.to.email))]
    fn build(&self) -> Result<EmailMessage, EmailError> {
        let data = PlanExpiringEmailData {
            student_name: self.to.name.to_string(),
            plan_name: self.plan_name.to_string(),
            expires_at: self.expires_at.clone(),
            days_left: self.days_left,
            footer: self.ctx.footer(),
        };
        let html = self.ctx.render("plan_expiring", &data)?;

        let text = format!(
            "Olá, {},\n\n\
            Seu plano {} vence em {} ({} dia(s)).\n\
            Procure a recepção para renovar e continuar treinando.\n\n\
            Atenciosamente,\n{}",
            self.to.name, self.plan_name, self.expires_at, self.days_left, self.ctx.academy_name
        );

        Ok(self.ctx.message(
            &self.to,
            format!("Seu plano vence em {}", self.expires_at),
            html,
            text,
        ))
    }
}

/// Notice sent when the plan has ended and the student was deactivated
pub struct PlanExpiredEmailBuilder<'a> {
    pub ctx: BuildContext<'a>,
    pub to: Recipient<'a>,
    pub plan_name: &'a str,
    pub expired_at: String,
}

impl<'a> EmailBuilder for PlanExpiredEmailBuilder<'a> {
    #[instrument(skip(self), fields(to = %self.to.email))]
    fn build(&self) -> Result<EmailMessage, EmailError> {
        let data = PlanExpiredEmailData {
            student_name: self.to.name.to_string(),
            plan_name: self.plan_name.to_string(),
            expired_at: self.expired_at.clone(),
            footer: self.ctx.footer(),
        };
        let html = self.ctx.render("plan_expired", &data)?;

        let text = format!(
            "Olá, {},\n\n\
            Seu plano {} venceu em {} e sua matrícula foi inativada.\n\
            Renove na recepção para voltar a treinar.\n\n\
            Atenciosamente,\n{}",
            self.to.name, self.plan_name, self.expired_at, self.ctx.academy_name
        );

        Ok(self.ctx.message(
            &self.to,
            format!("Seu plano venceu - {}", self.ctx.academy_name),
            html,
            text,
        ))
    }
}

/// Receipt for a recorded payment
pub struct PaymentReceiptEmailBuilder<'a> {
    pub ctx: BuildContext<'a>,
    pub to: Recipient<'a>,
    pub plan_name: &'a str,
    pub amount: String,
    pub method: &'a str,
    pub paid_at: String,
    pub period_start: String,
    pub period_end: String,
    pub receipt_id: String,
}

impl<'a> EmailBuilder for PaymentReceiptEmailBuilder<'a> {
    #[instrument(skip(self), fields(to = %self.to.email))]
    fn build(&self) -> Result<EmailMessage, EmailError> {
        let data = PaymentReceiptEmailData {
            student_name: self.to.name.to_string(),
            plan_name: self.plan_name.to_string(),
            amount: self.amount.clone(),
            method: self.method.to_string(),
            paid_at: self.paid_at.clone(),
            period_start: self.period_start.clone(),
            period_end: self.period_end.clone(),
            receipt_id: self.receipt_id.clone(),
            footer: self.ctx.footer(),
        };
        let html = self.ctx.render("payment_receipt", &data)?;

        let text = format!(
            "Olá, {},\n\n\
            Recebemos seu pagamento de {} ({}) em {}.\n\
            Plano: {}\n\
            Período: {} a {}\n\
            Recibo: {}\n\n\
            Atenciosamente,\n{}",
            self.to.name,
            self.amount,
            self.method,
            self.paid_at,
            self.plan_name,
            self.period_start,
            self.period_end,
            self.receipt_id,
            self.ctx.academy_name
        );

        Ok(self.ctx.message(
            &self.to,
            format!("Recibo de pagamento - {}", self.ctx.academy_name),
            html,
            text,
        ))
    }
}
