// Notification delivery: manual notices, payment receipts and the plan expiry sweep

use chrono::{Duration, NaiveDate};
use diesel_async::AsyncPgConnection;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DieselPool;
use crate::models::notification::{
    CreateNotificationRequest, NewNotification, Notification, NotificationChannel,
    NotificationKind, SweepReport,
};
use crate::models::payment::{Payment, PaymentMethod};
use crate::models::plan::Plan;
use crate::models::student::{Student, StudentStatus};
use crate::services::email::{EmailError, EmailService, ReceiptDetails};
use crate::utils::formatting::{format_date, format_money};
use crate::utils::ApiError;

/// Rows created by a manual notification request
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NotificationBatch {
    pub notifications: Vec<Notification>,
    pub sent: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct NotificationService {
    pool: DieselPool,
    email: Arc<EmailService>,
    days_before_expiry: u32,
    currency_symbol: String,
}

impl NotificationService {
    pub fn new(
        pool: DieselPool,
        email: Arc<EmailService>,
        days_before_expiry: u32,
        currency_symbol: String,
    ) -> Self {
        Self {
            pool,
            email,
            days_before_expiry,
            currency_symbol,
        }
    }

    /// Persists the delivery outcome of a pending row
    async fn record_outcome(
        conn: &mut AsyncPgConnection,
        notification: &Notification,
        outcome: &Result<(), EmailError>,
    ) -> Result<Notification, ApiError> {
        let updated = match outcome {
            Ok(()) => Notification::mark_sent(conn, notification.id).await?,
            Err(e) => {
                warn!(notification_id = %notification.id, "Notification delivery failed: {}", e);
                Notification::mark_failed(conn, notification.id, &e.to_string()).await?
            },
        };
        Ok(updated)
    }

    /// Creates one row per recipient; email rows are delivered right away
    #[instrument(skip(self, request), fields(broadcast = request.student_id.is_none()))]
    pub async fn create_manual(
        &self,
        request: CreateNotificationRequest,
        created_by: Uuid,
    ) -> Result<NotificationBatch, ApiError> {
        let mut conn = self.pool.get().await?;
        let title = request.title.trim().to_string();
        let message = request.message.trim().to_string();

        let recipients: Vec<(Uuid, String, String)> = match request.student_id {
            Some(student_id) => {
                let student = Student::find_by_id(&mut conn, student_id)
                    .await?
                    .ok_or(ApiError::NotFound("Student"))?;
                vec![(student.id, student.full_name, student.email)]
            },
            None => Student::active_ids(&mut conn).await?,
        };
        let single = request.student_id.is_some();

        let rows = recipients
            .iter()
            .map(|(student_id, _, _)| NewNotification {
                created_by: Some(created_by),
                ..NewNotification::pending(
                    *student_id,
                    NotificationKind::Manual,
                    request.channel,
                    title.clone(),
                    message.clone(),
                )
            })
            .collect();
        let created = Notification::insert_many(&mut conn, rows).await?;

        let contacts: HashMap<Uuid, (String, String)> = recipients
            .into_iter()
            .map(|(id, name, email)| (id, (name, email)))
            .collect();

        let mut batch = NotificationBatch {
            notifications: Vec::with_capacity(created.len()),
            sent: 0,
            failed: 0,
        };
        let mut last_error = None;

        for notification in created {
            let outcome = match (request.channel, notification.student_id.and_then(|id| contacts.get(&id))) {
                (NotificationChannel::Email, Some((name, email))) => {
                    self.email
                        .send_notification(email, name, &title, &message)
                        .await
                },
                _ => Ok(()),
            };
            let updated = Self::record_outcome(&mut conn, &notification, &outcome).await?;
            match outcome {
                Ok(()) => batch.sent += 1,
                Err(e) => {
                    batch.failed += 1;
                    last_error = Some(e);
                },
            }
            batch.notifications.push(updated);
        }

        info!(sent = batch.sent, failed = batch.failed, "Manual notification processed");

        match last_error {
            Some(e) if single => Err(e.into()),
            _ => Ok(batch),
        }
    }

    /// Retries delivery of a failed email notification
    #[instrument(skip(self))]
    pub async fn resend(&self, notification_id: Uuid) -> Result<Notification, ApiError> {
        let mut conn = self.pool.get().await?;
        let notification = Notification::find_by_id(&mut conn, notification_id)
            .await?
            .ok_or(ApiError::NotFound("Notification"))?;

        if !notification.is_failed() {
            return Err(ApiError::Conflict(
                "Only failed notifications can be resent".to_string(),
            ));
        }
        let student_id = notification.student_id.ok_or_else(|| {
            ApiError::Conflict("Notification has no recipient".to_string())
        })?;
        let student = Student::find_by_id(&mut conn, student_id)
            .await?
            .ok_or(ApiError::NotFound("Student"))?;

        let outcome = if notification.is_email() {
            self.email
                .send_notification(
                    &student.email,
                    &student.full_name,
                    &notification.title,
                    &notification.message,
                )
                .await
        } else {
            Ok(())
        };

        let updated = Self::record_outcome(&mut conn, &notification, &outcome).await?;
        outcome?;
        Ok(updated)
    }

    /// Best-effort receipt after a payment commits; failures are recorded, never returned
    #[instrument(skip_all, fields(payment_id = %payment.id))]
    pub async fn send_payment_receipt(&self, student: &Student, plan: &Plan, payment: &Payment) {
        if let Err(e) = self.try_send_payment_receipt(student, plan, payment).await {
            error!("Could not record payment receipt: {}", e);
        }
    }

    async fn try_send_payment_receipt(
        &self,
        student: &Student,
        plan: &Plan,
        payment: &Payment,
    ) -> Result<(), ApiError> {
        let mut conn = self.pool.get().await?;
        let amount = format_money(i64::from(payment.amount_cents), &self.currency_symbol);
        let row = NewNotification {
            reference_date: Some(payment.period_end),
            ..NewNotification::pending(
                student.id,
                NotificationKind::PaymentReceipt,
                NotificationChannel::Email,
                "Recibo de pagamento".to_string(),
                format!(
                    "Pagamento de {} referente ao plano {} ({} a {}).",
                    amount,
                    plan.name,
                    format_date(payment.period_start),
                    format_date(payment.period_end)
                ),
            )
        };
        let notification = Notification::insert(&mut conn, row).await?;

        let method_label = payment
            .method
            .parse::<PaymentMethod>()
            .map(|m| m.label())
            .unwrap_or("-");
        let receipt = ReceiptDetails {
            payment_id: payment.id,
            plan_name: &plan.name,
            amount_cents: i64::from(payment.amount_cents),
            method_label,
            paid_at: payment.paid_at,
            period_start: payment.period_start,
            period_end: payment.period_end,
        };
        let outcome = self
            .email
            .send_payment_receipt(&student.email, &student.full_name, &receipt)
            .await;
        Self::record_outcome(&mut conn, &notification, &outcome).await?;
        Ok(())
    }

    async fn plan_name(
        conn: &mut AsyncPgConnection,
        cache: &mut HashMap<Uuid, String>,
        plan_id: Option<Uuid>,
    ) -> Result<String, ApiError> {
        let Some(plan_id) = plan_id else {
            return Ok("-".to_string());
        };
        if let Some(name) = cache.get(&plan_id) {
            return Ok(name.clone());
        }
        let name = Plan::find_by_id(conn, plan_id)
            .await?
            .map(|p| p.name)
            .unwrap_or_else(|| "-".to_string());
        cache.insert(plan_id, name.clone());
        Ok(name)
    }

    /// Returns the undelivered row for this notice, or inserts a pending one
    async fn automated_row(
        conn: &mut AsyncPgConnection,
        student_id: Uuid,
        kind: NotificationKind,
        reference_date: NaiveDate,
        title: String,
        message: String,
    ) -> Result<Notification, ApiError> {
        if let Some(existing) = Notification::find_unsent(conn, student_id, kind, reference_date).await? {
            return Ok(existing);
        }
        let row = Notification::insert(
            conn,
            NewNotification {
                reference_date: Some(reference_date),
                ..NewNotification::pending(student_id, kind, NotificationChannel::Email, title, message)
            },
        )
        .await?;
        Ok(row)
    }

    /// Daily expiry sweep
    ///
    /// 1. Active students whose plan ends within the warning window get one
    ///    `plan_expiring` email per expiry date.
    /// 2. Active students whose plan ended before `today` are set inactive.
    /// 3. Each expired plan gets one `plan_expired` email per expiry date.
    ///    Undelivered notices from earlier sweeps are retried even though the
    ///    student is already inactive, as long as the expiry date still holds.
    #[instrument(skip(self))]
    pub async fn run_expiry_sweep(&self, today: NaiveDate) -> Result<SweepReport, ApiError> {
        let mut conn = self.pool.get().await?;
        let mut plans = HashMap::new();
        let mut report = SweepReport {
            expiring_notified: 0,
            expired_deactivated: 0,
            expired_notified: 0,
            failed: 0,
        };

        let window_end = today + Duration::days(i64::from(self.days_before_expiry));
        for student in Student::expiring_between(&mut conn, today, window_end).await? {
            let Some(expires) = student.plan_expires_at else {
                continue;
            };
            if Notification::already_sent(&mut conn, student.id, NotificationKind::PlanExpiring, expires)
                .await?
            {
                continue;
            }

            let plan_name = Self::plan_name(&mut conn, &mut plans, student.plan_id).await?;
            let days_left = (expires - today).num_days();
            let notification = Self::automated_row(
                &mut conn,
                student.id,
                NotificationKind::PlanExpiring,
                expires,
                format!("Seu plano vence em {}", format_date(expires)),
                format!(
                    "O plano {} vence em {} ({} dia(s)).",
                    plan_name,
                    format_date(expires),
                    days_left
                ),
            )
            .await?;

            let outcome = self
                .email
                .send_plan_expiring(&student.email, &student.full_name, &plan_name, expires, days_left)
                .await;
            match &outcome {
                Ok(()) => report.expiring_notified += 1,
                Err(_) => report.failed += 1,
            }
            Self::record_outcome(&mut conn, &notification, &outcome).await?;
        }

        let mut due: Vec<(Student, NaiveDate)> = Vec::new();
        for student in Student::expired_before(&mut conn, today).await? {
            let Some(expired) = student.plan_expires_at else {
                continue;
            };
            Student::set_status(&mut conn, student.id, StudentStatus::Inactive).await?;
            report.expired_deactivated += 1;
            due.push((student, expired));
        }

        for pending in Notification::unsent_of_kind(&mut conn, NotificationKind::PlanExpired).await? {
            let (Some(student_id), Some(expired)) = (pending.student_id, pending.reference_date) else {
                continue;
            };
            if expired >= today || due.iter().any(|(s, _)| s.id == student_id) {
                continue;
            }
            let Some(student) = Student::find_by_id(&mut conn, student_id).await? else {
                continue;
            };
            // Renewed since the notice was queued
            if student.plan_expires_at != Some(expired) {
                continue;
            }
            due.push((student, expired));
        }

        for (student, expired) in due {
            if Notification::already_sent(&mut conn, student.id, NotificationKind::PlanExpired, expired)
                .await?
            {
                continue;
            }

            let plan_name = Self::plan_name(&mut conn, &mut plans, student.plan_id).await?;
            let notification = Self::automated_row(
                &mut conn,
                student.id,
                NotificationKind::PlanExpired,
                expired,
                "Seu plano venceu".to_string(),
                format!(
                    "O plano {} venceu em {} e a matrícula foi inativada.",
                    plan_name,
                    format_date(expired)
                ),
            )
            .await?;

            let outcome = self
                .email
                .send_plan_expired(&student.email, &student.full_name, &plan_name, expired)
                .await;
            match &outcome {
                Ok(()) => report.expired_notified += 1,
                Err(_) => report.failed += 1,
            }
            Self::record_outcome(&mut conn, &notification, &outcome).await?;
        }

        info!(
            expiring_notified = report.expiring_notified,
            expired_deactivated = report.expired_deactivated,
            expired_notified = report.expired_notified,
            failed = report.failed,
            "Expiry sweep finished"
        );
        Ok(report)
    }
}
