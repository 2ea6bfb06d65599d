// Payment transaction flow
// Recording a payment and renewing the student's plan happen atomically

use chrono::{DateTime, Duration, NaiveDate, Utc};
use diesel_async::scoped_futures::ScopedFutureExt;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::{self, DieselPool};
use crate::models::payment::{
    CancelPaymentRequest, CreatePaymentRequest, NewPayment, Payment, PaymentStatus,
};
use crate::models::plan::Plan;
use crate::models::student::{Student, StudentStatus, StudentUpdate};
use crate::utils::ApiError;

/// Result of a recorded payment, with the rows the receipt needs
#[derive(Debug, Clone)]
pub struct RecordedPayment {
    pub payment: Payment,
    pub student: Student,
    pub plan: Plan,
}

/// First day of the new period: today, or the day after the current expiry if that is later
pub fn next_period_start(today: NaiveDate, current_expiry: Option<NaiveDate>) -> NaiveDate {
    match current_expiry.and_then(|d| d.checked_add_signed(Duration::days(1))) {
        Some(after_expiry) if after_expiry > today => after_expiry,
        _ => today,
    }
}

fn append_note(existing: Option<&str>, note: &str) -> String {
    match existing.map(str::trim).filter(|n| !n.is_empty()) {
        Some(existing) => format!("{}\n{}", existing, note),
        None => note.to_string(),
    }
}

pub struct PaymentService;

impl PaymentService {
    /// Inserts the payment and moves the student onto the paid period
    #[instrument(skip(pool, request), fields(student_id = %request.student_id, plan_id = %request.plan_id))]
    pub async fn record(
        pool: &DieselPool,
        request: CreatePaymentRequest,
        recorded_by: Uuid,
    ) -> Result<RecordedPayment, ApiError> {
        let recorded = db::transaction(pool, |conn| {
            async move {
                let student = Student::find_by_id(conn, request.student_id)
                    .await?
                    .ok_or(ApiError::NotFound("Student"))?;
                let plan = Plan::find_by_id(conn, request.plan_id)
                    .await?
                    .ok_or(ApiError::NotFound("Plan"))?;
                if !plan.is_active {
                    return Err(ApiError::field("plan_id", "Plan is not active"));
                }

                let paid_at: DateTime<Utc> = request.paid_at.unwrap_or_else(Utc::now);
                let today = Utc::now().date_naive();
                let period_start = request
                    .period_start
                    .unwrap_or_else(|| next_period_start(today, student.plan_expires_at));
                let period_end = plan
                    .period_end(period_start)
                    .ok_or_else(|| ApiError::field("period_start", "Period is out of range"))?;

                let payment = Payment::create(
                    conn,
                    NewPayment {
                        student_id: student.id,
                        plan_id: plan.id,
                        amount_cents: request.amount_cents.unwrap_or(plan.price_cents),
                        method: request.method.as_str().to_string(),
                        status: PaymentStatus::Completed.as_str().to_string(),
                        paid_at,
                        period_start,
                        period_end,
                        recorded_by: Some(recorded_by),
                        notes: request
                            .notes
                            .as_deref()
                            .map(str::trim)
                            .filter(|n| !n.is_empty())
                            .map(String::from),
                    },
                )
                .await?;

                let student = Student::update(
                    conn,
                    student.id,
                    StudentUpdate {
                        plan_id: Some(Some(plan.id)),
                        plan_expires_at: Some(Some(period_end)),
                        status: Some(StudentStatus::Active.as_str().to_string()),
                        ..Default::default()
                    },
                )
                .await?
                .ok_or(ApiError::NotFound("Student"))?;

                Ok::<_, ApiError>(RecordedPayment {
                    payment,
                    student,
                    plan,
                })
            }
            .scope_boxed()
        })
        .await?;

        info!(
            payment_id = %recorded.payment.id,
            period_end = %recorded.payment.period_end,
            "Payment recorded"
        );
        Ok(recorded)
    }

    /// Cancels a completed payment and rolls the expiry back to the latest remaining period
    #[instrument(skip(pool, request))]
    pub async fn cancel(
        pool: &DieselPool,
        payment_id: Uuid,
        request: CancelPaymentRequest,
    ) -> Result<Payment, ApiError> {
        let cancelled = db::transaction(pool, |conn| {
            async move {
                let payment = Payment::find_for_update(conn, payment_id)
                    .await?
                    .ok_or(ApiError::NotFound("Payment"))?;
                if !payment.is_completed() {
                    return Err(ApiError::Conflict(
                        "Payment is already cancelled".to_string(),
                    ));
                }

                let reason = request
                    .reason
                    .as_deref()
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .unwrap_or("sem motivo informado");
                let notes = append_note(
                    payment.notes.as_deref(),
                    &format!("Cancelado: {}", reason),
                );
                let cancelled = Payment::mark_cancelled(conn, payment.id, Some(notes)).await?;

                let remaining = Payment::latest_completed_for_student(conn, payment.student_id).await?;
                Student::update(
                    conn,
                    payment.student_id,
                    StudentUpdate {
                        plan_expires_at: Some(remaining.as_ref().map(|p| p.period_end)),
                        plan_id: Some(remaining.as_ref().map(|p| p.plan_id)),
                        ..Default::default()
                    },
                )
                .await?;

                Ok::<_, ApiError>(cancelled)
            }
            .scope_boxed()
        })
        .await?;

        info!(payment_id = %cancelled.id, "Payment cancelled");
        Ok(cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_period_start_without_plan() {
        assert_eq!(next_period_start(date(2024, 3, 10), None), date(2024, 3, 10));
    }

    #[test]
    fn test_period_start_early_renewal_extends() {
        assert_eq!(
            next_period_start(date(2024, 3, 10), Some(date(2024, 3, 20))),
            date(2024, 3, 21)
        );
    }

    #[test]
    fn test_period_start_after_lapse_starts_today() {
        assert_eq!(
            next_period_start(date(2024, 3, 10), Some(date(2024, 2, 1))),
            date(2024, 3, 10)
        );
        // Expiring yesterday continues seamlessly today
        assert_eq!(
            next_period_start(date(2024, 3, 10), Some(date(2024, 3, 9))),
            date(2024, 3, 10)
        );
    }

    #[test]
    fn test_append_note() {
        assert_eq!(append_note(None, "Cancelado: x"), "Cancelado: x");
        assert_eq!(append_note(Some("  "), "Cancelado: x"), "Cancelado: x");
        assert_eq!(append_note(Some("pago adiantado"), "Cancelado: x"), "pago adiantado\nCancelado: x");
    }
}
