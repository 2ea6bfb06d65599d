// Payments recorded at the front desk

use chrono::{DateTime, NaiveDate, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::common::Pagination;
use crate::schema::{payments, plans};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    CreditCard,
    DebitCard,
    Pix,
    BankTransfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::Pix => "pix",
            PaymentMethod::BankTransfer => "bank_transfer",
        }
    }

    /// Label used in receipts
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Dinheiro",
            PaymentMethod::CreditCard => "Cartão de crédito",
            PaymentMethod::DebitCard => "Cartão de débito",
            PaymentMethod::Pix => "PIX",
            PaymentMethod::BankTransfer => "Transferência bancária",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "credit_card" => Ok(PaymentMethod::CreditCard),
            "debit_card" => Ok(PaymentMethod::DebitCard),
            "pix" => Ok(PaymentMethod::Pix),
            "bank_transfer" => Ok(PaymentMethod::BankTransfer),
            _ => Err(format!("Invalid payment method: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Completed,
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Completed => "completed",
            PaymentStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, ToSchema)]
#[diesel(table_name = payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Payment {
    pub id: Uuid,
    pub student_id: Uuid,
    pub plan_id: Uuid,
    pub amount_cents: i32,
    pub method: String,
    pub status: String,
    pub paid_at: DateTime<Utc>,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub recorded_by: Option<Uuid>,
    pub notes: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = payments)]
pub struct NewPayment {
    pub student_id: Uuid,
    pub plan_id: Uuid,
    pub amount_cents: i32,
    pub method: String,
    pub status: String,
    pub paid_at: DateTime<Utc>,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub recorded_by: Option<Uuid>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "student_id": "123e4567-e89b-12d3-a456-426614174000",
    "plan_id": "9b2f3c1e-0d6a-4c1b-8a57-3f0e2d1c4b5a",
    "method": "pix"
}))]
pub struct CreatePaymentRequest {
    pub student_id: Uuid,
    pub plan_id: Uuid,
    pub method: PaymentMethod,

    /// Defaults to the plan price
    #[validate(range(min = 0, message = "Amount cannot be negative"))]
    pub amount_cents: Option<i32>,

    /// Defaults to now
    pub paid_at: Option<DateTime<Utc>>,

    /// Defaults to max(today, current expiry + 1 day)
    pub period_start: Option<NaiveDate>,

    #[validate(length(max = 1000))]
    pub notes: Option<String>,

    /// Send the receipt email (default true)
    pub send_receipt: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct CancelPaymentRequest {
    #[validate(length(max = 1000))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct PaymentFilter {
    pub student_id: Option<Uuid>,
    pub method: Option<PaymentMethod>,
    pub status: Option<PaymentStatus>,
    /// Inclusive, compared against the payment date
    pub from: Option<NaiveDate>,
    /// Inclusive, compared against the payment date
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaymentResponse {
    #[serde(flatten)]
    pub payment: Payment,
    pub plan_name: String,
}

fn filtered(filter: &PaymentFilter) -> payments::BoxedQuery<'static, Pg> {
    let mut query = payments::table.into_boxed();
    if let Some(student_id) = filter.student_id {
        query = query.filter(payments::student_id.eq(student_id));
    }
    if let Some(method) = filter.method {
        query = query.filter(payments::method.eq(method.as_str()));
    }
    if let Some(status) = filter.status {
        query = query.filter(payments::status.eq(status.as_str()));
    }
    if let Some(from) = filter.from.and_then(|d| d.and_hms_opt(0, 0, 0)) {
        query = query.filter(payments::paid_at.ge(from.and_utc()));
    }
    if let Some(to) = filter
        .to
        .and_then(|d| d.succ_opt())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        query = query.filter(payments::paid_at.lt(to.and_utc()));
    }
    query
}

impl Payment {
    pub fn is_completed(&self) -> bool {
        self.status == PaymentStatus::Completed.as_str()
    }

    pub async fn find_by_id(
        conn: &mut AsyncPgConnection,
        payment_id: Uuid,
    ) -> QueryResult<Option<PaymentResponse>> {
        payments::table
            .inner_join(plans::table)
            .filter(payments::id.eq(payment_id))
            .select((Payment::as_select(), plans::name))
            .first::<(Payment, String)>(conn)
            .await
            .optional()
            .map(|row| row.map(|(payment, plan_name)| PaymentResponse { payment, plan_name }))
    }

    /// Row lock for the cancel flow
    pub async fn find_for_update(
        conn: &mut AsyncPgConnection,
        payment_id: Uuid,
    ) -> QueryResult<Option<Self>> {
        payments::table
            .find(payment_id)
            .select(Payment::as_select())
            .for_update()
            .first(conn)
            .await
            .optional()
    }

    pub async fn list(
        conn: &mut AsyncPgConnection,
        filter: &PaymentFilter,
        pagination: &Pagination,
    ) -> QueryResult<(Vec<PaymentResponse>, i64)> {
        let total = filtered(filter).count().get_result::<i64>(conn).await?;
        let rows: Vec<Payment> = filtered(filter)
            .order(payments::paid_at.desc())
            .limit(pagination.limit())
            .offset(pagination.offset())
            .select(Payment::as_select())
            .load(conn)
            .await?;

        let plan_ids: Vec<Uuid> = rows.iter().map(|p| p.plan_id).collect();
        let names: std::collections::HashMap<Uuid, String> = plans::table
            .filter(plans::id.eq_any(plan_ids))
            .select((plans::id, plans::name))
            .load::<(Uuid, String)>(conn)
            .await?
            .into_iter()
            .collect();

        let items = rows
            .into_iter()
            .map(|payment| PaymentResponse {
                plan_name: names.get(&payment.plan_id).cloned().unwrap_or_default(),
                payment,
            })
            .collect();
        Ok((items, total))
    }

    pub async fn create(conn: &mut AsyncPgConnection, new_payment: NewPayment) -> QueryResult<Self> {
        diesel::insert_into(payments::table)
            .values(&new_payment)
            .returning(Payment::as_returning())
            .get_result(conn)
            .await
    }

    pub async fn mark_cancelled(
        conn: &mut AsyncPgConnection,
        payment_id: Uuid,
        notes: Option<String>,
    ) -> QueryResult<Self> {
        let now = Utc::now();
        diesel::update(payments::table.find(payment_id))
            .set((
                payments::status.eq(PaymentStatus::Cancelled.as_str()),
                payments::cancelled_at.eq(Some(now)),
                payments::notes.eq(notes),
                payments::updated_at.eq(now),
            ))
            .returning(Payment::as_returning())
            .get_result(conn)
            .await
    }

    /// Completed payment with the latest period end for a student
    pub async fn latest_completed_for_student(
        conn: &mut AsyncPgConnection,
        student_id: Uuid,
    ) -> QueryResult<Option<Self>> {
        payments::table
            .filter(payments::student_id.eq(student_id))
            .filter(payments::status.eq(PaymentStatus::Completed.as_str()))
            .order((payments::period_end.desc(), payments::paid_at.desc()))
            .select(Payment::as_select())
            .first(conn)
            .await
            .optional()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_round_trip() {
        for method in [
            PaymentMethod::Cash,
            PaymentMethod::CreditCard,
            PaymentMethod::DebitCard,
            PaymentMethod::Pix,
            PaymentMethod::BankTransfer,
        ] {
            assert_eq!(PaymentMethod::from_str(method.as_str()), Ok(method));
            let json = serde_json::to_string(&method).unwrap();
            assert_eq!(json, format!("\"{}\"", method.as_str()));
        }
    }

    #[test]
    fn test_create_request_rejects_unknown_method() {
        let body = r#"{
            "student_id": "123e4567-e89b-12d3-a456-426614174000",
            "plan_id": "123e4567-e89b-12d3-a456-426614174001",
            "method": "boleto"
        }"#;
        assert!(serde_json::from_str::<CreatePaymentRequest>(body).is_err());
    }
}
