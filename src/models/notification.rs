// Notifications sent to students, manual or from the expiry sweep

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
use crate::schema::notifications;
use crate::utils::validation::validate_not_blank;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Manual,
    PlanExpiring,
    PlanExpired,
    PaymentReceipt,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Manual => "manual",
            NotificationKind::PlanExpiring => "plan_expiring",
            NotificationKind::PlanExpired => "plan_expired",
            NotificationKind::PaymentReceipt => "payment_receipt",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(NotificationKind::Manual),
            "plan_expiring" => Ok(NotificationKind::PlanExpiring),
            "plan_expired" => Ok(NotificationKind::PlanExpired),
            "payment_receipt" => Ok(NotificationKind::PaymentReceipt),
            _ => Err(format!("Invalid notification kind: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    #[default]
    Email,
    Internal,
}

impl NotificationChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationChannel::Email => "email",
            NotificationChannel::Internal => "internal",
        }
    }
}

impl FromStr for NotificationChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(NotificationChannel::Email),
            "internal" => Ok(NotificationChannel::Internal),
            _ => Err(format!("Invalid notification channel: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Pending => "pending",
            NotificationStatus::Sent => "sent",
            NotificationStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, ToSchema)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Notification {
    pub id: Uuid,
    pub student_id: Option<Uuid>,
    pub title: String,
    pub message: String,
    pub kind: String,
    pub channel: String,
    pub status: String,
    pub reference_date: Option<NaiveDate>,
    pub error: Option<String>,
    pub created_by: Option<Uuid>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = notifications)]
pub struct NewNotification {
    pub student_id: Option<Uuid>,
    pub title: String,
    pub message: String,
    pub kind: String,
    pub channel: String,
    pub status: String,
    pub reference_date: Option<NaiveDate>,
    pub created_by: Option<Uuid>,
}

impl NewNotification {
    pub fn pending(
        student_id: Uuid,
        kind: NotificationKind,
        channel: NotificationChannel,
        title: String,
        message: String,
    ) -> Self {
        Self {
            student_id: Some(student_id),
            title,
            message,
            kind: kind.as_str().to_string(),
            channel: channel.as_str().to_string(),
            status: NotificationStatus::Pending.as_str().to_string(),
            reference_date: None,
            created_by: None,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "student_id": "123e4567-e89b-12d3-a456-426614174000",
    "title": "Academia fechada no feriado",
    "message": "Na segunda-feira a academia abre apenas das 8h às 12h.",
    "channel": "email"
}))]
pub struct CreateNotificationRequest {
    /// Omit to broadcast to every active student
    pub student_id: Option<Uuid>,

    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    #[validate(custom(function = "validate_not_blank"))]
    pub title: String,

    #[validate(length(min = 1, max = 5000, message = "Message must be 1 to 5000 characters"))]
    #[validate(custom(function = "validate_not_blank"))]
    pub message: String,

    #[serde(default)]
    pub channel: NotificationChannel,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct NotificationFilter {
    pub student_id: Option<Uuid>,
    pub kind: Option<NotificationKind>,
    pub status: Option<NotificationStatus>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SweepReport {
    pub expiring_notified: usize,
    pub expired_deactivated: usize,
    pub expired_notified: usize,
    pub failed: usize,
}

fn filtered(filter: &NotificationFilter) -> notifications::BoxedQuery<'static, Pg> {
    let mut query = notifications::table.into_boxed();
    if let Some(student_id) = filter.student_id {
        query = query.filter(notifications::student_id.eq(student_id));
    }
    if let Some(kind) = filter.kind {
        query = query.filter(notifications::kind.eq(kind.as_str()));
    }
    if let Some(status) = filter.status {
        query = query.filter(notifications::status.eq(status.as_str()));
    }
    query
}

impl Notification {
    pub fn is_failed(&self) -> bool {
        self.status == NotificationStatus::Failed.as_str()
    }

    pub fn is_email(&self) -> bool {
        self.channel == NotificationChannel::Email.as_str()
    }

    pub async fn find_by_id(
        conn: &mut AsyncPgConnection,
        notification_id: Uuid,
    ) -> QueryResult<Option<Self>> {
        notifications::table
            .find(notification_id)
            .select(Notification::as_select())
            .first(conn)
            .await
            .optional()
    }

    pub async fn list(
        conn: &mut AsyncPgConnection,
        filter: &NotificationFilter,
        pagination: &Pagination,
    ) -> QueryResult<(Vec<Self>, i64)> {
        let total = filtered(filter).count().get_result::<i64>(conn).await?;
        let items = filtered(filter)
            .order(notifications::created_at.desc())
            .limit(pagination.limit())
            .offset(pagination.offset())
            .select(Notification::as_select())
            .load(conn)
            .await?;
        Ok((items, total))
    }

    pub async fn insert(
        conn: &mut AsyncPgConnection,
        new_notification: NewNotification,
    ) -> QueryResult<Self> {
        diesel::insert_into(notifications::table)
            .values(&new_notification)
            .returning(Notification::as_returning())
            .get_result(conn)
            .await
    }

    pub async fn insert_many(
        conn: &mut AsyncPgConnection,
        rows: Vec<NewNotification>,
    ) -> QueryResult<Vec<Self>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        diesel::insert_into(notifications::table)
            .values(&rows)
            .returning(Notification::as_returning())
            .get_results(conn)
            .await
    }

    /// Whether an automated notice of `kind` already went out for this expiry date
    pub async fn already_sent(
        conn: &mut AsyncPgConnection,
        student_id: Uuid,
        kind: NotificationKind,
        reference_date: NaiveDate,
    ) -> QueryResult<bool> {
        diesel::select(diesel::dsl::exists(
            notifications::table
                .filter(notifications::student_id.eq(student_id))
                .filter(notifications::kind.eq(kind.as_str()))
                .filter(notifications::reference_date.eq(reference_date))
                .filter(notifications::status.eq(NotificationStatus::Sent.as_str())),
        ))
        .get_result(conn)
        .await
    }

    /// Earlier undelivered row for the same automated notice, reused on retry
    pub async fn find_unsent(
        conn: &mut AsyncPgConnection,
        student_id: Uuid,
        kind: NotificationKind,
        reference_date: NaiveDate,
    ) -> QueryResult<Option<Self>> {
        notifications::table
            .filter(notifications::student_id.eq(student_id))
            .filter(notifications::kind.eq(kind.as_str()))
            .filter(notifications::reference_date.eq(reference_date))
            .filter(notifications::status.ne(NotificationStatus::Sent.as_str()))
            .order(notifications::created_at.desc())
            .select(Notification::as_select())
            .first(conn)
            .await
            .optional()
    }

    /// Undelivered automated notices of `kind`, oldest first
    pub async fn unsent_of_kind(
        conn: &mut AsyncPgConnection,
        kind: NotificationKind,
    ) -> QueryResult<Vec<Self>> {
        notifications::table
            .filter(notifications::kind.eq(kind.as_str()))
            .filter(notifications::status.ne(NotificationStatus::Sent.as_str()))
            .filter(notifications::student_id.is_not_null())
            .filter(notifications::reference_date.is_not_null())
            .order(notifications::created_at.asc())
            .select(Notification::as_select())
            .load(conn)
            .await
    }

    pub async fn mark_sent(
        conn: &mut AsyncPgConnection,
        notification_id: Uuid,
    ) -> QueryResult<Self> {
        diesel::update(notifications::table.find(notification_id))
            .set((
                notifications::status.eq(NotificationStatus::Sent.as_str()),
                notifications::sent_at.eq(Some(Utc::now())),
                notifications::error.eq(None::<String>),
            ))
            .returning(Notification::as_returning())
            .get_result(conn)
            .await
    }

    pub async fn mark_failed(
        conn: &mut AsyncPgConnection,
        notification_id: Uuid,
        error: &str,
    ) -> QueryResult<Self> {
        diesel::update(notifications::table.find(notification_id))
            .set((
                notifications::status.eq(NotificationStatus::Failed.as_str()),
                notifications::error.eq(Some(error.to_string())),
            ))
            .returning(Notification::as_returning())
            .get_result(conn)
            .await
    }

    pub async fn delete(conn: &mut AsyncPgConnection, notification_id: Uuid) -> QueryResult<usize> {
        diesel::delete(notifications::table.find(notification_id))
            .execute(conn)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_defaults_to_email() {
        let body = r#"{"title": "Aviso", "message": "Olá"}"#;
        let request: CreateNotificationRequest = serde_json::from_str(body).unwrap();
        assert_eq!(request.channel, NotificationChannel::Email);
        assert!(request.student_id.is_none());
    }

    #[test]
    fn test_pending_row() {
        let student_id = Uuid::new_v4();
        let row = NewNotification::pending(
            student_id,
            NotificationKind::PlanExpiring,
            NotificationChannel::Email,
            "t".into(),
            "m".into(),
        );
        assert_eq!(row.kind, "plan_expiring");
        assert_eq!(row.status, "pending");
        assert_eq!(row.student_id, Some(student_id));
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(
            NotificationKind::from_str("payment_receipt"),
            Ok(NotificationKind::PaymentReceipt)
        );
        assert!(NotificationKind::from_str("sms").is_err());
    }
}
