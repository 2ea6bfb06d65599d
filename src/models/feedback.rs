// Student feedback and staff responses

use chrono::{DateTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::common::Pagination;
use crate::schema::feedback;
use crate::utils::validation::validate_not_blank;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackCategory {
    Suggestion,
    Complaint,
    Praise,
    Other,
}

impl FeedbackCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackCategory::Suggestion => "suggestion",
            FeedbackCategory::Complaint => "complaint",
            FeedbackCategory::Praise => "praise",
            FeedbackCategory::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackStatus {
    Open,
    Reviewed,
    Resolved,
}

impl FeedbackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackStatus::Open => "open",
            FeedbackStatus::Reviewed => "reviewed",
            FeedbackStatus::Resolved => "resolved",
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, ToSchema)]
#[diesel(table_name = feedback)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Feedback {
    pub id: Uuid,
    pub student_id: Uuid,
    pub category: String,
    pub rating: Option<i32>,
    pub message: String,
    pub status: String,
    pub response: Option<String>,
    pub responded_by: Option<Uuid>,
    pub responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = feedback)]
pub struct NewFeedback {
    pub student_id: Uuid,
    pub category: String,
    pub rating: Option<i32>,
    pub message: String,
    pub status: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "student_id": "123e4567-e89b-12d3-a456-426614174000",
    "category": "suggestion",
    "rating": 4,
    "message": "Poderiam abrir mais cedo aos sábados."
}))]
pub struct CreateFeedbackRequest {
    pub student_id: Uuid,

    pub category: FeedbackCategory,

    #[validate(range(min = 1, max = 5, message = "Rating must be 1 to 5"))]
    pub rating: Option<i32>,

    #[validate(length(min = 1, max = 4000, message = "Message must be 1 to 4000 characters"))]
    #[validate(custom(function = "validate_not_blank"))]
    pub message: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RespondFeedbackRequest {
    #[validate(length(min = 1, max = 4000, message = "Response must be 1 to 4000 characters"))]
    #[validate(custom(function = "validate_not_blank"))]
    pub response: String,

    /// Defaults to `reviewed`
    pub status: Option<FeedbackStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct FeedbackFilter {
    pub student_id: Option<Uuid>,
    pub status: Option<FeedbackStatus>,
    pub category: Option<FeedbackCategory>,
}

fn filtered(filter: &FeedbackFilter) -> feedback::BoxedQuery<'static, Pg> {
    let mut query = feedback::table.into_boxed();
    if let Some(student_id) = filter.student_id {
        query = query.filter(feedback::student_id.eq(student_id));
    }
    if let Some(status) = filter.status {
        query = query.filter(feedback::status.eq(status.as_str()));
    }
    if let Some(category) = filter.category {
        query = query.filter(feedback::category.eq(category.as_str()));
    }
    query
}

impl Feedback {
    pub async fn find_by_id(
        conn: &mut AsyncPgConnection,
        feedback_id: Uuid,
    ) -> QueryResult<Option<Self>> {
        feedback::table
            .find(feedback_id)
            .select(Feedback::as_select())
            .first(conn)
            .await
            .optional()
    }

    pub async fn list(
        conn: &mut AsyncPgConnection,
        filter: &FeedbackFilter,
        pagination: &Pagination,
    ) -> QueryResult<(Vec<Self>, i64)> {
        let total = filtered(filter).count().get_result::<i64>(conn).await?;
        let items = filtered(filter)
            .order(feedback::created_at.desc())
            .limit(pagination.limit())
            .offset(pagination.offset())
            .select(Feedback::as_select())
            .load(conn)
            .await?;
        Ok((items, total))
    }

    pub async fn create(conn: &mut AsyncPgConnection, new_feedback: NewFeedback) -> QueryResult<Self> {
        diesel::insert_into(feedback::table)
            .values(&new_feedback)
            .returning(Feedback::as_returning())
            .get_result(conn)
            .await
    }

    pub async fn respond(
        conn: &mut AsyncPgConnection,
        feedback_id: Uuid,
        response: String,
        status: FeedbackStatus,
        responder: Uuid,
    ) -> QueryResult<Option<Self>> {
        let now = Utc::now();
        diesel::update(feedback::table.find(feedback_id))
            .set((
                feedback::response.eq(Some(response)),
                feedback::status.eq(status.as_str()),
                feedback::responded_by.eq(Some(responder)),
                feedback::responded_at.eq(Some(now)),
                feedback::updated_at.eq(now),
            ))
            .returning(Feedback::as_returning())
            .get_result(conn)
            .await
            .optional()
    }

    pub async fn delete(conn: &mut AsyncPgConnection, feedback_id: Uuid) -> QueryResult<usize> {
        diesel::delete(feedback::table.find(feedback_id))
            .execute(conn)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        let request = CreateFeedbackRequest {
            student_id: Uuid::new_v4(),
            category: FeedbackCategory::Praise,
            rating: Some(6),
            message: "Ótimo atendimento".into(),
        };
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("rating"));
    }

    #[test]
    fn test_respond_status_optional() {
        let request: RespondFeedbackRequest =
            serde_json::from_str(r#"{"response": "Obrigado!"}"#).unwrap();
        assert!(request.status.is_none());
        assert!(request.validate().is_ok());
    }
}
