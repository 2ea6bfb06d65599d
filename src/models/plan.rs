// Plano: membership plans sold by the academy

use chrono::{DateTime, Months, NaiveDate, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::schema::{payments, plans, students};
use crate::utils::validation::validate_not_blank;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, ToSchema)]
#[diesel(table_name = plans)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Plan {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Price in cents
    pub price_cents: i32,
    pub duration_months: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = plans)]
pub struct NewPlan {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i32,
    pub duration_months: i32,
    pub is_active: bool,
}

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = plans)]
pub struct PlanUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub price_cents: Option<i32>,
    pub duration_months: Option<i32>,
    pub is_active: Option<bool>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "name": "Trimestral",
    "description": "Musculação livre, 3 meses",
    "price_cents": 29990,
    "duration_months": 3
}))]
pub struct CreatePlanRequest {
    #[validate(length(min = 1, max = 120, message = "Name must be 1 to 120 characters"))]
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub price_cents: i32,

    #[validate(range(min = 1, max = 36, message = "Duration must be 1 to 36 months"))]
    pub duration_months: i32,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePlanRequest {
    #[validate(length(min = 1, max = 120, message = "Name must be 1 to 120 characters"))]
    #[validate(custom(function = "validate_not_blank"))]
    pub name: Option<String>,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub price_cents: Option<i32>,

    #[validate(range(min = 1, max = 36, message = "Duration must be 1 to 36 months"))]
    pub duration_months: Option<i32>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct PlanFilter {
    /// Only plans that can currently be sold
    pub active_only: Option<bool>,
}

/// Short plan description embedded in student responses
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlanSummary {
    pub id: Uuid,
    pub name: String,
    pub price_cents: i32,
    pub duration_months: i32,
}

impl From<&Plan> for PlanSummary {
    fn from(plan: &Plan) -> Self {
        Self {
            id: plan.id,
            name: plan.name.clone(),
            price_cents: plan.price_cents,
            duration_months: plan.duration_months,
        }
    }
}

impl Plan {
    /// Last day covered by a period of this plan starting on `start`.
    /// Month arithmetic clamps to the end of shorter months (Jan 31 + 1 month = Feb 28/29).
    pub fn period_end(&self, start: NaiveDate) -> Option<NaiveDate> {
        period_end(start, self.duration_months)
    }

    pub async fn find_by_id(conn: &mut AsyncPgConnection, plan_id: Uuid) -> QueryResult<Option<Self>> {
        plans::table
            .find(plan_id)
            .select(Plan::as_select())
            .first(conn)
            .await
            .optional()
    }

    pub async fn list(conn: &mut AsyncPgConnection, filter: &PlanFilter) -> QueryResult<Vec<Self>> {
        let mut query = plans::table.into_boxed();
        if filter.active_only.unwrap_or(false) {
            query = query.filter(plans::is_active.eq(true));
        }
        query
            .order((plans::price_cents.asc(), plans::name.asc()))
            .select(Plan::as_select())
            .load(conn)
            .await
    }

    pub async fn create(conn: &mut AsyncPgConnection, new_plan: NewPlan) -> QueryResult<Self> {
        diesel::insert_into(plans::table)
            .values(&new_plan)
            .returning(Plan::as_returning())
            .get_result(conn)
            .await
    }

    pub async fn update(
        conn: &mut AsyncPgConnection,
        plan_id: Uuid,
        mut changes: PlanUpdate,
    ) -> QueryResult<Option<Self>> {
        changes.updated_at = Some(Utc::now());
        diesel::update(plans::table.find(plan_id))
            .set(&changes)
            .returning(Plan::as_returning())
            .get_result(conn)
            .await
            .optional()
    }

    /// Whether any student or payment still references this plan
    pub async fn is_referenced(conn: &mut AsyncPgConnection, plan_id: Uuid) -> QueryResult<bool> {
        let student_refs: i64 = students::table
            .filter(students::plan_id.eq(plan_id))
            .count()
            .get_result(conn)
            .await?;
        if student_refs > 0 {
            return Ok(true);
        }
        let payment_refs: i64 = payments::table
            .filter(payments::plan_id.eq(plan_id))
            .count()
            .get_result(conn)
            .await?;
        Ok(payment_refs > 0)
    }

    pub async fn delete(conn: &mut AsyncPgConnection, plan_id: Uuid) -> QueryResult<usize> {
        diesel::delete(plans::table.find(plan_id)).execute(conn).await
    }
}

/// `start + months - 1 day`
pub fn period_end(start: NaiveDate, months: i32) -> Option<NaiveDate> {
    let months = u32::try_from(months).ok()?;
    start
        .checked_add_months(Months::new(months))
        .and_then(|d| d.pred_opt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_period_end_single_month() {
        assert_eq!(period_end(date(2024, 3, 1), 1), Some(date(2024, 3, 31)));
        assert_eq!(period_end(date(2024, 3, 15), 1), Some(date(2024, 4, 14)));
    }

    #[test]
    fn test_period_end_crosses_year() {
        assert_eq!(period_end(date(2024, 11, 10), 3), Some(date(2025, 2, 9)));
        assert_eq!(period_end(date(2024, 1, 1), 12), Some(date(2024, 12, 31)));
    }

    #[test]
    fn test_period_end_clamps_short_months() {
        // Jan 31 + 1 month clamps to Feb 29 (leap year), minus one day
        assert_eq!(period_end(date(2024, 1, 31), 1), Some(date(2024, 2, 28)));
    }

    #[test]
    fn test_period_end_rejects_negative_duration() {
        assert_eq!(period_end(date(2024, 1, 1), -1), None);
    }

    #[test]
    fn test_create_plan_validation() {
        let request = CreatePlanRequest {
            name: "Mensal".into(),
            description: None,
            price_cents: -1,
            duration_months: 40,
            is_active: true,
        };
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("price_cents"));
        assert!(errors.field_errors().contains_key("duration_months"));
    }
}
