// Registro de treino: completed workout sessions

use chrono::{DateTime, NaiveDate, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::common::Pagination;
use crate::schema::{exercises, workout_log_entries, workout_logs};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, ToSchema)]
#[diesel(table_name = workout_logs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WorkoutLog {
    pub id: Uuid,
    pub student_id: Uuid,
    pub template_id: Option<Uuid>,
    pub performed_at: DateTime<Utc>,
    pub duration_minutes: Option<i32>,
    pub perceived_effort: Option<i32>,
    pub notes: Option<String>,
    pub recorded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = workout_logs)]
pub struct NewWorkoutLog {
    pub student_id: Uuid,
    pub template_id: Option<Uuid>,
    pub performed_at: DateTime<Utc>,
    pub duration_minutes: Option<i32>,
    pub perceived_effort: Option<i32>,
    pub notes: Option<String>,
    pub recorded_by: Option<Uuid>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = workout_log_entries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WorkoutLogEntry {
    pub id: Uuid,
    pub log_id: Uuid,
    pub exercise_id: Uuid,
    pub sets_completed: i32,
    pub reps_completed: Option<i32>,
    pub weight_kg: Option<f64>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = workout_log_entries)]
pub struct NewWorkoutLogEntry {
    pub log_id: Uuid,
    pub exercise_id: Uuid,
    pub sets_completed: i32,
    pub reps_completed: Option<i32>,
    pub weight_kg: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct LogEntryInput {
    pub exercise_id: Uuid,

    #[validate(range(min = 0, max = 100, message = "Sets completed must be 0 to 100"))]
    pub sets_completed: i32,

    #[validate(range(min = 0, max = 1000, message = "Reps completed must be 0 to 1000"))]
    pub reps_completed: Option<i32>,

    #[validate(range(min = 0.0, max = 1000.0, message = "Weight must be 0 to 1000 kg"))]
    pub weight_kg: Option<f64>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "student_id": "123e4567-e89b-12d3-a456-426614174000",
    "duration_minutes": 55,
    "perceived_effort": 7,
    "entries": [
        {"exercise_id": "9b2f3c1e-0d6a-4c1b-8a57-3f0e2d1c4b5a", "sets_completed": 4, "reps_completed": 10, "weight_kg": 40.0}
    ]
}))]
pub struct CreateWorkoutLogRequest {
    pub student_id: Uuid,

    pub template_id: Option<Uuid>,

    /// Defaults to now
    pub performed_at: Option<DateTime<Utc>>,

    #[validate(range(min = 1, max = 600, message = "Duration must be 1 to 600 minutes"))]
    pub duration_minutes: Option<i32>,

    #[validate(range(min = 1, max = 10, message = "Perceived effort must be 1 to 10"))]
    pub perceived_effort: Option<i32>,

    #[validate(length(max = 2000))]
    pub notes: Option<String>,

    #[validate(length(max = 100, message = "At most 100 entries per log"))]
    #[validate]
    #[serde(default)]
    pub entries: Vec<LogEntryInput>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct WorkoutLogFilter {
    pub student_id: Option<Uuid>,
    /// Inclusive, compared against the workout date
    pub from: Option<NaiveDate>,
    /// Inclusive, compared against the workout date
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LogEntryDetail {
    pub id: Uuid,
    pub exercise_id: Uuid,
    pub exercise_name: String,
    pub sets_completed: i32,
    pub reps_completed: Option<i32>,
    pub weight_kg: Option<f64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WorkoutLogDetail {
    #[serde(flatten)]
    pub log: WorkoutLog,
    pub entries: Vec<LogEntryDetail>,
}

fn filtered(filter: &WorkoutLogFilter) -> workout_logs::BoxedQuery<'static, Pg> {
    let mut query = workout_logs::table.into_boxed();
    if let Some(student_id) = filter.student_id {
        query = query.filter(workout_logs::student_id.eq(student_id));
    }
    if let Some(from) = filter.from.and_then(|d| d.and_hms_opt(0, 0, 0)) {
        query = query.filter(workout_logs::performed_at.ge(from.and_utc()));
    }
    if let Some(to) = filter
        .to
        .and_then(|d| d.succ_opt())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        query = query.filter(workout_logs::performed_at.lt(to.and_utc()));
    }
    query
}

impl WorkoutLog {
    pub async fn find_by_id(
        conn: &mut AsyncPgConnection,
        log_id: Uuid,
    ) -> QueryResult<Option<Self>> {
        workout_logs::table
            .find(log_id)
            .select(WorkoutLog::as_select())
            .first(conn)
            .await
            .optional()
    }

    pub async fn list(
        conn: &mut AsyncPgConnection,
        filter: &WorkoutLogFilter,
        pagination: &Pagination,
    ) -> QueryResult<(Vec<Self>, i64)> {
        let total = filtered(filter).count().get_result::<i64>(conn).await?;
        let items = filtered(filter)
            .order(workout_logs::performed_at.desc())
            .limit(pagination.limit())
            .offset(pagination.offset())
            .select(WorkoutLog::as_select())
            .load(conn)
            .await?;
        Ok((items, total))
    }

    pub async fn insert(conn: &mut AsyncPgConnection, new_log: NewWorkoutLog) -> QueryResult<Self> {
        diesel::insert_into(workout_logs::table)
            .values(&new_log)
            .returning(WorkoutLog::as_returning())
            .get_result(conn)
            .await
    }

    pub async fn insert_entries(
        conn: &mut AsyncPgConnection,
        entries: Vec<NewWorkoutLogEntry>,
    ) -> QueryResult<usize> {
        if entries.is_empty() {
            return Ok(0);
        }
        diesel::insert_into(workout_log_entries::table)
            .values(&entries)
            .execute(conn)
            .await
    }

    pub async fn entries(
        conn: &mut AsyncPgConnection,
        log_id: Uuid,
    ) -> QueryResult<Vec<LogEntryDetail>> {
        let rows: Vec<(WorkoutLogEntry, String)> = workout_log_entries::table
            .inner_join(exercises::table)
            .filter(workout_log_entries::log_id.eq(log_id))
            .order(exercises::name.asc())
            .select((WorkoutLogEntry::as_select(), exercises::name))
            .load(conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(entry, exercise_name)| LogEntryDetail {
                id: entry.id,
                exercise_id: entry.exercise_id,
                exercise_name,
                sets_completed: entry.sets_completed,
                reps_completed: entry.reps_completed,
                weight_kg: entry.weight_kg,
            })
            .collect())
    }

    pub async fn delete(conn: &mut AsyncPgConnection, log_id: Uuid) -> QueryResult<usize> {
        diesel::delete(workout_logs::table.find(log_id))
            .execute(conn)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effort_out_of_range() {
        let request = CreateWorkoutLogRequest {
            student_id: Uuid::new_v4(),
            template_id: None,
            performed_at: None,
            duration_minutes: Some(45),
            perceived_effort: Some(11),
            notes: None,
            entries: vec![LogEntryInput {
                exercise_id: Uuid::new_v4(),
                sets_completed: 3,
                reps_completed: Some(12),
                weight_kg: Some(-5.0),
            }],
        };
        let errors = request.validate().unwrap_err();
        assert!(errors.errors().contains_key("perceived_effort"));
        assert!(errors.errors().contains_key("entries"));
    }
}
