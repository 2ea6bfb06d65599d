// Exercise catalog

use chrono::{DateTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::common::{contains_pattern, escape_like, Pagination};
use crate::schema::{exercises, workout_log_entries, workout_template_items};
use crate::utils::validation::validate_not_blank;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, ToSchema)]
#[diesel(table_name = exercises)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Exercise {
    pub id: Uuid,
    pub name: String,
    pub muscle_group: String,
    pub equipment: Option<String>,
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = exercises)]
pub struct NewExercise {
    pub name: String,
    pub muscle_group: String,
    pub equipment: Option<String>,
    pub description: Option<String>,
    pub video_url: Option<String>,
}

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = exercises)]
pub struct ExerciseUpdate {
    pub name: Option<String>,
    pub muscle_group: Option<String>,
    pub equipment: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub video_url: Option<Option<String>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "name": "Supino reto",
    "muscle_group": "peito",
    "equipment": "barra"
}))]
pub struct CreateExerciseRequest {
    #[validate(length(min = 1, max = 120, message = "Name must be 1 to 120 characters"))]
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,

    #[validate(length(min = 1, max = 60, message = "Muscle group must be 1 to 60 characters"))]
    #[validate(custom(function = "validate_not_blank"))]
    pub muscle_group: String,

    #[validate(length(max = 120))]
    pub equipment: Option<String>,

    #[validate(length(max = 4000))]
    pub description: Option<String>,

    #[validate(url(message = "Invalid video URL"))]
    pub video_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateExerciseRequest {
    #[validate(length(min = 1, max = 120, message = "Name must be 1 to 120 characters"))]
    #[validate(custom(function = "validate_not_blank"))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 60, message = "Muscle group must be 1 to 60 characters"))]
    #[validate(custom(function = "validate_not_blank"))]
    pub muscle_group: Option<String>,

    /// Empty string clears the value
    #[validate(length(max = 120))]
    pub equipment: Option<String>,

    /// Empty string clears the value
    #[validate(length(max = 4000))]
    pub description: Option<String>,

    /// Empty string clears the value
    pub video_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ExerciseFilter {
    /// Matches the exercise name
    pub search: Option<String>,
    pub muscle_group: Option<String>,
}

fn filtered(filter: &ExerciseFilter) -> exercises::BoxedQuery<'static, Pg> {
    let mut query = exercises::table.into_boxed();
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        query = query.filter(exercises::name.ilike(contains_pattern(search)));
    }
    if let Some(group) = filter
        .muscle_group
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        query = query.filter(exercises::muscle_group.ilike(escape_like(group)));
    }
    query
}

impl Exercise {
    pub async fn find_by_id(
        conn: &mut AsyncPgConnection,
        exercise_id: Uuid,
    ) -> QueryResult<Option<Self>> {
        exercises::table
            .find(exercise_id)
            .select(Exercise::as_select())
            .first(conn)
            .await
            .optional()
    }

    /// Ids from `ids` that do not exist in the catalog
    pub async fn missing_ids(
        conn: &mut AsyncPgConnection,
        ids: &[Uuid],
    ) -> QueryResult<Vec<Uuid>> {
        let found: Vec<Uuid> = exercises::table
            .filter(exercises::id.eq_any(ids.to_vec()))
            .select(exercises::id)
            .load(conn)
            .await?;
        let mut missing: Vec<Uuid> = ids.iter().filter(|id| !found.contains(id)).copied().collect();
        missing.sort();
        missing.dedup();
        Ok(missing)
    }

    pub async fn list(
        conn: &mut AsyncPgConnection,
        filter: &ExerciseFilter,
        pagination: &Pagination,
    ) -> QueryResult<(Vec<Self>, i64)> {
        let total = filtered(filter).count().get_result::<i64>(conn).await?;
        let items = filtered(filter)
            .order((exercises::muscle_group.asc(), exercises::name.asc()))
            .limit(pagination.limit())
            .offset(pagination.offset())
            .select(Exercise::as_select())
            .load(conn)
            .await?;
        Ok((items, total))
    }

    pub async fn create(conn: &mut AsyncPgConnection, new_exercise: NewExercise) -> QueryResult<Self> {
        diesel::insert_into(exercises::table)
            .values(&new_exercise)
            .returning(Exercise::as_returning())
            .get_result(conn)
            .await
    }

    pub async fn update(
        conn: &mut AsyncPgConnection,
        exercise_id: Uuid,
        mut changes: ExerciseUpdate,
    ) -> QueryResult<Option<Self>> {
        changes.updated_at = Some(Utc::now());
        diesel::update(exercises::table.find(exercise_id))
            .set(&changes)
            .returning(Exercise::as_returning())
            .get_result(conn)
            .await
            .optional()
    }

    /// Whether any template item or logged entry points at this exercise
    pub async fn is_in_use(conn: &mut AsyncPgConnection, exercise_id: Uuid) -> QueryResult<bool> {
        let in_templates: bool = diesel::select(diesel::dsl::exists(
            workout_template_items::table.filter(workout_template_items::exercise_id.eq(exercise_id)),
        ))
        .get_result(conn)
        .await?;
        if in_templates {
            return Ok(true);
        }
        diesel::select(diesel::dsl::exists(
            workout_log_entries::table.filter(workout_log_entries::exercise_id.eq(exercise_id)),
        ))
        .get_result(conn)
        .await
    }

    pub async fn delete(conn: &mut AsyncPgConnection, exercise_id: Uuid) -> QueryResult<usize> {
        diesel::delete(exercises::table.find(exercise_id))
            .execute(conn)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_exercise_validation() {
        let request = CreateExerciseRequest {
            name: "Agachamento".into(),
            muscle_group: " ".into(),
            equipment: None,
            description: None,
            video_url: Some("not a url".into()),
        };
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("muscle_group"));
        assert!(errors.field_errors().contains_key("video_url"));
    }
}
