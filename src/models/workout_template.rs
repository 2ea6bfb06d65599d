// Modelo de treino: reusable workout templates and their ordered items

use chrono::{DateTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::common::{contains_pattern, Pagination};
use crate::schema::{exercises, workout_template_items, workout_templates};
use crate::utils::validation::{validate_not_blank, REPS_PATTERN};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TemplateLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl TemplateLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateLevel::Beginner => "beginner",
            TemplateLevel::Intermediate => "intermediate",
            TemplateLevel::Advanced => "advanced",
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, ToSchema)]
#[diesel(table_name = workout_templates)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WorkoutTemplate {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub goal: Option<String>,
    pub level: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = workout_templates)]
pub struct NewWorkoutTemplate {
    pub name: String,
    pub description: Option<String>,
    pub goal: Option<String>,
    pub level: String,
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = workout_templates)]
pub struct WorkoutTemplateUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub goal: Option<Option<String>>,
    pub level: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = workout_template_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WorkoutTemplateItem {
    pub id: Uuid,
    pub template_id: Uuid,
    pub exercise_id: Uuid,
    pub position: i32,
    pub sets: i32,
    pub reps: String,
    pub rest_seconds: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = workout_template_items)]
pub struct NewWorkoutTemplateItem {
    pub template_id: Uuid,
    pub exercise_id: Uuid,
    pub position: i32,
    pub sets: i32,
    pub reps: String,
    pub rest_seconds: Option<i32>,
    pub notes: Option<String>,
}

// =============================================================================
// REQUEST / RESPONSE DTOs
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct TemplateItemInput {
    pub exercise_id: Uuid,

    #[validate(range(min = 1, max = 20, message = "Sets must be 1 to 20"))]
    pub sets: i32,

    /// e.g. "8-12", "10", "12,10,8", "AMRAP", "30s"
    #[validate(regex(path = "REPS_PATTERN", message = "Invalid repetitions format"))]
    pub reps: String,

    #[validate(range(min = 0, max = 900, message = "Rest must be 0 to 900 seconds"))]
    pub rest_seconds: Option<i32>,

    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "name": "Hipertrofia A",
    "goal": "hipertrofia",
    "level": "intermediate",
    "items": [
        {"exercise_id": "123e4567-e89b-12d3-a456-426614174000", "sets": 4, "reps": "8-12", "rest_seconds": 90}
    ]
}))]
pub struct CreateWorkoutTemplateRequest {
    #[validate(length(min = 1, max = 120, message = "Name must be 1 to 120 characters"))]
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    #[validate(length(max = 120))]
    pub goal: Option<String>,

    pub level: TemplateLevel,

    /// Positions follow the order of this list
    #[validate(length(max = 50, message = "A template holds at most 50 items"))]
    #[validate]
    #[serde(default)]
    pub items: Vec<TemplateItemInput>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateWorkoutTemplateRequest {
    #[validate(length(min = 1, max = 120, message = "Name must be 1 to 120 characters"))]
    #[validate(custom(function = "validate_not_blank"))]
    pub name: Option<String>,

    /// Empty string clears the value
    #[validate(length(max = 2000))]
    pub description: Option<String>,

    /// Empty string clears the value
    #[validate(length(max = 120))]
    pub goal: Option<String>,

    pub level: Option<TemplateLevel>,

    /// When present, replaces every item
    #[validate(length(max = 50, message = "A template holds at most 50 items"))]
    #[validate]
    pub items: Option<Vec<TemplateItemInput>>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct WorkoutTemplateFilter {
    pub search: Option<String>,
    pub level: Option<TemplateLevel>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TemplateItemDetail {
    pub id: Uuid,
    pub position: i32,
    pub exercise_id: Uuid,
    pub exercise_name: String,
    pub muscle_group: String,
    pub sets: i32,
    pub reps: String,
    pub rest_seconds: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WorkoutTemplateDetail {
    #[serde(flatten)]
    pub template: WorkoutTemplate,
    pub items: Vec<TemplateItemDetail>,
}

/// Items numbered 1..n in input order
pub fn number_items(template_id: Uuid, items: &[TemplateItemInput]) -> Vec<NewWorkoutTemplateItem> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| NewWorkoutTemplateItem {
            template_id,
            exercise_id: item.exercise_id,
            position: index as i32 + 1,
            sets: item.sets,
            reps: item.reps.trim().to_string(),
            rest_seconds: item.rest_seconds,
            notes: item
                .notes
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(String::from),
        })
        .collect()
}

// =============================================================================
// QUERIES
// =============================================================================

fn filtered(filter: &WorkoutTemplateFilter) -> workout_templates::BoxedQuery<'static, Pg> {
    let mut query = workout_templates::table.into_boxed();
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = contains_pattern(search);
        query = query.filter(
            workout_templates::name
                .ilike(pattern.clone())
                .or(workout_templates::goal.ilike(pattern)),
        );
    }
    if let Some(level) = filter.level {
        query = query.filter(workout_templates::level.eq(level.as_str()));
    }
    query
}

impl WorkoutTemplate {
    pub async fn find_by_id(
        conn: &mut AsyncPgConnection,
        template_id: Uuid,
    ) -> QueryResult<Option<Self>> {
        workout_templates::table
            .find(template_id)
            .select(WorkoutTemplate::as_select())
            .first(conn)
            .await
            .optional()
    }

    pub async fn exists(conn: &mut AsyncPgConnection, template_id: Uuid) -> QueryResult<bool> {
        diesel::select(diesel::dsl::exists(workout_templates::table.find(template_id)))
            .get_result(conn)
            .await
    }

    pub async fn list(
        conn: &mut AsyncPgConnection,
        filter: &WorkoutTemplateFilter,
        pagination: &Pagination,
    ) -> QueryResult<(Vec<Self>, i64)> {
        let total = filtered(filter).count().get_result::<i64>(conn).await?;
        let items = filtered(filter)
            .order(workout_templates::name.asc())
            .limit(pagination.limit())
            .offset(pagination.offset())
            .select(WorkoutTemplate::as_select())
            .load(conn)
            .await?;
        Ok((items, total))
    }

    pub async fn insert(
        conn: &mut AsyncPgConnection,
        new_template: NewWorkoutTemplate,
    ) -> QueryResult<Self> {
        diesel::insert_into(workout_templates::table)
            .values(&new_template)
            .returning(WorkoutTemplate::as_returning())
            .get_result(conn)
            .await
    }

    pub async fn update(
        conn: &mut AsyncPgConnection,
        template_id: Uuid,
        mut changes: WorkoutTemplateUpdate,
    ) -> QueryResult<Option<Self>> {
        changes.updated_at = Some(Utc::now());
        diesel::update(workout_templates::table.find(template_id))
            .set(&changes)
            .returning(WorkoutTemplate::as_returning())
            .get_result(conn)
            .await
            .optional()
    }

    /// Deletes existing items and inserts `items` in their place
    pub async fn replace_items(
        conn: &mut AsyncPgConnection,
        template_id: Uuid,
        items: Vec<NewWorkoutTemplateItem>,
    ) -> QueryResult<()> {
        diesel::delete(
            workout_template_items::table
                .filter(workout_template_items::template_id.eq(template_id)),
        )
        .execute(conn)
        .await?;

        if !items.is_empty() {
            diesel::insert_into(workout_template_items::table)
                .values(&items)
                .execute(conn)
                .await?;
        }
        Ok(())
    }

    /// Items ordered by position, joined with exercise names
    pub async fn items(
        conn: &mut AsyncPgConnection,
        template_id: Uuid,
    ) -> QueryResult<Vec<TemplateItemDetail>> {
        let rows: Vec<(WorkoutTemplateItem, String, String)> = workout_template_items::table
            .inner_join(exercises::table)
            .filter(workout_template_items::template_id.eq(template_id))
            .order(workout_template_items::position.asc())
            .select((
                WorkoutTemplateItem::as_select(),
                exercises::name,
                exercises::muscle_group,
            ))
            .load(conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(item, exercise_name, muscle_group)| TemplateItemDetail {
                id: item.id,
                position: item.position,
                exercise_id: item.exercise_id,
                exercise_name,
                muscle_group,
                sets: item.sets,
                reps: item.reps,
                rest_seconds: item.rest_seconds,
                notes: item.notes,
            })
            .collect())
    }

    pub async fn delete(conn: &mut AsyncPgConnection, template_id: Uuid) -> QueryResult<usize> {
        diesel::delete(workout_templates::table.find(template_id))
            .execute(conn)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(reps: &str) -> TemplateItemInput {
        TemplateItemInput {
            exercise_id: Uuid::new_v4(),
            sets: 3,
            reps: reps.to_string(),
            rest_seconds: Some(60),
            notes: Some("  ".to_string()),
        }
    }

    #[test]
    fn test_number_items_follows_request_order() {
        let template_id = Uuid::new_v4();
        let inputs = vec![item("10"), item("8-12"), item("AMRAP")];
        let numbered = number_items(template_id, &inputs);

        let positions: Vec<i32> = numbered.iter().map(|i| i.position).collect();
        assert_eq!(positions, vec![1, 2, 3]);
        assert_eq!(numbered[1].exercise_id, inputs[1].exercise_id);
        assert!(numbered.iter().all(|i| i.template_id == template_id));
        assert!(numbered[0].notes.is_none());
    }

    #[test]
    fn test_nested_item_validation() {
        let mut bad = item("lots");
        bad.sets = 0;
        let request = CreateWorkoutTemplateRequest {
            name: "Full body".to_string(),
            description: None,
            goal: None,
            level: TemplateLevel::Beginner,
            items: vec![item("12"), bad],
        };
        let errors = request.validate().unwrap_err();
        assert!(errors.errors().contains_key("items"));
    }

    #[test]
    fn test_level_serde() {
        let level: TemplateLevel = serde_json::from_str("\"advanced\"").unwrap();
        assert_eq!(level, TemplateLevel::Advanced);
        assert_eq!(level.as_str(), "advanced");
    }
}
