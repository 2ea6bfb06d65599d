// Workout templates and logs: multi-row writes wrapped in transactions

use chrono::Utc;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::AsyncPgConnection;
use serde_json::{json, Map, Value};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::{self, DieselPool};
use crate::models::exercise::Exercise;
use crate::models::student::Student;
use crate::models::workout_log::{
    CreateWorkoutLogRequest, NewWorkoutLog, NewWorkoutLogEntry, WorkoutLog, WorkoutLogDetail,
};
use crate::models::workout_template::{
    number_items, CreateWorkoutTemplateRequest, NewWorkoutTemplate,
    UpdateWorkoutTemplateRequest, WorkoutTemplate, WorkoutTemplateDetail, WorkoutTemplateUpdate,
};
use crate::utils::validation::{trim_clearable_field, trim_optional_field};
use crate::utils::ApiError;

/// 422 listing every referenced exercise that does not exist
async fn ensure_exercises_exist(
    conn: &mut AsyncPgConnection,
    field: &str,
    ids: &[Uuid],
) -> Result<(), ApiError> {
    if ids.is_empty() {
        return Ok(());
    }
    let missing = Exercise::missing_ids(conn, ids).await?;
    if missing.is_empty() {
        return Ok(());
    }
    let mut details = Map::new();
    details.insert(
        field.to_string(),
        json!([format!(
            "Unknown exercise ids: {}",
            missing
                .iter()
                .map(Uuid::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        )]),
    );
    Err(ApiError::Validation(Value::Object(details)))
}

pub struct WorkoutService;

impl WorkoutService {
    pub async fn template_detail(
        conn: &mut AsyncPgConnection,
        template_id: Uuid,
    ) -> Result<WorkoutTemplateDetail, ApiError> {
        let template = WorkoutTemplate::find_by_id(conn, template_id)
            .await?
            .ok_or(ApiError::NotFound("Workout template"))?;
        let items = WorkoutTemplate::items(conn, template_id).await?;
        Ok(WorkoutTemplateDetail { template, items })
    }

    #[instrument(skip(pool, request), fields(name = %request.name))]
    pub async fn create_template(
        pool: &DieselPool,
        request: CreateWorkoutTemplateRequest,
        created_by: Uuid,
    ) -> Result<WorkoutTemplateDetail, ApiError> {
        let detail = db::transaction(pool, |conn| {
            async move {
                let exercise_ids: Vec<Uuid> = request.items.iter().map(|i| i.exercise_id).collect();
                ensure_exercises_exist(conn, "items", &exercise_ids).await?;

                let template = WorkoutTemplate::insert(
                    conn,
                    NewWorkoutTemplate {
                        name: request.name.trim().to_string(),
                        description: trim_optional_field(request.description.as_ref()),
                        goal: trim_optional_field(request.goal.as_ref()),
                        level: request.level.as_str().to_string(),
                        created_by: Some(created_by),
                    },
                )
                .await?;
                WorkoutTemplate::replace_items(conn, template.id, number_items(template.id, &request.items))
                    .await?;

                Self::template_detail(conn, template.id).await
            }
            .scope_boxed()
        })
        .await?;

        info!(template_id = %detail.template.id, items = detail.items.len(), "Workout template created");
        Ok(detail)
    }

    /// Updates fields and, when `items` is present, replaces every item
    #[instrument(skip(pool, request))]
    pub async fn update_template(
        pool: &DieselPool,
        template_id: Uuid,
        request: UpdateWorkoutTemplateRequest,
    ) -> Result<WorkoutTemplateDetail, ApiError> {
        db::transaction(pool, |conn| {
            async move {
                if !WorkoutTemplate::exists(conn, template_id).await? {
                    return Err(ApiError::NotFound("Workout template"));
                }

                let changes = WorkoutTemplateUpdate {
                    name: request.name.as_deref().map(|n| n.trim().to_string()),
                    description: trim_clearable_field(request.description.as_ref()),
                    goal: trim_clearable_field(request.goal.as_ref()),
                    level: request.level.map(|l| l.as_str().to_string()),
                    updated_at: None,
                };
                WorkoutTemplate::update(conn, template_id, changes).await?;

                if let Some(items) = &request.items {
                    let exercise_ids: Vec<Uuid> = items.iter().map(|i| i.exercise_id).collect();
                    ensure_exercises_exist(conn, "items", &exercise_ids).await?;
                    WorkoutTemplate::replace_items(conn, template_id, number_items(template_id, items))
                        .await?;
                }

                Self::template_detail(conn, template_id).await
            }
            .scope_boxed()
        })
        .await
    }

    pub async fn log_detail(
        conn: &mut AsyncPgConnection,
        log_id: Uuid,
    ) -> Result<WorkoutLogDetail, ApiError> {
        let log = WorkoutLog::find_by_id(conn, log_id)
            .await?
            .ok_or(ApiError::NotFound("Workout log"))?;
        let entries = WorkoutLog::entries(conn, log_id).await?;
        Ok(WorkoutLogDetail { log, entries })
    }

    /// Inserts the log and its entries in one transaction
    #[instrument(skip(pool, request), fields(student_id = %request.student_id))]
    pub async fn create_log(
        pool: &DieselPool,
        request: CreateWorkoutLogRequest,
        recorded_by: Uuid,
    ) -> Result<WorkoutLogDetail, ApiError> {
        let detail = db::transaction(pool, |conn| {
            async move {
                if !Student::exists(conn, request.student_id).await? {
                    return Err(ApiError::NotFound("Student"));
                }
                if let Some(template_id) = request.template_id {
                    if !WorkoutTemplate::exists(conn, template_id).await? {
                        return Err(ApiError::NotFound("Workout template"));
                    }
                }
                let exercise_ids: Vec<Uuid> =
                    request.entries.iter().map(|e| e.exercise_id).collect();
                ensure_exercises_exist(conn, "entries", &exercise_ids).await?;

                let log = WorkoutLog::insert(
                    conn,
                    NewWorkoutLog {
                        student_id: request.student_id,
                        template_id: request.template_id,
                        performed_at: request.performed_at.unwrap_or_else(Utc::now),
                        duration_minutes: request.duration_minutes,
                        perceived_effort: request.perceived_effort,
                        notes: trim_optional_field(request.notes.as_ref()),
                        recorded_by: Some(recorded_by),
                    },
                )
                .await?;

                let entries = request
                    .entries
                    .iter()
                    .map(|entry| NewWorkoutLogEntry {
                        log_id: log.id,
                        exercise_id: entry.exercise_id,
                        sets_completed: entry.sets_completed,
                        reps_completed: entry.reps_completed,
                        weight_kg: entry.weight_kg,
                    })
                    .collect();
                WorkoutLog::insert_entries(conn, entries).await?;

                Self::log_detail(conn, log.id).await
            }
            .scope_boxed()
        })
        .await?;

        info!(log_id = %detail.log.id, entries = detail.entries.len(), "Workout logged");
        Ok(detail)
    }
}
