// Administrative reports

use axum::{extract::State, Json};
use chrono::Utc;

use crate::{
    app::AppState,
    models::{
        common::DateRange,
        report::{
            AttendanceRow, ExpiringQuery, ExpiringStudent, RevenueReport, StudentsReport,
            DEFAULT_EXPIRING_DAYS,
        },
    },
    utils::{ApiError, ApiQuery, ApiResult},
};

const MAX_EXPIRING_DAYS: i64 = 365;

/// Completed payments only
/// GET /v1/reports/revenue
#[utoipa::path(
    get,
    path = "/v1/reports/revenue",
    tag = "Reports",
    operation_id = "revenueReport",
    params(DateRange),
    responses(
        (status = 200, description = "Revenue totals by method and month", body = RevenueReport),
        (status = 422, description = "Invalid date range", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn revenue(
    State(state): State<AppState>,
    ApiQuery(range): ApiQuery<DateRange>,
) -> ApiResult<Json<RevenueReport>> {
    range.check()?;
    let mut conn = state.diesel_pool.get().await?;
    Ok(Json(RevenueReport::generate(&mut conn, &range).await?))
}

/// GET /v1/reports/students
#[utoipa::path(
    get,
    path = "/v1/reports/students",
    tag = "Reports",
    operation_id = "studentsReport",
    responses((status = 200, description = "Student counts", body = StudentsReport)),
    security(("bearerAuth" = []))
)]
pub async fn students(State(state): State<AppState>) -> ApiResult<Json<StudentsReport>> {
    let mut conn = state.diesel_pool.get().await?;
    let report = StudentsReport::generate(&mut conn, Utc::now().date_naive()).await?;
    Ok(Json(report))
}

/// GET /v1/reports/expiring
#[utoipa::path(
    get,
    path = "/v1/reports/expiring",
    tag = "Reports",
    operation_id = "expiringReport",
    params(ExpiringQuery),
    responses(
        (status = 200, description = "Active students with plans ending soon or already expired", body = [ExpiringStudent]),
        (status = 422, description = "Invalid window", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn expiring(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ExpiringQuery>,
) -> ApiResult<Json<Vec<ExpiringStudent>>> {
    let days = query.days.unwrap_or(DEFAULT_EXPIRING_DAYS);
    if !(0..=MAX_EXPIRING_DAYS).contains(&days) {
        return Err(ApiError::field(
            "days",
            format!("days must be between 0 and {}", MAX_EXPIRING_DAYS),
        ));
    }

    let mut conn = state.diesel_pool.get().await?;
    let rows = ExpiringStudent::list(&mut conn, Utc::now().date_naive(), days).await?;
    Ok(Json(rows))
}

/// Ordered by workout count, most active first
/// GET /v1/reports/attendance
#[utoipa::path(
    get,
    path = "/v1/reports/attendance",
    tag = "Reports",
    operation_id = "attendanceReport",
    params(DateRange),
    responses(
        (status = 200, description = "Workout counts per student", body = [AttendanceRow]),
        (status = 422, description = "Invalid date range", body = crate::utils::ErrorEnvelope)
    ),
    security(("bearerAuth" = []))
)]
pub async fn attendance(
    State(state): State<AppState>,
    ApiQuery(range): ApiQuery<DateRange>,
) -> ApiResult<Json<Vec<AttendanceRow>>> {
    range.check()?;
    let mut conn = state.diesel_pool.get().await?;
    Ok(Json(AttendanceRow::list(&mut conn, &range).await?))
}
