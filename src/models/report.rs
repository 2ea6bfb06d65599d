// Read-only aggregate reports for administrators

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use diesel::dsl::{count_star, max};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::common::DateRange;
use crate::models::payment::PaymentStatus;
use crate::models::student::StudentStatus;
use crate::schema::{payments, plans, students, workout_logs};

pub const NEW_ENROLLMENT_WINDOW_DAYS: i64 = 30;
pub const DEFAULT_EXPIRING_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct MethodTotal {
    pub method: String,
    pub total_cents: i64,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct MonthTotal {
    /// `YYYY-MM`
    pub month: String,
    pub total_cents: i64,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RevenueReport {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub total_cents: i64,
    pub payment_count: i64,
    pub by_method: Vec<MethodTotal>,
    pub by_month: Vec<MonthTotal>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlanCount {
    pub plan_id: Uuid,
    pub plan_name: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StudentsReport {
    pub total: i64,
    pub by_status: Vec<StatusCount>,
    pub by_plan: Vec<PlanCount>,
    pub without_plan: i64,
    pub new_last_30_days: i64,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ExpiringQuery {
    /// Window in days (default 7)
    pub days: Option<i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ExpiringStudent {
    pub student_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub plan_expires_at: NaiveDate,
    /// Negative when already expired
    pub days_remaining: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AttendanceRow {
    pub student_id: Uuid,
    pub full_name: String,
    pub workouts: i64,
    pub last_workout_at: Option<DateTime<Utc>>,
}

fn day_start(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc())
}

/// Half-open `[lower, upper)` instant range; open ends fall back to far bounds
fn attendance_bounds(range: &DateRange) -> (DateTime<Utc>, DateTime<Utc>) {
    let lower = range
        .from
        .and_then(day_start)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    let upper = range
        .to
        .and_then(|d| d.succ_opt())
        .and_then(day_start)
        .or_else(|| NaiveDate::from_ymd_opt(9999, 12, 31).and_then(day_start))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    (lower, upper)
}

impl RevenueReport {
    /// Folds `(method, amount_cents, paid_at)` rows into totals
    pub fn from_rows(range: &DateRange, rows: &[(String, i32, DateTime<Utc>)]) -> Self {
        let mut by_method: BTreeMap<&str, (i64, i64)> = BTreeMap::new();
        let mut by_month: BTreeMap<String, (i64, i64)> = BTreeMap::new();
        let mut total_cents = 0i64;

        for (method, amount, paid_at) in rows {
            let amount = i64::from(*amount);
            total_cents += amount;

            let slot = by_method.entry(method.as_str()).or_default();
            slot.0 += amount;
            slot.1 += 1;

            let month = format!("{:04}-{:02}", paid_at.year(), paid_at.month());
            let slot = by_month.entry(month).or_default();
            slot.0 += amount;
            slot.1 += 1;
        }

        Self {
            from: range.from,
            to: range.to,
            total_cents,
            payment_count: rows.len() as i64,
            by_method: by_method
                .into_iter()
                .map(|(method, (total_cents, count))| MethodTotal {
                    method: method.to_string(),
                    total_cents,
                    count,
                })
                .collect(),
            by_month: by_month
                .into_iter()
                .map(|(month, (total_cents, count))| MonthTotal {
                    month,
                    total_cents,
                    count,
                })
                .collect(),
        }
    }

    pub async fn generate(conn: &mut AsyncPgConnection, range: &DateRange) -> QueryResult<Self> {
        let mut query = payments::table
            .filter(payments::status.eq(PaymentStatus::Completed.as_str()))
            .into_boxed();
        if let Some(from) = range.from.and_then(day_start) {
            query = query.filter(payments::paid_at.ge(from));
        }
        if let Some(to) = range.to.and_then(|d| d.succ_opt()).and_then(day_start) {
            query = query.filter(payments::paid_at.lt(to));
        }
        let rows: Vec<(String, i32, DateTime<Utc>)> = query
            .select((payments::method, payments::amount_cents, payments::paid_at))
            .load(conn)
            .await?;
        Ok(Self::from_rows(range, &rows))
    }
}

impl StudentsReport {
    pub async fn generate(conn: &mut AsyncPgConnection, today: NaiveDate) -> QueryResult<Self> {
        let by_status: Vec<(String, i64)> = students::table
            .group_by(students::status)
            .select((students::status, count_star()))
            .order(students::status.asc())
            .load(conn)
            .await?;

        let plan_counts: Vec<(Option<Uuid>, i64)> = students::table
            .group_by(students::plan_id)
            .select((students::plan_id, count_star()))
            .load(conn)
            .await?;

        let plan_ids: Vec<Uuid> = plan_counts.iter().filter_map(|(id, _)| *id).collect();
        let names: HashMap<Uuid, String> = plans::table
            .filter(plans::id.eq_any(plan_ids))
            .select((plans::id, plans::name))
            .load::<(Uuid, String)>(conn)
            .await?
            .into_iter()
            .collect();

        let window_start = today - Duration::days(NEW_ENROLLMENT_WINDOW_DAYS);
        let new_last_30_days: i64 = students::table
            .filter(students::enrollment_date.ge(window_start))
            .count()
            .get_result(conn)
            .await?;

        let mut without_plan = 0;
        let mut by_plan = Vec::new();
        for (plan_id, count) in plan_counts {
            match plan_id {
                Some(plan_id) => by_plan.push(PlanCount {
                    plan_id,
                    plan_name: names.get(&plan_id).cloned().unwrap_or_default(),
                    count,
                }),
                None => without_plan = count,
            }
        }
        by_plan.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.plan_name.cmp(&b.plan_name)));

        Ok(Self {
            total: by_status.iter().map(|(_, c)| c).sum(),
            by_status: by_status
                .into_iter()
                .map(|(status, count)| StatusCount { status, count })
                .collect(),
            by_plan,
            without_plan,
            new_last_30_days,
        })
    }
}

impl ExpiringStudent {
    /// Active students whose plan ends within `days` of `today`, including already expired
    pub async fn list(
        conn: &mut AsyncPgConnection,
        today: NaiveDate,
        days: i64,
    ) -> QueryResult<Vec<Self>> {
        let limit = today + Duration::days(days);
        let rows: Vec<(Uuid, String, String, Option<String>, Option<NaiveDate>)> = students::table
            .filter(students::status.eq(StudentStatus::Active.as_str()))
            .filter(students::plan_expires_at.le(limit))
            .order(students::plan_expires_at.asc())
            .select((
                students::id,
                students::full_name,
                students::email,
                students::phone,
                students::plan_expires_at,
            ))
            .load(conn)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(student_id, full_name, email, phone, expires)| {
                expires.map(|plan_expires_at| ExpiringStudent {
                    student_id,
                    full_name,
                    email,
                    phone,
                    plan_expires_at,
                    days_remaining: (plan_expires_at - today).num_days(),
                })
            })
            .collect())
    }
}

impl AttendanceRow {
    pub async fn list(conn: &mut AsyncPgConnection, range: &DateRange) -> QueryResult<Vec<Self>> {
        let (lower, upper) = attendance_bounds(range);
        let rows: Vec<(Uuid, String, i64, Option<DateTime<Utc>>)> = workout_logs::table
            .inner_join(students::table)
            .filter(workout_logs::performed_at.ge(lower))
            .filter(workout_logs::performed_at.lt(upper))
            .group_by((students::id, students::full_name))
            .select((
                students::id,
                students::full_name,
                count_star(),
                max(workout_logs::performed_at),
            ))
            .load(conn)
            .await?;

        let mut rows: Vec<Self> = rows
            .into_iter()
            .map(|(student_id, full_name, workouts, last_workout_at)| AttendanceRow {
                student_id,
                full_name,
                workouts,
                last_workout_at,
            })
            .collect();
        rows.sort_by(|a, b| {
            b.workouts
                .cmp(&a.workouts)
                .then_with(|| a.full_name.cmp(&b.full_name))
        });
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_revenue_folding() {
        let at = |y, m, d| Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap();
        let rows = vec![
            ("pix".to_string(), 10000, at(2024, 1, 10)),
            ("cash".to_string(), 5000, at(2024, 1, 20)),
            ("pix".to_string(), 12000, at(2024, 2, 1)),
        ];
        let report = RevenueReport::from_rows(&DateRange::default(), &rows);

        assert_eq!(report.total_cents, 27000);
        assert_eq!(report.payment_count, 3);
        assert_eq!(
            report.by_method,
            vec![
                MethodTotal { method: "cash".into(), total_cents: 5000, count: 1 },
                MethodTotal { method: "pix".into(), total_cents: 22000, count: 2 },
            ]
        );
        assert_eq!(
            report.by_month,
            vec![
                MonthTotal { month: "2024-01".into(), total_cents: 15000, count: 2 },
                MonthTotal { month: "2024-02".into(), total_cents: 12000, count: 1 },
            ]
        );
    }

    #[test]
    fn test_empty_revenue() {
        let report = RevenueReport::from_rows(&DateRange::default(), &[]);
        assert_eq!(report.total_cents, 0);
        assert!(report.by_method.is_empty());
    }

    #[test]
    fn test_attendance_bounds_inclusive_end_day() {
        let range = DateRange {
            from: NaiveDate::from_ymd_opt(2024, 3, 1),
            to: NaiveDate::from_ymd_opt(2024, 3, 31),
        };
        let (lower, upper) = attendance_bounds(&range);
        assert_eq!(lower, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(upper, Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_attendance_bounds_open_range() {
        let (lower, upper) = attendance_bounds(&DateRange::default());
        assert_eq!(lower, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(upper.year(), 9999);
    }
}
