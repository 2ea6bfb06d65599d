// Aluno: academy members

use chrono::{DateTime, NaiveDate, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::common::{contains_pattern, Pagination};
use crate::models::plan::{Plan, PlanSummary};
use crate::schema::{payments, plans, students};
use crate::utils::validation::{
    validate_clearable_phone, validate_cpf, validate_not_blank, validate_phone,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StudentStatus {
    Active,
    Inactive,
    Suspended,
}

impl StudentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StudentStatus::Active => "active",
            StudentStatus::Inactive => "inactive",
            StudentStatus::Suspended => "suspended",
        }
    }
}

impl FromStr for StudentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(StudentStatus::Active),
            "inactive" => Ok(StudentStatus::Inactive),
            "suspended" => Ok(StudentStatus::Suspended),
            _ => Err(format!("Invalid student status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = students)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Student {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub cpf: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub plan_id: Option<Uuid>,
    pub status: String,
    pub enrollment_date: NaiveDate,
    pub plan_expires_at: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = students)]
pub struct NewStudent {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub cpf: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub plan_id: Option<Uuid>,
    pub status: String,
    pub enrollment_date: NaiveDate,
    pub notes: Option<String>,
}

/// `None` leaves a column untouched, `Some(None)` writes NULL
#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = students)]
pub struct StudentUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<Option<String>>,
    pub cpf: Option<Option<String>>,
    pub birth_date: Option<Option<NaiveDate>>,
    pub address: Option<Option<String>>,
    pub emergency_contact: Option<Option<String>>,
    pub plan_id: Option<Option<Uuid>>,
    pub status: Option<String>,
    pub enrollment_date: Option<NaiveDate>,
    pub plan_expires_at: Option<Option<NaiveDate>>,
    pub notes: Option<Option<String>>,
    pub updated_at: Option<DateTime<Utc>>,
}

// =============================================================================
// REQUEST / RESPONSE DTOs
// =============================================================================

/// Distinguishes an absent field from an explicit `null`
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "full_name": "Maria Oliveira",
    "email": "maria@example.com",
    "phone": "(11) 98765-4321",
    "cpf": "529.982.247-25",
    "birth_date": "1995-04-12",
    "plan_id": "123e4567-e89b-12d3-a456-426614174000"
}))]
pub struct CreateStudentRequest {
    #[validate(length(min = 1, max = 255, message = "Full name must be 1 to 255 characters"))]
    #[validate(custom(function = "validate_not_blank"))]
    pub full_name: String,

    #[validate(email(message = "Invalid email format"))]
    #[validate(length(max = 320))]
    pub email: String,

    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,

    #[validate(custom(function = "validate_cpf"))]
    pub cpf: Option<String>,

    pub birth_date: Option<NaiveDate>,

    #[validate(length(max = 500))]
    pub address: Option<String>,

    #[validate(length(max = 255))]
    pub emergency_contact: Option<String>,

    pub plan_id: Option<Uuid>,

    /// Defaults to today
    pub enrollment_date: Option<NaiveDate>,

    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateStudentRequest {
    #[validate(length(min = 1, max = 255, message = "Full name must be 1 to 255 characters"))]
    #[validate(custom(function = "validate_not_blank"))]
    pub full_name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    #[validate(length(max = 320))]
    pub email: Option<String>,

    /// Empty string clears the value
    #[validate(custom(function = "validate_clearable_phone"))]
    pub phone: Option<String>,

    /// Empty string clears the value
    pub cpf: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<NaiveDate>, nullable)]
    pub birth_date: Option<Option<NaiveDate>>,

    #[validate(length(max = 500))]
    pub address: Option<String>,

    #[validate(length(max = 255))]
    pub emergency_contact: Option<String>,

    /// `null` detaches the student from any plan
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>, nullable)]
    pub plan_id: Option<Option<Uuid>>,

    pub status: Option<StudentStatus>,

    pub enrollment_date: Option<NaiveDate>,

    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct StudentFilter {
    /// Matches name, email or CPF digits
    pub search: Option<String>,
    pub status: Option<StudentStatus>,
    pub plan_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StudentResponse {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub cpf: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub status: String,
    pub enrollment_date: NaiveDate,
    pub plan_expires_at: Option<NaiveDate>,
    pub plan: Option<PlanSummary>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    pub fn into_response(self, plan: Option<&Plan>) -> StudentResponse {
        StudentResponse {
            id: self.id,
            full_name: self.full_name,
            email: self.email,
            phone: self.phone,
            cpf: self.cpf,
            birth_date: self.birth_date,
            address: self.address,
            emergency_contact: self.emergency_contact,
            status: self.status,
            enrollment_date: self.enrollment_date,
            plan_expires_at: self.plan_expires_at,
            plan: plan.map(PlanSummary::from),
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == StudentStatus::Active.as_str()
    }
}

// =============================================================================
// QUERIES
// =============================================================================

fn filtered(filter: &StudentFilter) -> students::BoxedQuery<'static, Pg> {
    let mut query = students::table.into_boxed();

    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = contains_pattern(search);
        let digits: String = search.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.len() >= 3 {
            query = query.filter(
                students::full_name
                    .ilike(pattern.clone())
                    .or(students::email.ilike(pattern))
                    .or(students::cpf.like(format!("%{}%", digits))),
            );
        } else {
            query = query.filter(
                students::full_name
                    .ilike(pattern.clone())
                    .or(students::email.ilike(pattern)),
            );
        }
    }
    if let Some(status) = filter.status {
        query = query.filter(students::status.eq(status.as_str()));
    }
    if let Some(plan_id) = filter.plan_id {
        query = query.filter(students::plan_id.eq(plan_id));
    }
    query
}

impl Student {
    pub async fn find_by_id(
        conn: &mut AsyncPgConnection,
        student_id: Uuid,
    ) -> QueryResult<Option<Self>> {
        students::table
            .find(student_id)
            .select(Student::as_select())
            .first(conn)
            .await
            .optional()
    }

    /// Student together with the plan row it points at
    pub async fn find_with_plan(
        conn: &mut AsyncPgConnection,
        student_id: Uuid,
    ) -> QueryResult<Option<(Self, Option<Plan>)>> {
        students::table
            .left_join(plans::table)
            .filter(students::id.eq(student_id))
            .select((Student::as_select(), Option::<Plan>::as_select()))
            .first(conn)
            .await
            .optional()
    }

    pub async fn exists(conn: &mut AsyncPgConnection, student_id: Uuid) -> QueryResult<bool> {
        diesel::select(diesel::dsl::exists(students::table.find(student_id)))
            .get_result(conn)
            .await
    }

    pub async fn list(
        conn: &mut AsyncPgConnection,
        filter: &StudentFilter,
        pagination: &Pagination,
    ) -> QueryResult<(Vec<StudentResponse>, i64)> {
        let total = filtered(filter).count().get_result::<i64>(conn).await?;
        let rows = filtered(filter)
            .order(students::full_name.asc())
            .limit(pagination.limit())
            .offset(pagination.offset())
            .select(Student::as_select())
            .load(conn)
            .await?;

        let plan_ids: Vec<Uuid> = rows.iter().filter_map(|s| s.plan_id).collect();
        let plans_by_id: HashMap<Uuid, Plan> = if plan_ids.is_empty() {
            HashMap::new()
        } else {
            plans::table
                .filter(plans::id.eq_any(plan_ids))
                .select(Plan::as_select())
                .load(conn)
                .await?
                .into_iter()
                .map(|p| (p.id, p))
                .collect()
        };

        let items = rows
            .into_iter()
            .map(|s| {
                let plan = s.plan_id.and_then(|id| plans_by_id.get(&id));
                s.into_response(plan)
            })
            .collect();
        Ok((items, total))
    }

    pub async fn create(conn: &mut AsyncPgConnection, new_student: NewStudent) -> QueryResult<Self> {
        diesel::insert_into(students::table)
            .values(&new_student)
            .returning(Student::as_returning())
            .get_result(conn)
            .await
    }

    pub async fn update(
        conn: &mut AsyncPgConnection,
        student_id: Uuid,
        mut changes: StudentUpdate,
    ) -> QueryResult<Option<Self>> {
        changes.updated_at = Some(Utc::now());
        diesel::update(students::table.find(student_id))
            .set(&changes)
            .returning(Student::as_returning())
            .get_result(conn)
            .await
            .optional()
    }

    pub async fn has_payments(conn: &mut AsyncPgConnection, student_id: Uuid) -> QueryResult<bool> {
        diesel::select(diesel::dsl::exists(
            payments::table.filter(payments::student_id.eq(student_id)),
        ))
        .get_result(conn)
        .await
    }

    pub async fn delete(conn: &mut AsyncPgConnection, student_id: Uuid) -> QueryResult<usize> {
        diesel::delete(students::table.find(student_id))
            .execute(conn)
            .await
    }

    /// Active students whose plan ends within `[from, to]`
    pub async fn expiring_between(
        conn: &mut AsyncPgConnection,
        from: NaiveDate,
        to: NaiveDate,
    ) -> QueryResult<Vec<Self>> {
        students::table
            .filter(students::status.eq(StudentStatus::Active.as_str()))
            .filter(students::plan_expires_at.between(from, to))
            .order(students::plan_expires_at.asc())
            .select(Student::as_select())
            .load(conn)
            .await
    }

    /// Active students whose plan ended before `today`
    pub async fn expired_before(
        conn: &mut AsyncPgConnection,
        today: NaiveDate,
    ) -> QueryResult<Vec<Self>> {
        students::table
            .filter(students::status.eq(StudentStatus::Active.as_str()))
            .filter(students::plan_expires_at.lt(today))
            .order(students::plan_expires_at.asc())
            .select(Student::as_select())
            .load(conn)
            .await
    }

    pub async fn set_status(
        conn: &mut AsyncPgConnection,
        student_id: Uuid,
        status: StudentStatus,
    ) -> QueryResult<usize> {
        diesel::update(students::table.find(student_id))
            .set((
                students::status.eq(status.as_str()),
                students::updated_at.eq(Utc::now()),
            ))
            .execute(conn)
            .await
    }

    pub async fn active_ids(conn: &mut AsyncPgConnection) -> QueryResult<Vec<(Uuid, String, String)>> {
        students::table
            .filter(students::status.eq(StudentStatus::Active.as_str()))
            .order(students::full_name.asc())
            .select((students::id, students::full_name, students::email))
            .load(conn)
            .await
    }
}
