// Staff accounts (administrador, atendente, instrutor)

use chrono::{DateTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::common::Pagination;
use crate::schema::staff;
use crate::utils::validation::validate_not_blank;

/// Cargo of a staff member
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
    Administrador,
    Atendente,
    Instrutor,
}

impl StaffRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaffRole::Administrador => "administrador",
            StaffRole::Atendente => "atendente",
            StaffRole::Instrutor => "instrutor",
        }
    }
}

impl FromStr for StaffRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "administrador" => Ok(StaffRole::Administrador),
            "atendente" => Ok(StaffRole::Atendente),
            "instrutor" => Ok(StaffRole::Instrutor),
            _ => Err(format!("Invalid staff role: {}", s)),
        }
    }
}

impl std::fmt::Display for StaffRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Staff database model
#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = staff)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Staff {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = staff)]
pub struct NewStaff {
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = staff)]
pub struct StaffUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
    pub updated_at: Option<DateTime<Utc>>,
}

// =============================================================================
// REQUEST / RESPONSE DTOs
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateStaffRequest {
    #[validate(length(min = 1, max = 255, message = "Full name must be 1 to 255 characters"))]
    #[validate(custom(function = "validate_not_blank"))]
    pub full_name: String,

    #[validate(email(message = "Invalid email format"))]
    #[validate(length(max = 320, message = "Email must be less than 320 characters"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "Password must be 8 to 128 characters"))]
    pub password: String,

    pub role: StaffRole,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateStaffRequest {
    #[validate(length(min = 1, max = 255, message = "Full name must be 1 to 255 characters"))]
    #[validate(custom(function = "validate_not_blank"))]
    pub full_name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub role: Option<StaffRole>,

    pub is_active: Option<bool>,

    /// Administrative password reset
    #[validate(length(min = 8, max = 128, message = "Password must be 8 to 128 characters"))]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
pub struct StaffFilter {
    pub role: Option<StaffRole>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StaffResponse {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: String,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Staff> for StaffResponse {
    fn from(staff: Staff) -> Self {
        Self {
            id: staff.id,
            full_name: staff.full_name,
            email: staff.email,
            role: staff.role,
            is_active: staff.is_active,
            last_login_at: staff.last_login_at,
            created_at: staff.created_at,
            updated_at: staff.updated_at,
        }
    }
}

// =============================================================================
// QUERIES
// =============================================================================

fn filtered(filter: &StaffFilter) -> staff::BoxedQuery<'static, Pg> {
    let mut query = staff::table.into_boxed();
    if let Some(role) = filter.role {
        query = query.filter(staff::role.eq(role.as_str()));
    }
    if let Some(active) = filter.is_active {
        query = query.filter(staff::is_active.eq(active));
    }
    query
}

impl Staff {
    /// Parsed role; unknown values are never granted any group
    pub fn role_enum(&self) -> Option<StaffRole> {
        StaffRole::from_str(&self.role).ok()
    }

    pub async fn find_by_id(
        conn: &mut AsyncPgConnection,
        staff_id: Uuid,
    ) -> QueryResult<Option<Self>> {
        staff::table
            .find(staff_id)
            .select(Staff::as_select())
            .first(conn)
            .await
            .optional()
    }

    /// Lookup by normalized (lowercase) email
    pub async fn find_by_email(
        conn: &mut AsyncPgConnection,
        email: &str,
    ) -> QueryResult<Option<Self>> {
        staff::table
            .filter(staff::email.eq(email))
            .select(Staff::as_select())
            .first(conn)
            .await
            .optional()
    }

    pub async fn count(conn: &mut AsyncPgConnection) -> QueryResult<i64> {
        staff::table.count().get_result(conn).await
    }

    pub async fn list(
        conn: &mut AsyncPgConnection,
        filter: &StaffFilter,
        pagination: &Pagination,
    ) -> QueryResult<(Vec<Self>, i64)> {
        let total = filtered(filter).count().get_result::<i64>(conn).await?;
        let items = filtered(filter)
            .order(staff::full_name.asc())
            .limit(pagination.limit())
            .offset(pagination.offset())
            .select(Staff::as_select())
            .load(conn)
            .await?;
        Ok((items, total))
    }

    pub async fn create(conn: &mut AsyncPgConnection, new_staff: NewStaff) -> QueryResult<Self> {
        diesel::insert_into(staff::table)
            .values(&new_staff)
            .returning(Staff::as_returning())
            .get_result(conn)
            .await
    }

    pub async fn update(
        conn: &mut AsyncPgConnection,
        staff_id: Uuid,
        mut changes: StaffUpdate,
    ) -> QueryResult<Option<Self>> {
        changes.updated_at = Some(Utc::now());
        diesel::update(staff::table.find(staff_id))
            .set(&changes)
            .returning(Staff::as_returning())
            .get_result(conn)
            .await
            .optional()
    }

    pub async fn touch_last_login(conn: &mut AsyncPgConnection, staff_id: Uuid) -> QueryResult<()> {
        diesel::update(staff::table.find(staff_id))
            .set(staff::last_login_at.eq(Some(Utc::now())))
            .execute(conn)
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_through_str() {
        for role in [
            StaffRole::Administrador,
            StaffRole::Atendente,
            StaffRole::Instrutor,
        ] {
            assert_eq!(StaffRole::from_str(role.as_str()), Ok(role));
        }
        assert!(StaffRole::from_str("aluno").is_err());
    }

    #[test]
    fn test_role_serde_uses_portuguese_names() {
        let json = serde_json::to_string(&StaffRole::Atendente).unwrap();
        assert_eq!(json, "\"atendente\"");
        let parsed: StaffRole = serde_json::from_str("\"instrutor\"").unwrap();
        assert_eq!(parsed, StaffRole::Instrutor);
    }

    #[test]
    fn test_create_request_validation() {
        let request = CreateStaffRequest {
            full_name: "   ".to_string(),
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            role: StaffRole::Atendente,
        };
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("full_name"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }
}
