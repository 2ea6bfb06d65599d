// Shared query parameters and list envelopes

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::utils::ApiError;

/// Escapes LIKE wildcards so user text matches literally
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `%text%` pattern for substring search
pub fn contains_pattern(search: &str) -> String {
    format!("%{}%", escape_like(search))
}

/// Pagination parameters
#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
#[schema(example = json!({
    "page": 1,
    "per_page": 20
}))]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: i64,

    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

fn default_page() -> i64 {
    1
}
fn default_per_page() -> i64 {
    20
}

pub const MAX_PER_PAGE: i64 = 100;

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl Pagination {
    pub fn page(&self) -> i64 {
        self.page.max(1)
    }

    pub fn limit(&self) -> i64 {
        self.per_page.clamp(1, MAX_PER_PAGE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}

/// One page of results
#[derive(Debug, Clone, Serialize, ToSchema)]
#[aliases(
    PaginatedStaff = Paginated<crate::models::staff::StaffResponse>,
    PaginatedStudents = Paginated<crate::models::student::StudentResponse>,
    PaginatedPayments = Paginated<crate::models::payment::PaymentResponse>,
    PaginatedExercises = Paginated<crate::models::exercise::Exercise>,
    PaginatedWorkoutTemplates = Paginated<crate::models::workout_template::WorkoutTemplate>,
    PaginatedWorkoutLogs = Paginated<crate::models::workout_log::WorkoutLog>,
    PaginatedNotifications = Paginated<crate::models::notification::Notification>,
    PaginatedFeedback = Paginated<crate::models::feedback::Feedback>
)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, pagination: &Pagination) -> Self {
        let per_page = pagination.limit();
        Self {
            items,
            total,
            page: pagination.page(),
            per_page,
            total_pages: (total + per_page - 1) / per_page,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            total_pages: self.total_pages,
        }
    }
}

/// Inclusive date range filter used by list and report endpoints
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn check(&self) -> Result<(), ApiError> {
        match (self.from, self.to) {
            (Some(from), Some(to)) if from > to => {
                Err(ApiError::field("from", "`from` must not be after `to`"))
            },
            _ => Ok(()),
        }
    }
}

/// Generic "count of deleted/affected rows" response
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CountResponse {
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_escaping() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b\\c"), "a\\_b\\\\c");
        assert_eq!(contains_pattern("supino"), "%supino%");
    }

    #[test]
    fn test_pagination_bounds() {
        let p = Pagination {
            page: 0,
            per_page: 1000,
        };
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), MAX_PER_PAGE);
        assert_eq!(p.offset(), 0);

        let p = Pagination {
            page: 3,
            per_page: 10,
        };
        assert_eq!(p.offset(), 20);
    }

    #[test]
    fn test_total_pages() {
        let page: Paginated<u8> = Paginated::new(vec![], 41, &Pagination::default());
        assert_eq!(page.total_pages, 3);
        let empty: Paginated<u8> = Paginated::new(vec![], 0, &Pagination::default());
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn test_date_range_check() {
        let range = DateRange {
            from: NaiveDate::from_ymd_opt(2024, 5, 2),
            to: NaiveDate::from_ymd_opt(2024, 5, 1),
        };
        assert!(range.check().is_err());
        assert!(DateRange::default().check().is_ok());
    }
}
