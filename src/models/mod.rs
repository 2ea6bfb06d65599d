pub mod auth;
pub mod common;
pub mod exercise;
pub mod feedback;
pub mod notification;
pub mod payment;
pub mod plan;
pub mod report;
pub mod staff;
pub mod student;
pub mod workout_log;
pub mod workout_template;

// Re-export common types
pub use auth::*;
pub use common::{CountResponse, DateRange, Paginated, Pagination};
pub use exercise::Exercise;
pub use feedback::Feedback;
pub use notification::Notification;
pub use payment::{Payment, PaymentMethod, PaymentResponse, PaymentStatus};
pub use plan::Plan;
pub use staff::{Staff, StaffResponse, StaffRole};
pub use student::{Student, StudentResponse, StudentStatus};
pub use workout_log::WorkoutLog;
pub use workout_template::WorkoutTemplate;
