// Services module
// Business logic that spans several models or talks to the outside world

pub mod bootstrap;
pub mod email;
pub mod enrollment_term;
pub mod jwt;
pub mod notification;
pub mod payment;
pub mod scheduler;
pub mod workout;

// Re-export commonly used services
pub use bootstrap::ensure_initial_admin;
pub use email::{EmailError, EmailService};
pub use enrollment_term::{DocumentError, EnrollmentTermService};
pub use jwt::{JwtConfig, JwtError, JwtService};
pub use notification::{NotificationBatch, NotificationService};
pub use payment::{PaymentService, RecordedPayment};
pub use scheduler::{start_notification_scheduler, SchedulerError};
pub use workout::WorkoutService;
