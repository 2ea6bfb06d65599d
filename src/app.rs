// Application state shared across handlers
use std::sync::Arc;

use crate::{
    app_config::AppConfig,
    db::DieselPool,
    services::{EmailService, EnrollmentTermService, JwtService, NotificationService},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub diesel_pool: DieselPool,
    pub jwt_service: Arc<JwtService>,
    pub email_service: Arc<EmailService>,
    pub notification_service: Arc<NotificationService>,
    pub enrollment_terms: Arc<EnrollmentTermService>,
    pub max_connections: u32,
}
