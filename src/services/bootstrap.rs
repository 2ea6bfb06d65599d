// First administrator account, created on an empty staff table

use tracing::{info, warn};

use crate::app_config::AppConfig;
use crate::db::DieselPool;
use crate::models::staff::{NewStaff, Staff, StaffRole};
use crate::utils::{hash_password, normalize_email, ApiError};

/// Creates the configured administrator when no staff account exists yet.
///
/// Returns the created account, or `None` when nothing had to be done.
pub async fn ensure_initial_admin(
    pool: &DieselPool,
    config: &AppConfig,
) -> Result<Option<Staff>, ApiError> {
    let mut conn = pool.get().await?;
    if Staff::count(&mut conn).await? > 0 {
        return Ok(None);
    }

    let (Some(email), Some(password)) = (
        config.bootstrap.admin_email.as_deref(),
        config.bootstrap.admin_password.as_deref(),
    ) else {
        warn!("No staff accounts exist and BOOTSTRAP_ADMIN_EMAIL/BOOTSTRAP_ADMIN_PASSWORD are not set");
        return Ok(None);
    };

    if password.len() < config.security.min_password_length {
        warn!(
            "Bootstrap admin password is shorter than {} characters, skipping",
            config.security.min_password_length
        );
        return Ok(None);
    }

    let password_hash = hash_password(password, config.security.bcrypt_cost).await?;
    let admin = Staff::create(
        &mut conn,
        NewStaff {
            full_name: config.bootstrap.admin_name.trim().to_string(),
            email: normalize_email(email),
            password_hash,
            role: StaffRole::Administrador.as_str().to_string(),
        },
    )
    .await?;

    info!(staff_id = %admin.id, email = %admin.email, "Initial administrator created");
    Ok(Some(admin))
}
