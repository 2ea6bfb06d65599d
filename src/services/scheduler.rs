// Cron job for the plan expiry sweep

use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use tracing::{error, info};

use crate::services::notification::NotificationService;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] JobSchedulerError),
}

/// Starts the scheduler running the expiry sweep on `cron` (six fields, UTC)
///
/// The returned handle must be kept alive for the job to keep firing.
pub async fn start_notification_scheduler(
    notifications: Arc<NotificationService>,
    cron: &str,
) -> Result<JobScheduler, SchedulerError> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let notifications = notifications.clone();

        Box::pin(async move {
            let today = Utc::now().date_naive();
            match notifications.run_expiry_sweep(today).await {
                Ok(report) => info!(
                    expiring_notified = report.expiring_notified,
                    expired_deactivated = report.expired_deactivated,
                    "Scheduled expiry sweep completed"
                ),
                Err(e) => error!("Scheduled expiry sweep failed: {}", e),
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    info!(cron = %cron, "Notification scheduler started");
    Ok(scheduler)
}
