// Audit logging for all create/update/delete operations
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum AuditAction {
    Created,
    Updated,
    Deleted,
    Deactivated,
    Cancelled,
    Sent,
    LoggedIn,
    PasswordChanged,
    DocumentIssued,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Staff,
    Student,
    Plan,
    Payment,
    Exercise,
    WorkoutTemplate,
    WorkoutLog,
    Notification,
    Feedback,
    EnrollmentTerm,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: Uuid,
    pub action: AuditAction,
    pub actor_id: Option<Uuid>,
    pub resource_type: ResourceType,
    pub resource_id: Option<Uuid>,
    pub details: Option<String>,
    pub timestamp: DateTime<Utc>,
}

pub struct AuditLogger;

impl AuditLogger {
    /// Emit one audit event on the `audit` tracing target as a JSON line
    pub fn log(
        action: AuditAction,
        actor_id: Option<Uuid>,
        resource_type: ResourceType,
        resource_id: Option<Uuid>,
        details: Option<String>,
    ) {
        let audit_log = AuditLog {
            id: Uuid::new_v4(),
            action,
            actor_id,
            resource_type,
            resource_id,
            details,
            timestamp: Utc::now(),
        };

        let json_log = serde_json::to_string(&audit_log).unwrap_or_else(|e| {
            warn!("Failed to serialize audit log: {}", e);
            format!("{:?}", audit_log)
        });

        info!(target: "audit", "{}", json_log);
    }

    /// Shorthand for staff-initiated actions
    pub fn staff_action(
        action: AuditAction,
        actor_id: Uuid,
        resource_type: ResourceType,
        resource_id: Uuid,
    ) {
        Self::log(action, Some(actor_id), resource_type, Some(resource_id), None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_log_serializes_resource_type_snake_case() {
        let log = AuditLog {
            id: Uuid::nil(),
            action: AuditAction::Created,
            actor_id: None,
            resource_type: ResourceType::WorkoutTemplate,
            resource_id: None,
            details: None,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json["resource_type"], "workout_template");
        assert_eq!(json["action"], "Created");
    }
}
