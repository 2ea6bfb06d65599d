// Role groups used by the route gates

use crate::models::staff::StaffRole;

/// Every staff role
pub const ALL_STAFF: &[StaffRole] = &[
    StaffRole::Administrador,
    StaffRole::Atendente,
    StaffRole::Instrutor,
];

/// Reception work: enrollments, payments, notices
pub const FRONT_DESK: &[StaffRole] = &[StaffRole::Administrador, StaffRole::Atendente];

/// Exercise catalog and workout programming
pub const TRAINING: &[StaffRole] = &[StaffRole::Administrador, StaffRole::Instrutor];

pub const ADMIN_ONLY: &[StaffRole] = &[StaffRole::Administrador];

pub struct PermissionConfig;

impl PermissionConfig {
    pub fn allows(group: &[StaffRole], role: StaffRole) -> bool {
        group.contains(&role)
    }

    /// Names of the groups a role belongs to, exposed on `/auth/me`
    pub fn groups_for(role: StaffRole) -> Vec<&'static str> {
        [
            ("all_staff", ALL_STAFF),
            ("front_desk", FRONT_DESK),
            ("training", TRAINING),
            ("admin_only", ADMIN_ONLY),
        ]
        .into_iter()
        .filter(|(_, group)| group.contains(&role))
        .map(|(name, _)| name)
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_membership() {
        assert!(PermissionConfig::allows(FRONT_DESK, StaffRole::Atendente));
        assert!(!PermissionConfig::allows(FRONT_DESK, StaffRole::Instrutor));
        assert!(PermissionConfig::allows(TRAINING, StaffRole::Instrutor));
        assert!(!PermissionConfig::allows(ADMIN_ONLY, StaffRole::Atendente));
        assert!(ALL_STAFF.iter().all(|r| PermissionConfig::allows(ALL_STAFF, *r)));
    }

    #[test]
    fn test_groups_for_role() {
        assert_eq!(
            PermissionConfig::groups_for(StaffRole::Administrador),
            vec!["all_staff", "front_desk", "training", "admin_only"]
        );
        assert_eq!(
            PermissionConfig::groups_for(StaffRole::Instrutor),
            vec!["all_staff", "training"]
        );
    }
}
