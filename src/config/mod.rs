// Static configuration modules

pub mod permissions;

pub use permissions::{PermissionConfig, ADMIN_ONLY, ALL_STAFF, FRONT_DESK, TRAINING};
