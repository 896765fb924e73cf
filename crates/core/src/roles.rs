//! Well-known role name constants.
//!
//! These must match the `users.role` values written by the accounts service.

/// Staff role: sees every audit record.
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";

/// Whether the role may read audit records of other actors.
pub fn is_privileged(role: &str) -> bool {
    role == ROLE_ADMIN
}
