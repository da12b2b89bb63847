//! User domain values.

/// Role assigned to every newly registered account.
pub const DEFAULT_ROLE: &str = "user";

/// Role that unlocks administrative operations.
pub const ADMIN_ROLE: &str = "admin";

/// Whether the given role name grants administrative rights.
pub fn is_admin(role: &str) -> bool {
    role == ADMIN_ROLE
}
