//! Well-known role name constants.
//!
//! The role is derived from `users.is_admin` when a token is issued.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";

/// Role name for a user row.
pub fn role_for(is_admin: bool) -> &'static str {
    if is_admin {
        ROLE_ADMIN
    } else {
        ROLE_USER
    }
}
