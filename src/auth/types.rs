//! Authenticated identity types.

use serde::Serialize;

use crate::db::User;

/// The identity attached to an authenticated request.
///
/// A redacted view of the user record: secret columns (password hash,
/// stored refresh token) are never copied in, so serializing this cannot
/// leak them.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    /// Database user ID, for store lookups only
    #[serde(skip)]
    pub id: i64,
    pub uuid: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub created_at: String,
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            uuid: user.uuid,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            created_at: user.created_at,
        }
    }
}
