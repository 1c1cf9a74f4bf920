use std::fmt;

use chrono::{DateTime, Utc};

use crate::auth::AuthResult;
use crate::auth::responses::Role;

/// Persisted account row.
#[derive(Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    /// Digest of the single live refresh token; `None` means no active session.
    pub refresh_token_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn has_session(&self) -> bool {
        self.refresh_token_hash.is_some()
    }
}

// Digests stay out of log output.
impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("has_session", &self.has_session())
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish_non_exhaustive()
    }
}

/// Values for a new row; the password is already hashed.
#[derive(Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Column updates applied by [`UserStore::update`]; `None` leaves a column untouched.
#[derive(Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.password_hash.is_none()
            && self.role.is_none()
    }
}

/// Ownership of account rows.
///
/// Implementations must make [`UserStore::swap_refresh_token_hash`] atomic per
/// user: of two callers presenting the same `expected` digest, exactly one may
/// observe `true`.
#[rocket::async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: i32) -> AuthResult<Option<UserRecord>>;

    /// Exact, case-sensitive email match.
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<UserRecord>>;

    async fn list(&self) -> AuthResult<Vec<UserRecord>>;

    /// Fails with `Conflict` when the email is taken.
    async fn create(&self, user: NewUser) -> AuthResult<UserRecord>;

    /// Fails with `NotFound` for an unknown id and `Conflict` for a taken email.
    async fn update(&self, id: i32, update: UserUpdate) -> AuthResult<UserRecord>;

    /// Removes the row, which also ends any session it held.
    async fn delete(&self, id: i32) -> AuthResult<()>;

    /// Unconditionally overwrite (or clear) the stored refresh-token digest.
    async fn set_refresh_token_hash(&self, id: i32, hash: Option<String>) -> AuthResult<()>;

    /// Replace the stored digest only if it still equals `expected`.
    async fn swap_refresh_token_hash(
        &self,
        id: i32,
        expected: &str,
        replacement: Option<String>,
    ) -> AuthResult<bool>;
}
