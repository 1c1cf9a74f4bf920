//! Process-local [`UserStore`] used by tests and single-node tooling.

use std::collections::BTreeMap;

use chrono::Utc;
use parking_lot::Mutex;

use crate::auth::{AuthError, AuthResult};
use crate::users::store::{NewUser, UserRecord, UserStore, UserUpdate};

#[derive(Default)]
struct MemoryState {
    next_id: i32,
    users: BTreeMap<i32, UserRecord>,
}

impl MemoryState {
    fn email_taken(&self, email: &str, except: Option<i32>) -> bool {
        self.users
            .values()
            .any(|user| user.email == email && Some(user.id) != except)
    }
}

/// Every operation runs under a single lock, which serializes per-user
/// read-modify-write sequences.
#[derive(Default)]
pub struct InMemoryUserStore {
    state: Mutex<MemoryState>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[rocket::async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: i32) -> AuthResult<Option<UserRecord>> {
        Ok(self.state.lock().users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<UserRecord>> {
        let state = self.state.lock();
        Ok(state.users.values().find(|user| user.email == email).cloned())
    }

    async fn list(&self) -> AuthResult<Vec<UserRecord>> {
        Ok(self.state.lock().users.values().cloned().collect())
    }

    async fn create(&self, user: NewUser) -> AuthResult<UserRecord> {
        let mut state = self.state.lock();
        if state.email_taken(&user.email, None) {
            return Err(AuthError::Conflict("User already exists".into()));
        }

        state.next_id += 1;
        let now = Utc::now();
        let record = UserRecord {
            id: state.next_id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            refresh_token_hash: None,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update(&self, id: i32, update: UserUpdate) -> AuthResult<UserRecord> {
        let mut state = self.state.lock();
        if let Some(email) = &update.email {
            if state.email_taken(email, Some(id)) {
                return Err(AuthError::Conflict("User already exists".into()));
            }
        }

        let record = state.users.get_mut(&id).ok_or(AuthError::NotFound)?;
        if let Some(name) = update.name {
            record.name = name;
        }
        if let Some(email) = update.email {
            record.email = email;
        }
        if let Some(hash) = update.password_hash {
            record.password_hash = hash;
        }
        if let Some(role) = update.role {
            record.role = role;
        }
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn delete(&self, id: i32) -> AuthResult<()> {
        self.state
            .lock()
            .users
            .remove(&id)
            .map(|_| ())
            .ok_or(AuthError::NotFound)
    }

    async fn set_refresh_token_hash(&self, id: i32, hash: Option<String>) -> AuthResult<()> {
        let mut state = self.state.lock();
        let record = state.users.get_mut(&id).ok_or(AuthError::NotFound)?;
        record.refresh_token_hash = hash;
        Ok(())
    }

    async fn swap_refresh_token_hash(
        &self,
        id: i32,
        expected: &str,
        replacement: Option<String>,
    ) -> AuthResult<bool> {
        let mut state = self.state.lock();
        let Some(record) = state.users.get_mut(&id) else {
            return Ok(false);
        };
        if record.refresh_token_hash.as_deref() != Some(expected) {
            return Ok(false);
        }
        record.refresh_token_hash = replacement;
        Ok(true)
    }
}
