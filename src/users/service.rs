use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::auth::authorization::AuthorizationPolicy;
use crate::auth::guards::Principal;
use crate::auth::passwords::PasswordService;
use crate::auth::policy::PasswordPolicy;
use crate::auth::responses::Role;
use crate::auth::{AuthError, AuthResult};
use crate::users::store::{NewUser, UserRecord, UserStore, UserUpdate};

/// Account creation payload.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewAccount {
    #[validate(
        custom(function = "not_blank", message = "name is required"),
        length(max = 100, message = "name must be at most 100 characters")
    )]
    pub name: String,
    #[validate(
        email(message = "email must be a valid address"),
        length(max = 150, message = "email must be at most 150 characters")
    )]
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

/// Partial account update; absent fields are left as they are.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UserChanges {
    #[serde(default)]
    #[validate(
        custom(function = "not_blank", message = "name is required"),
        length(max = 100, message = "name must be at most 100 characters")
    )]
    pub name: Option<String>,
    #[serde(default)]
    #[validate(
        email(message = "email must be a valid address"),
        length(max = 150, message = "email must be at most 150 characters")
    )]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

/// Outward representation of an account; digests are never included.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRecord> for UserView {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Account CRUD gated by [`AuthorizationPolicy`].
pub struct UserService {
    store: Arc<dyn UserStore>,
    passwords: Arc<PasswordService>,
    policy: PasswordPolicy,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, passwords: Arc<PasswordService>) -> Self {
        Self {
            store,
            passwords,
            policy: PasswordPolicy::new(),
        }
    }

    /// Public self-registration; the requested role is ignored.
    pub async fn register(&self, account: NewAccount) -> AuthResult<UserRecord> {
        self.insert(account, Role::User).await
    }

    pub async fn create(&self, principal: &Principal, account: NewAccount) -> AuthResult<UserRecord> {
        if !AuthorizationPolicy::can_create(principal) {
            return Err(AuthError::PermissionDenied);
        }
        let role = account.role.unwrap_or(Role::User);
        self.insert(account, role).await
    }

    pub async fn find_all(&self, principal: &Principal) -> AuthResult<Vec<UserRecord>> {
        if !AuthorizationPolicy::can_list(principal) {
            return Err(AuthError::PermissionDenied);
        }
        self.store.list().await
    }

    pub async fn find_one(&self, principal: &Principal, id: i32) -> AuthResult<UserRecord> {
        if !AuthorizationPolicy::can_read(principal, id) {
            return Err(AuthError::PermissionDenied);
        }
        self.store.find_by_id(id).await?.ok_or(AuthError::NotFound)
    }

    /// The caller's own record.
    pub async fn me(&self, principal: &Principal) -> AuthResult<UserRecord> {
        self.store
            .find_by_id(principal.user_id)
            .await?
            .ok_or(AuthError::NotFound)
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: i32,
        changes: UserChanges,
    ) -> AuthResult<UserRecord> {
        if !AuthorizationPolicy::can_write(principal, id, &changes) {
            return Err(AuthError::PermissionDenied);
        }

        let user = self.store.find_by_id(id).await?.ok_or(AuthError::NotFound)?;

        changes.validate()?;
        if let Some(email) = &changes.email {
            if *email != user.email && self.store.find_by_email(email).await?.is_some() {
                return Err(AuthError::Conflict("User already exists".into()));
            }
        }

        let password_hash = match &changes.password {
            Some(password) => {
                let email = changes.email.as_deref().unwrap_or(&user.email);
                let name = changes.name.as_deref().unwrap_or(&user.name);
                self.policy
                    .validate_strength(password, Some(email), Some(name))?;
                if self.passwords.verify_password(password, &user.password_hash) {
                    return Err(AuthError::Conflict(
                        "New password cannot be the same as the old one".into(),
                    ));
                }
                Some(self.passwords.hash_password(password)?)
            }
            None => None,
        };

        let update = UserUpdate {
            name: changes.name,
            email: changes.email,
            password_hash,
            role: changes.role,
        };
        if update.is_empty() {
            return Ok(user);
        }
        let updated = self.store.update(id, update).await?;
        log::info!("user {} updated by user {}", id, principal.user_id);
        Ok(updated)
    }

    pub async fn remove(&self, principal: &Principal, id: i32) -> AuthResult<()> {
        if !AuthorizationPolicy::can_delete(principal, id) {
            return Err(AuthError::PermissionDenied);
        }
        self.store.delete(id).await?;
        log::info!("user {} removed by user {}", id, principal.user_id);
        Ok(())
    }

    async fn insert(&self, account: NewAccount, role: Role) -> AuthResult<UserRecord> {
        account.validate()?;

        if self.store.find_by_email(&account.email).await?.is_some() {
            return Err(AuthError::Conflict("User already exists".into()));
        }

        self.policy.validate_strength(
            &account.password,
            Some(&account.email),
            Some(&account.name),
        )?;
        let password_hash = self.passwords.hash_password(&account.password)?;

        let user = self
            .store
            .create(NewUser {
                name: account.name,
                email: account.email,
                password_hash,
                role,
            })
            .await?;
        log::info!("created {} account {}", user.role, user.id);
        Ok(user)
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::InMemoryUserStore;

    const STRONG: &str = "Xk9#mQzv2L";

    fn service() -> (UserService, Arc<InMemoryUserStore>) {
        let store = Arc::new(InMemoryUserStore::new());
        let passwords = Arc::new(PasswordService::new().expect("password service"));
        (UserService::new(store.clone(), passwords), store)
    }

    fn account(email: &str) -> NewAccount {
        NewAccount {
            name: "John Doe".into(),
            email: email.into(),
            password: STRONG.into(),
            role: None,
        }
    }

    fn principal(user: &UserRecord) -> Principal {
        Principal::from(user)
    }

    async fn admin(service: &UserService, store: &InMemoryUserStore) -> Principal {
        let user = service.register(account("admin@x.com")).await.expect("register admin");
        let user = store
            .update(
                user.id,
                UserUpdate {
                    role: Some(Role::Admin),
                    ..UserUpdate::default()
                },
            )
            .await
            .expect("promote");
        principal(&user)
    }

    #[tokio::test]
    async fn register_forces_user_role_and_hashes_password() {
        let (service, _) = service();
        let mut request = account("john@x.com");
        request.role = Some(Role::Admin);

        let user = service.register(request).await.expect("register");
        assert_eq!(user.role, Role::User);
        assert_ne!(user.password_hash, STRONG);
        assert!(user.refresh_token_hash.is_none());
    }

    #[tokio::test]
    async fn register_rejects_duplicates_and_weak_passwords() {
        let (service, _) = service();
        service.register(account("john@x.com")).await.expect("register");

        assert!(matches!(
            service.register(account("john@x.com")).await,
            Err(AuthError::Conflict(_))
        ));

        let mut weak = account("jane@x.com");
        weak.password = "password123".into();
        assert!(matches!(
            service.register(weak).await,
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[tokio::test]
    async fn register_rejects_malformed_input() {
        let (service, _) = service();
        let mut nameless = account("john@x.com");
        nameless.name = "  ".into();
        assert!(matches!(
            service.register(nameless).await,
            Err(AuthError::InvalidInput(_))
        ));
        assert!(matches!(
            service.register(account("not-an-email")).await,
            Err(AuthError::InvalidInput(_))
        ));

        let mut long_name = account("long@x.com");
        long_name.name = "n".repeat(101);
        assert!(matches!(
            service.register(long_name).await,
            Err(AuthError::InvalidInput(_))
        ));
    }

    #[test]
    fn account_validation_reports_field_limits() {
        let account = NewAccount {
            name: "n".repeat(101),
            email: format!("{}@x.com", "e".repeat(150)),
            password: STRONG.into(),
            role: Some(Role::Admin),
        };
        match AuthError::from(account.validate().expect_err("invalid account")) {
            AuthError::InvalidInput(reason) => {
                assert!(reason.contains("name must be at most 100 characters"));
                assert!(reason.contains("email must be at most 150 characters"));
            }
            other => panic!("expected invalid input, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn update_rejects_malformed_fields() {
        let (service, _) = service();
        let user = service.register(account("john@x.com")).await.expect("register");
        let changes = UserChanges {
            email: Some("not-an-email".into()),
            ..UserChanges::default()
        };
        assert!(matches!(
            service.update(&principal(&user), user.id, changes).await,
            Err(AuthError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn admin_creates_accounts_with_roles() {
        let (service, store) = service();
        let admin = admin(&service, &store).await;
        let mut request = account("mod@x.com");
        request.role = Some(Role::Moderator);

        let user = service.create(&admin, request).await.expect("create");
        assert_eq!(user.role, Role::Moderator);

        let regular = service.register(account("john@x.com")).await.expect("register");
        assert!(matches!(
            service.create(&principal(&regular), account("other@x.com")).await,
            Err(AuthError::PermissionDenied)
        ));
    }

    #[tokio::test]
    async fn reads_are_admin_only() {
        let (service, store) = service();
        let admin = admin(&service, &store).await;
        let user = service.register(account("john@x.com")).await.expect("register");

        assert_eq!(service.find_all(&admin).await.expect("list").len(), 2);
        assert_eq!(service.find_one(&admin, user.id).await.expect("read").id, user.id);
        assert!(matches!(
            service.find_one(&admin, 9999).await,
            Err(AuthError::NotFound)
        ));
        assert!(matches!(
            service.find_all(&principal(&user)).await,
            Err(AuthError::PermissionDenied)
        ));
        assert!(matches!(
            service.find_one(&principal(&user), user.id).await,
            Err(AuthError::PermissionDenied)
        ));
    }

    #[tokio::test]
    async fn owner_updates_profile_but_not_role() {
        let (service, _) = service();
        let user = service.register(account("john@x.com")).await.expect("register");
        let owner = principal(&user);

        let renamed = service
            .update(
                &owner,
                user.id,
                UserChanges {
                    name: Some("Johnny".into()),
                    ..UserChanges::default()
                },
            )
            .await
            .expect("rename");
        assert_eq!(renamed.name, "Johnny");

        let escalate = UserChanges {
            role: Some(Role::Admin),
            ..UserChanges::default()
        };
        assert!(matches!(
            service.update(&owner, user.id, escalate).await,
            Err(AuthError::PermissionDenied)
        ));
    }

    #[tokio::test]
    async fn non_admin_cannot_touch_other_records() {
        let (service, _) = service();
        let user = service.register(account("john@x.com")).await.expect("register");
        let other = service.register(account("jane@x.com")).await.expect("register");

        let changes = UserChanges {
            name: Some("x".into()),
            ..UserChanges::default()
        };
        assert!(matches!(
            service.update(&principal(&user), other.id, changes).await,
            Err(AuthError::PermissionDenied)
        ));
        assert!(matches!(
            service.remove(&principal(&user), other.id).await,
            Err(AuthError::PermissionDenied)
        ));
    }

    #[tokio::test]
    async fn password_change_enforces_policy_and_novelty() {
        let (service, _) = service();
        let user = service.register(account("john@x.com")).await.expect("register");
        let owner = principal(&user);

        let same = UserChanges {
            password: Some(STRONG.into()),
            ..UserChanges::default()
        };
        assert!(matches!(
            service.update(&owner, user.id, same).await,
            Err(AuthError::Conflict(_))
        ));

        let weak = UserChanges {
            password: Some("Q#9x123Lm".into()),
            ..UserChanges::default()
        };
        assert!(matches!(
            service.update(&owner, user.id, weak).await,
            Err(AuthError::WeakPassword(_))
        ));

        let fresh = UserChanges {
            password: Some("Vr7!pWz4Ke".into()),
            ..UserChanges::default()
        };
        let before = user.password_hash.clone();
        let updated = service.update(&owner, user.id, fresh).await.expect("change password");
        assert_ne!(updated.password_hash, before);
    }

    #[tokio::test]
    async fn email_change_cannot_collide() {
        let (service, _) = service();
        let user = service.register(account("john@x.com")).await.expect("register");
        service.register(account("jane@x.com")).await.expect("register");

        let changes = UserChanges {
            email: Some("jane@x.com".into()),
            ..UserChanges::default()
        };
        assert!(matches!(
            service.update(&principal(&user), user.id, changes).await,
            Err(AuthError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn empty_change_set_leaves_record_untouched() {
        let (service, _) = service();
        let user = service.register(account("john@x.com")).await.expect("register");

        let unchanged = service
            .update(&principal(&user), user.id, UserChanges::default())
            .await
            .expect("update");
        assert_eq!(unchanged, user);
    }

    #[tokio::test]
    async fn admin_removes_accounts() {
        let (service, store) = service();
        let admin = admin(&service, &store).await;
        let user = service.register(account("john@x.com")).await.expect("register");

        service.remove(&admin, user.id).await.expect("remove");
        assert!(store.find_by_id(user.id).await.expect("lookup").is_none());
        assert!(matches!(
            service.remove(&admin, user.id).await,
            Err(AuthError::NotFound)
        ));
    }

    #[test]
    fn views_omit_digests() {
        let now = Utc::now();
        let record = UserRecord {
            id: 1,
            name: "John Doe".into(),
            email: "john@x.com".into(),
            password_hash: "$argon2id$secret".into(),
            role: Role::User,
            refresh_token_hash: Some("$argon2id$session".into()),
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_string(&UserView::from(record)).expect("serialize");
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"createdAt\""));
    }
}
