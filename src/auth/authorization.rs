//! Role-based decisions over account operations.
//!
//! Pure functions of the caller's [`Principal`], the target id and the
//! requested changes. Callers fetch the target after a positive decision.

use crate::auth::guards::Principal;
use crate::users::UserChanges;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    List,
    Write,
    Delete,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorizationPolicy;

impl AuthorizationPolicy {
    pub fn can_create(principal: &Principal) -> bool {
        principal.is_admin()
    }

    pub fn can_read(principal: &Principal, _target_id: i32) -> bool {
        principal.is_admin()
    }

    pub fn can_list(principal: &Principal) -> bool {
        principal.is_admin()
    }

    /// Admins may change anything; others may edit their own record but never its role.
    pub fn can_write(principal: &Principal, target_id: i32, changes: &UserChanges) -> bool {
        if principal.is_admin() {
            return true;
        }
        principal.user_id == target_id && changes.role.is_none()
    }

    pub fn can_delete(principal: &Principal, _target_id: i32) -> bool {
        principal.is_admin()
    }

    /// Single entry point over all operations.
    ///
    /// A targeted operation without a target is refused.
    pub fn authorize(
        principal: &Principal,
        operation: Operation,
        target: Option<i32>,
        changes: Option<&UserChanges>,
    ) -> bool {
        match (operation, target) {
            (Operation::Create, _) => Self::can_create(principal),
            (Operation::List, _) => Self::can_list(principal),
            (Operation::Read, Some(id)) => Self::can_read(principal, id),
            (Operation::Delete, Some(id)) => Self::can_delete(principal, id),
            (Operation::Write, Some(id)) => match changes {
                Some(changes) => Self::can_write(principal, id, changes),
                None => Self::can_write(principal, id, &UserChanges::default()),
            },
            (Operation::Read | Operation::Write | Operation::Delete, None) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::responses::Role;

    fn principal(user_id: i32, role: Role) -> Principal {
        Principal {
            user_id,
            email: format!("user{user_id}@example.com"),
            role,
        }
    }

    fn rename() -> UserChanges {
        UserChanges {
            name: Some("x".into()),
            ..UserChanges::default()
        }
    }

    fn set_role(role: Role) -> UserChanges {
        UserChanges {
            role: Some(role),
            ..UserChanges::default()
        }
    }

    #[test]
    fn only_admins_read_list_create_and_delete() {
        let admin = principal(1, Role::Admin);
        for role in [Role::User, Role::Moderator] {
            let p = principal(2, role);
            assert!(!AuthorizationPolicy::can_read(&p, 2));
            assert!(!AuthorizationPolicy::can_list(&p));
            assert!(!AuthorizationPolicy::can_create(&p));
            assert!(!AuthorizationPolicy::can_delete(&p, 2));
        }
        assert!(AuthorizationPolicy::can_read(&admin, 2));
        assert!(AuthorizationPolicy::can_list(&admin));
        assert!(AuthorizationPolicy::can_create(&admin));
        assert!(AuthorizationPolicy::can_delete(&admin, 2));
    }

    #[test]
    fn non_admins_edit_only_their_own_record_without_role() {
        for role in [Role::User, Role::Moderator] {
            let p = principal(7, role);
            assert!(AuthorizationPolicy::authorize(
                &p,
                Operation::Write,
                Some(7),
                Some(&rename())
            ));
            assert!(!AuthorizationPolicy::authorize(
                &p,
                Operation::Write,
                Some(8),
                Some(&rename())
            ));
            for target_role in [Role::User, Role::Moderator, Role::Admin] {
                assert!(!AuthorizationPolicy::authorize(
                    &p,
                    Operation::Write,
                    Some(7),
                    Some(&set_role(target_role))
                ));
                assert!(!AuthorizationPolicy::authorize(
                    &p,
                    Operation::Write,
                    Some(8),
                    Some(&set_role(target_role))
                ));
            }
        }
    }

    #[test]
    fn role_change_is_denied_even_alongside_other_fields() {
        let p = principal(7, Role::User);
        let changes = UserChanges {
            name: Some("x".into()),
            role: Some(Role::User),
            ..UserChanges::default()
        };
        assert!(!AuthorizationPolicy::can_write(&p, 7, &changes));
    }

    #[test]
    fn admins_may_write_anything() {
        let admin = principal(1, Role::Admin);
        assert!(AuthorizationPolicy::can_write(&admin, 9, &set_role(Role::Moderator)));
        assert!(AuthorizationPolicy::can_write(&admin, 1, &rename()));
    }

    #[test]
    fn targeted_operations_require_a_target() {
        let admin = principal(1, Role::Admin);
        assert!(!AuthorizationPolicy::authorize(&admin, Operation::Read, None, None));
        assert!(!AuthorizationPolicy::authorize(&admin, Operation::Write, None, None));
        assert!(!AuthorizationPolicy::authorize(&admin, Operation::Delete, None, None));
        assert!(AuthorizationPolicy::authorize(&admin, Operation::List, None, None));
    }

    #[test]
    fn missing_change_set_is_treated_as_empty() {
        let p = principal(3, Role::User);
        assert!(AuthorizationPolicy::authorize(&p, Operation::Write, Some(3), None));
    }
}
