use crate::application::errors::ServiceError;
use crate::domain::users::{Role, User};

// Presentation layer resolves the signed-in user; this module only decides.

pub fn can(user: &User, required: Role) -> bool {
    user.is_active && user.role.allows(required)
}

pub fn require_role(user: &User, required: Role) -> Result<(), ServiceError> {
    if can(user, required) {
        Ok(())
    } else {
        Err(ServiceError::Forbidden("insufficient role"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn user(role: Role, is_active: bool) -> User {
        User {
            id: Uuid::new_v4(),
            email: "user@example.gov.co".into(),
            name: "User".into(),
            role,
            is_active,
            last_login_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn planner_can_edit_planning_but_not_territory() {
        let planner = user(Role::Planner, true);
        assert!(require_role(&planner, Role::Planner).is_ok());
        assert!(matches!(
            require_role(&planner, Role::Admin),
            Err(ServiceError::Forbidden(_))
        ));
    }

    #[test]
    fn inactive_users_have_no_access() {
        let admin = user(Role::Admin, false);
        assert!(!can(&admin, Role::Viewer));
    }
}
