use uuid::Uuid;

use crate::application::errors::ServiceError;
use crate::application::ports::user_repository::UserRepository;
use crate::domain::users::{Role, User, UserUpdate};
use crate::domain::validation::Validate;

pub struct UpdateUser<'a, R: UserRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: UserRepository + ?Sized> UpdateUser<'a, R> {
    /// `actor_id` is the administrator performing the change.
    pub async fn execute(
        &self,
        actor_id: Uuid,
        id: Uuid,
        req: &UserUpdate,
    ) -> Result<User, ServiceError> {
        let mut errors = req.validate();
        if actor_id == id {
            if req.role != Role::Admin {
                errors.add("role", "You cannot remove your own administrator role");
            }
            if !req.is_active {
                errors.add("is_active", "You cannot deactivate your own account");
            }
        }
        errors.into_result()?;
        let user = self
            .repo
            .update_user(id, req.name.trim(), req.role, req.is_active)
            .await?
            .ok_or(ServiceError::NotFound)?;
        tracing::info!(user_id = %id, actor_id = %actor_id, role = %user.role, active = user.is_active, "user_updated");
        Ok(user)
    }
}

impl From<&User> for UserUpdate {
    fn from(user: &User) -> Self {
        UserUpdate {
            name: user.name.clone(),
            role: user.role,
            is_active: user.is_active,
        }
    }
}
