use uuid::Uuid;

use crate::application::errors::ServiceError;
use crate::application::ports::user_repository::UserRepository;
use crate::application::services::passwords;
use crate::domain::users::check_password;
use crate::domain::validation::FieldErrors;

pub struct ResetPassword<'a, R: UserRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: UserRepository + ?Sized> ResetPassword<'a, R> {
    pub async fn execute(&self, id: Uuid, new_password: &str) -> Result<(), ServiceError> {
        let mut errors = FieldErrors::new();
        check_password(&mut errors, "password", new_password);
        errors.into_result()?;
        let hash = passwords::hash_password(new_password)?;
        if !self.repo.set_password(id, &hash).await? {
            return Err(ServiceError::NotFound);
        }
        tracing::info!(user_id = %id, "password_reset");
        Ok(())
    }
}
