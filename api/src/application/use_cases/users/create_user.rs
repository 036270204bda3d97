use crate::application::errors::ServiceError;
use crate::application::ports::user_repository::UserRepository;
use crate::application::services::passwords;
use crate::domain::users::{NewUser, User, normalize_email};
use crate::domain::validation::{FieldErrors, Validate};

pub struct CreateUser<'a, R: UserRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: UserRepository + ?Sized> CreateUser<'a, R> {
    pub async fn execute(&self, req: &NewUser) -> Result<User, ServiceError> {
        req.validate().into_result()?;
        let email = normalize_email(&req.email);
        if self.repo.email_taken(&email, None).await? {
            return Err(FieldErrors::single("email", "Email is already registered").into());
        }
        let hash = passwords::hash_password(&req.password)?;
        let user = self
            .repo
            .create_user(&email, req.name.trim(), req.role, &hash)
            .await?;
        tracing::info!(user_id = %user.id, role = %user.role, "user_created");
        Ok(user)
    }
}
