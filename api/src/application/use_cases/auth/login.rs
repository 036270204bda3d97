use crate::application::ports::user_repository::UserRepository;
use crate::application::services::passwords;
use crate::domain::users::{User, normalize_email};

pub struct Login<'a, R: UserRepository + ?Sized> {
    pub repo: &'a R,
}

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl<'a, R: UserRepository + ?Sized> Login<'a, R> {
    /// `None` for unknown email, wrong password or a deactivated account alike.
    pub async fn execute(&self, req: &LoginRequest) -> anyhow::Result<Option<User>> {
        let row = match self.repo.find_by_email(&normalize_email(&req.email)).await? {
            Some(r) => r,
            None => {
                passwords::verify_against_dummy(&req.password);
                return Ok(None);
            }
        };
        if !passwords::verify_password(&req.password, &row.password_hash) {
            return Ok(None);
        }
        if !row.user.is_active {
            tracing::info!(user_id = %row.user.id, "login_rejected_inactive");
            return Ok(None);
        }
        self.repo.touch_login(row.user.id).await?;
        Ok(Some(row.user))
    }
}
