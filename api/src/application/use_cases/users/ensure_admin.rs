use crate::application::errors::ServiceError;
use crate::application::ports::user_repository::UserRepository;
use crate::application::use_cases::users::create_user::CreateUser;
use crate::domain::users::{NewUser, Role, User};

pub struct EnsureAdmin<'a, R: UserRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: UserRepository + ?Sized> EnsureAdmin<'a, R> {
    /// Creates the first administrator on an empty user table; otherwise a no-op.
    pub async fn execute(&self, email: &str, name: &str, password: &str) -> anyhow::Result<Option<User>> {
        if self.repo.count_users().await? > 0 {
            return Ok(None);
        }
        let req = NewUser {
            email: email.to_string(),
            name: name.to_string(),
            role: Role::Admin,
            password: password.to_string(),
        };
        match (CreateUser { repo: self.repo }).execute(&req).await {
            Ok(user) => Ok(Some(user)),
            Err(ServiceError::Validation(errors)) => {
                anyhow::bail!("bootstrap administrator is invalid: {}", errors)
            }
            Err(err) => Err(anyhow::anyhow!(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::users::fakes::MemoryUsers;

    #[tokio::test]
    async fn seeds_only_when_empty() {
        let repo = MemoryUsers::default();
        let uc = EnsureAdmin { repo: &repo };
        let created = uc
            .execute("admin@example.gov.co", "Administrator", "change-me-now")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(created.role, Role::Admin);

        let again = uc
            .execute("other@example.gov.co", "Other", "change-me-now")
            .await
            .unwrap();
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn weak_bootstrap_password_fails_startup() {
        let repo = MemoryUsers::default();
        let uc = EnsureAdmin { repo: &repo };
        assert!(uc.execute("admin@example.gov.co", "Admin", "123").await.is_err());
    }
}
