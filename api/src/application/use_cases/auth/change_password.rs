use uuid::Uuid;

use crate::application::errors::ServiceError;
use crate::application::ports::user_repository::UserRepository;
use crate::application::services::passwords;
use crate::domain::users::check_password;
use crate::domain::validation::FieldErrors;

pub struct ChangePassword<'a, R: UserRepository + ?Sized> {
    pub repo: &'a R,
}

#[derive(Debug, Clone)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl<'a, R: UserRepository + ?Sized> ChangePassword<'a, R> {
    pub async fn execute(&self, user_id: Uuid, req: &ChangePasswordRequest) -> Result<(), ServiceError> {
        let row = self
            .repo
            .find_by_id(user_id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        let mut errors = FieldErrors::new();
        if !passwords::verify_password(&req.current_password, &row.password_hash) {
            errors.add("current_password", "Current password is incorrect");
        }
        check_password(&mut errors, "new_password", &req.new_password);
        if req.new_password != req.confirm_password {
            errors.add("confirm_password", "Passwords do not match");
        }
        errors.into_result()?;

        let hash = passwords::hash_password(&req.new_password)?;
        self.repo.set_password(user_id, &hash).await?;
        tracing::info!(user_id = %user_id, "password_changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::users::fakes::MemoryUsers;
    use crate::domain::users::Role;

    #[tokio::test]
    async fn changes_password_when_current_matches() {
        let repo = MemoryUsers::default();
        let user = repo.seed("ana@example.gov.co", "old-password", Role::Viewer, true);
        let uc = ChangePassword { repo: &repo };
        uc.execute(
            user.id,
            &ChangePasswordRequest {
                current_password: "old-password".into(),
                new_password: "new-password-1".into(),
                confirm_password: "new-password-1".into(),
            },
        )
        .await
        .unwrap();
        let hash = repo.password_hash(user.id).unwrap();
        assert!(passwords::verify_password("new-password-1", &hash));
    }

    #[tokio::test]
    async fn reports_every_problem_at_once() {
        let repo = MemoryUsers::default();
        let user = repo.seed("ana@example.gov.co", "old-password", Role::Viewer, true);
        let uc = ChangePassword { repo: &repo };
        let err = uc
            .execute(
                user.id,
                &ChangePasswordRequest {
                    current_password: "guess".into(),
                    new_password: "short".into(),
                    confirm_password: "different".into(),
                },
            )
            .await
            .unwrap_err();
        let ServiceError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.contains("current_password"));
        assert!(errors.contains("new_password"));
        assert!(errors.contains("confirm_password"));
        let hash = repo.password_hash(user.id).unwrap();
        assert!(passwords::verify_password("old-password", &hash));
    }
}
