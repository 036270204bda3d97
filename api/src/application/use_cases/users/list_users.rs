use crate::application::ports::user_repository::UserRepository;
use crate::domain::paging::{ListFilter, Page};
use crate::domain::users::User;

pub struct ListUsers<'a, R: UserRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: UserRepository + ?Sized> ListUsers<'a, R> {
    pub async fn execute(&self, filter: &ListFilter) -> anyhow::Result<Page<User>> {
        self.repo.list(filter).await
    }
}
