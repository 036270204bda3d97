use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::paging::{ListFilter, Page};
use crate::domain::users::{Role, User};

#[derive(Debug, Clone)]
pub struct UserRow {
    pub user: User,
    pub password_hash: String,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(
        &self,
        email: &str,
        name: &str,
        role: Role,
        password_hash: &str,
    ) -> anyhow::Result<User>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRow>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<UserRow>>;
    async fn list(&self, filter: &ListFilter) -> anyhow::Result<Page<User>>;
    async fn update_user(
        &self,
        id: Uuid,
        name: &str,
        role: Role,
        is_active: bool,
    ) -> anyhow::Result<Option<User>>;
    async fn set_password(&self, id: Uuid, password_hash: &str) -> anyhow::Result<bool>;
    async fn touch_login(&self, id: Uuid) -> anyhow::Result<()>;
    async fn email_taken(&self, email: &str, except: Option<Uuid>) -> anyhow::Result<bool>;
    async fn count_users(&self) -> anyhow::Result<i64>;
}
