use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::application::ports::user_repository::{UserRepository, UserRow};
use crate::application::services::passwords;
use crate::domain::paging::{ListFilter, Page};
use crate::domain::users::{Role, User};

#[derive(Default)]
pub(crate) struct MemoryUsers {
    rows: Mutex<Vec<UserRow>>,
}

impl MemoryUsers {
    pub(crate) fn seed(&self, email: &str, password: &str, role: Role, is_active: bool) -> User {
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: email.split('@').next().unwrap_or(email).to_string(),
            role,
            is_active,
            last_login_at: None,
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(UserRow {
            user: user.clone(),
            password_hash: passwords::hash_password(password).unwrap(),
        });
        user
    }

    pub(crate) fn last_login(&self, id: Uuid) -> Option<DateTime<Utc>> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.user.id == id)
            .and_then(|r| r.user.last_login_at)
    }

    pub(crate) fn password_hash(&self, id: Uuid) -> Option<String> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.user.id == id)
            .map(|r| r.password_hash.clone())
    }
}

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn create_user(
        &self,
        email: &str,
        name: &str,
        role: Role,
        password_hash: &str,
    ) -> anyhow::Result<User> {
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: name.to_string(),
            role,
            is_active: true,
            last_login_at: None,
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(UserRow {
            user: user.clone(),
            password_hash: password_hash.to_string(),
        });
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRow>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.user.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<UserRow>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.user.id == id)
            .cloned())
    }

    async fn list(&self, filter: &ListFilter) -> anyhow::Result<Page<User>> {
        let users: Vec<User> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.user.clone())
            .filter(|u| filter.include_inactive || u.is_active)
            .collect();
        let total = users.len() as i64;
        Ok(Page::new(users, filter.page, total))
    }

    async fn update_user(
        &self,
        id: Uuid,
        name: &str,
        role: Role,
        is_active: bool,
    ) -> anyhow::Result<Option<User>> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows.iter_mut().find(|r| r.user.id == id).map(|r| {
            r.user.name = name.to_string();
            r.user.role = role;
            r.user.is_active = is_active;
            r.user.clone()
        }))
    }

    async fn set_password(&self, id: Uuid, password_hash: &str) -> anyhow::Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows
            .iter_mut()
            .find(|r| r.user.id == id)
            .map(|r| r.password_hash = password_hash.to_string())
            .is_some())
    }

    async fn touch_login(&self, id: Uuid) -> anyhow::Result<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(r) = rows.iter_mut().find(|r| r.user.id == id) {
            r.user.last_login_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn email_taken(&self, email: &str, except: Option<Uuid>) -> anyhow::Result<bool> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.user.email == email && Some(r.user.id) != except))
    }

    async fn count_users(&self) -> anyhow::Result<i64> {
        Ok(self.rows.lock().unwrap().len() as i64)
    }
}
