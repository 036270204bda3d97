use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use crate::application::ports::user_repository::{UserRepository, UserRow};
use crate::domain::paging::{ListFilter, Page};
use crate::domain::users::{Role, User};
use crate::infrastructure::db::PgPool;
use crate::infrastructure::db::query::{self, ListSpec};

const COLUMNS: &str = "id, email, name, role, is_active, last_login_at, created_at";

const LIST: ListSpec<'static> = ListSpec {
    select: "SELECT u.id, u.email, u.name, u.role, u.is_active, u.last_login_at, u.created_at",
    from: "FROM users u",
    alias: "u",
    search: &["u.name", "u.email"],
    parent: None,
    order_by: "u.name ASC",
};

pub struct SqlxUserRepository {
    pub pool: PgPool,
}

impl SqlxUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_user(r: &PgRow) -> anyhow::Result<User> {
    let role: String = r.get("role");
    Ok(User {
        id: r.get("id"),
        email: r.get("email"),
        name: r.get("name"),
        role: role.parse::<Role>()?,
        is_active: r.get("is_active"),
        last_login_at: r.get("last_login_at"),
        created_at: r.get("created_at"),
    })
}

fn map_row(r: &PgRow) -> anyhow::Result<UserRow> {
    Ok(UserRow {
        user: map_user(r)?,
        password_hash: r.get("password_hash"),
    })
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create_user(
        &self,
        email: &str,
        name: &str,
        role: Role,
        password_hash: &str,
    ) -> anyhow::Result<User> {
        let sql = format!(
            "INSERT INTO users (email, name, role, password_hash) VALUES ($1, $2, $3, $4) \
             RETURNING {}",
            COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(email)
            .bind(name.trim())
            .bind(role.as_str())
            .bind(password_hash)
            .fetch_one(&self.pool)
            .await?;
        map_user(&row)
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRow>> {
        let sql = format!(
            "SELECT {}, password_hash FROM users WHERE email = $1",
            COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_row).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<UserRow>> {
        let sql = format!("SELECT {}, password_hash FROM users WHERE id = $1", COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_row).transpose()
    }

    async fn list(&self, filter: &ListFilter) -> anyhow::Result<Page<User>> {
        let (rows, total) = query::fetch_page(&self.pool, &LIST, filter).await?;
        let items = rows.iter().map(map_user).collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Page::new(items, filter.page, total))
    }

    async fn update_user(
        &self,
        id: Uuid,
        name: &str,
        role: Role,
        is_active: bool,
    ) -> anyhow::Result<Option<User>> {
        let sql = format!(
            "UPDATE users SET name = $2, role = $3, is_active = $4, updated_at = now() \
             WHERE id = $1 RETURNING {}",
            COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(name.trim())
            .bind(role.as_str())
            .bind(is_active)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_user).transpose()
    }

    async fn set_password(&self, id: Uuid, password_hash: &str) -> anyhow::Result<bool> {
        let res = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn touch_login(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET last_login_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn email_taken(&self, email: &str, except: Option<Uuid>) -> anyhow::Result<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn count_users(&self) -> anyhow::Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
