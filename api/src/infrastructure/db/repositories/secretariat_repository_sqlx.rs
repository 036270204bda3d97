use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use crate::application::ports::record_repository::RecordRepository;
use crate::domain::organization::{Secretariat, SecretariatInput};
use crate::domain::paging::{ListFilter, Page, SelectOption};
use crate::domain::validation::FieldErrors;
use crate::infrastructure::db::PgPool;
use crate::infrastructure::db::query::{self, ListSpec, Unique, non_blank};

const SELECT: &str = "SELECT s.id, s.mayoralty_id, a.name AS mayoralty_name, s.name, s.email, \
                      s.phone, s.is_active, s.created_at, s.updated_at";
const FROM: &str = "FROM secretariats s JOIN mayoralties a ON a.id = s.mayoralty_id";

const LIST: ListSpec<'static> = ListSpec {
    select: SELECT,
    from: FROM,
    alias: "s",
    search: &["s.name", "a.name"],
    parent: Some("s.mayoralty_id"),
    order_by: "s.name ASC",
};

pub struct SqlxSecretariatRepository {
    pub pool: PgPool,
}

impl SqlxSecretariatRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_row(r: &PgRow) -> Secretariat {
    Secretariat {
        id: r.get("id"),
        mayoralty_id: r.get("mayoralty_id"),
        mayoralty_name: r.get("mayoralty_name"),
        name: r.get("name"),
        email: r.get("email"),
        phone: r.get("phone"),
        is_active: r.get("is_active"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

#[async_trait]
impl RecordRepository for SqlxSecretariatRepository {
    type Record = Secretariat;
    type Input = SecretariatInput;

    async fn list(&self, filter: &ListFilter) -> anyhow::Result<Page<Secretariat>> {
        let (rows, total) = query::fetch_page(&self.pool, &LIST, filter).await?;
        Ok(Page::new(
            rows.iter().map(map_row).collect(),
            filter.page,
            total,
        ))
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Secretariat>> {
        let sql = format!("{} {} WHERE s.id = $1", SELECT, FROM);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(map_row))
    }

    async fn insert(&self, input: &SecretariatInput) -> anyhow::Result<Secretariat> {
        let id: Uuid = sqlx::query_scalar(
            r#"INSERT INTO secretariats (mayoralty_id, name, email, phone)
               VALUES ($1, $2, $3, $4)
               RETURNING id"#,
        )
        .bind(input.mayoralty_id)
        .bind(input.name.trim())
        .bind(non_blank(&input.email))
        .bind(non_blank(&input.phone))
        .fetch_one(&self.pool)
        .await?;
        self.find(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("secretariat {} vanished after insert", id))
    }

    async fn update(
        &self,
        id: Uuid,
        input: &SecretariatInput,
    ) -> anyhow::Result<Option<Secretariat>> {
        let res = sqlx::query(
            r#"UPDATE secretariats
               SET mayoralty_id = $2, name = $3, email = $4, phone = $5, updated_at = now()
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(input.mayoralty_id)
        .bind(input.name.trim())
        .bind(non_blank(&input.email))
        .bind(non_blank(&input.phone))
        .execute(&self.pool)
        .await?;
        if res.rows_affected() == 0 {
            return Ok(None);
        }
        self.find(id).await
    }

    async fn set_active(&self, id: Uuid, active: bool) -> anyhow::Result<bool> {
        query::set_active(&self.pool, "secretariats", id, active).await
    }

    async fn conflicts(
        &self,
        input: &SecretariatInput,
        except: Option<Uuid>,
    ) -> anyhow::Result<FieldErrors> {
        let mut errors = FieldErrors::new();
        if !query::active_exists(&self.pool, "mayoralties", input.mayoralty_id).await? {
            errors.add("mayoralty_id", "Select an active mayoralty");
        }
        let name = Unique {
            table: "secretariats",
            column: "name",
            case_insensitive: true,
            scope: Some(("mayoralty_id", input.mayoralty_id)),
        };
        if query::value_taken(&self.pool, name, &input.name, except).await? {
            errors.add("name", "This mayoralty already has a secretariat with this name");
        }
        Ok(errors)
    }

    async fn active_dependents(&self, id: Uuid) -> anyhow::Result<i64> {
        query::count_dependents(
            &self.pool,
            &[
                ("subsecretariats", "secretariat_id"),
                ("responsibles", "secretariat_id"),
                ("programs", "secretariat_id"),
            ],
            id,
        )
        .await
    }

    async fn options(&self, parent_id: Option<Uuid>) -> anyhow::Result<Vec<SelectOption>> {
        query::select_options(
            &self.pool,
            r#"SELECT id, name AS label FROM secretariats
               WHERE is_active AND ($1::uuid IS NULL OR mayoralty_id = $1)
               ORDER BY name"#,
            parent_id,
        )
        .await
    }
}
