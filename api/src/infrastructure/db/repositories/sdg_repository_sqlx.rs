use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use crate::application::ports::record_repository::RecordRepository;
use crate::domain::paging::{ListFilter, Page, SelectOption};
use crate::domain::planning::{Sdg, SdgInput};
use crate::domain::validation::FieldErrors;
use crate::infrastructure::db::PgPool;
use crate::infrastructure::db::query::{self, ListSpec, non_blank};

const COLUMNS: &str = "id, number, name, description, is_active, created_at, updated_at";

const LIST: ListSpec<'static> = ListSpec {
    select: "SELECT s.id, s.number, s.name, s.description, s.is_active, s.created_at, s.updated_at",
    from: "FROM sdgs s",
    alias: "s",
    search: &["s.name"],
    parent: None,
    order_by: "s.number ASC",
};

pub struct SqlxSdgRepository {
    pub pool: PgPool,
}

impl SqlxSdgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_row(r: &PgRow) -> Sdg {
    Sdg {
        id: r.get("id"),
        number: r.get("number"),
        name: r.get("name"),
        description: r.get("description"),
        is_active: r.get("is_active"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

#[async_trait]
impl RecordRepository for SqlxSdgRepository {
    type Record = Sdg;
    type Input = SdgInput;

    async fn list(&self, filter: &ListFilter) -> anyhow::Result<Page<Sdg>> {
        let (rows, total) = query::fetch_page(&self.pool, &LIST, filter).await?;
        Ok(Page::new(
            rows.iter().map(map_row).collect(),
            filter.page,
            total,
        ))
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Sdg>> {
        let sql = format!("SELECT {} FROM sdgs WHERE id = $1", COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(map_row))
    }

    async fn insert(&self, input: &SdgInput) -> anyhow::Result<Sdg> {
        let sql = format!(
            "INSERT INTO sdgs (number, name, description) VALUES ($1, $2, $3) RETURNING {}",
            COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(input.number)
            .bind(input.name.trim())
            .bind(non_blank(&input.description))
            .fetch_one(&self.pool)
            .await?;
        Ok(map_row(&row))
    }

    async fn update(&self, id: Uuid, input: &SdgInput) -> anyhow::Result<Option<Sdg>> {
        let sql = format!(
            "UPDATE sdgs SET number = $2, name = $3, description = $4, updated_at = now() \
             WHERE id = $1 RETURNING {}",
            COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(input.number)
            .bind(input.name.trim())
            .bind(non_blank(&input.description))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(map_row))
    }

    async fn set_active(&self, id: Uuid, active: bool) -> anyhow::Result<bool> {
        query::set_active(&self.pool, "sdgs", id, active).await
    }

    async fn conflicts(&self, input: &SdgInput, except: Option<Uuid>) -> anyhow::Result<FieldErrors> {
        let mut errors = FieldErrors::new();
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM sdgs WHERE number = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(input.number)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;
        if taken {
            errors.add("number", "Another goal already has this number");
        }
        Ok(errors)
    }

    async fn active_dependents(&self, id: Uuid) -> anyhow::Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM product_sdgs ps
               JOIN products p ON p.id = ps.product_id
               WHERE ps.sdg_id = $1 AND p.is_active"#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn options(&self, _parent_id: Option<Uuid>) -> anyhow::Result<Vec<SelectOption>> {
        query::root_options(
            &self.pool,
            "SELECT id, number::text || '. ' || name AS label FROM sdgs WHERE is_active ORDER BY number",
        )
        .await
    }
}
