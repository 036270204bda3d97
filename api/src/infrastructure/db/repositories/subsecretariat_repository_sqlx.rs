use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use crate::application::ports::record_repository::RecordRepository;
use crate::domain::organization::{Subsecretariat, SubsecretariatInput};
use crate::domain::paging::{ListFilter, Page, SelectOption};
use crate::domain::validation::FieldErrors;
use crate::infrastructure::db::PgPool;
use crate::infrastructure::db::query::{self, ListSpec, Unique};

const SELECT: &str = "SELECT ss.id, ss.secretariat_id, s.name AS secretariat_name, ss.name, \
                      ss.is_active, ss.created_at, ss.updated_at";
const FROM: &str = "FROM subsecretariats ss JOIN secretariats s ON s.id = ss.secretariat_id";

const LIST: ListSpec<'static> = ListSpec {
    select: SELECT,
    from: FROM,
    alias: "ss",
    search: &["ss.name", "s.name"],
    parent: Some("ss.secretariat_id"),
    order_by: "ss.name ASC",
};

pub struct SqlxSubsecretariatRepository {
    pub pool: PgPool,
}

impl SqlxSubsecretariatRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_row(r: &PgRow) -> Subsecretariat {
    Subsecretariat {
        id: r.get("id"),
        secretariat_id: r.get("secretariat_id"),
        secretariat_name: r.get("secretariat_name"),
        name: r.get("name"),
        is_active: r.get("is_active"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

#[async_trait]
impl RecordRepository for SqlxSubsecretariatRepository {
    type Record = Subsecretariat;
    type Input = SubsecretariatInput;

    async fn list(&self, filter: &ListFilter) -> anyhow::Result<Page<Subsecretariat>> {
        let (rows, total) = query::fetch_page(&self.pool, &LIST, filter).await?;
        Ok(Page::new(
            rows.iter().map(map_row).collect(),
            filter.page,
            total,
        ))
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Subsecretariat>> {
        let sql = format!("{} {} WHERE ss.id = $1", SELECT, FROM);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(map_row))
    }

    async fn insert(&self, input: &SubsecretariatInput) -> anyhow::Result<Subsecretariat> {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO subsecretariats (secretariat_id, name) VALUES ($1, $2) RETURNING id",
        )
        .bind(input.secretariat_id)
        .bind(input.name.trim())
        .fetch_one(&self.pool)
        .await?;
        self.find(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("subsecretariat {} vanished after insert", id))
    }

    async fn update(
        &self,
        id: Uuid,
        input: &SubsecretariatInput,
    ) -> anyhow::Result<Option<Subsecretariat>> {
        let res = sqlx::query(
            r#"UPDATE subsecretariats SET secretariat_id = $2, name = $3, updated_at = now()
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(input.secretariat_id)
        .bind(input.name.trim())
        .execute(&self.pool)
        .await?;
        if res.rows_affected() == 0 {
            return Ok(None);
        }
        self.find(id).await
    }

    async fn set_active(&self, id: Uuid, active: bool) -> anyhow::Result<bool> {
        query::set_active(&self.pool, "subsecretariats", id, active).await
    }

    async fn conflicts(
        &self,
        input: &SubsecretariatInput,
        except: Option<Uuid>,
    ) -> anyhow::Result<FieldErrors> {
        let mut errors = FieldErrors::new();
        if !query::active_exists(&self.pool, "secretariats", input.secretariat_id).await? {
            errors.add("secretariat_id", "Select an active secretariat");
        }
        let name = Unique {
            table: "subsecretariats",
            column: "name",
            case_insensitive: true,
            scope: Some(("secretariat_id", input.secretariat_id)),
        };
        if query::value_taken(&self.pool, name, &input.name, except).await? {
            errors.add("name", "This secretariat already has a subsecretariat with this name");
        }
        Ok(errors)
    }

    async fn active_dependents(&self, id: Uuid) -> anyhow::Result<i64> {
        query::count_dependents(&self.pool, &[("responsibles", "subsecretariat_id")], id).await
    }

    async fn options(&self, parent_id: Option<Uuid>) -> anyhow::Result<Vec<SelectOption>> {
        query::select_options(
            &self.pool,
            r#"SELECT id, name AS label FROM subsecretariats
               WHERE is_active AND ($1::uuid IS NULL OR secretariat_id = $1)
               ORDER BY name"#,
            parent_id,
        )
        .await
    }
}
