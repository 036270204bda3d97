use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use crate::application::ports::record_repository::RecordRepository;
use crate::domain::paging::{ListFilter, Page, SelectOption};
use crate::domain::territory::{Municipality, MunicipalityInput};
use crate::domain::validation::FieldErrors;
use crate::infrastructure::db::PgPool;
use crate::infrastructure::db::query::{self, ListSpec, Unique};

const SELECT: &str = "SELECT m.id, m.department_id, d.name AS department_name, m.code, m.name, \
                      m.is_active, m.created_at, m.updated_at";
const FROM: &str = "FROM municipalities m JOIN departments d ON d.id = m.department_id";

const LIST: ListSpec<'static> = ListSpec {
    select: SELECT,
    from: FROM,
    alias: "m",
    search: &["m.name", "m.code", "d.name"],
    parent: Some("m.department_id"),
    order_by: "m.code ASC",
};

pub struct SqlxMunicipalityRepository {
    pub pool: PgPool,
}

impl SqlxMunicipalityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_row(r: &PgRow) -> Municipality {
    Municipality {
        id: r.get("id"),
        department_id: r.get("department_id"),
        department_name: r.get("department_name"),
        code: r.get("code"),
        name: r.get("name"),
        is_active: r.get("is_active"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

#[async_trait]
impl RecordRepository for SqlxMunicipalityRepository {
    type Record = Municipality;
    type Input = MunicipalityInput;

    async fn list(&self, filter: &ListFilter) -> anyhow::Result<Page<Municipality>> {
        let (rows, total) = query::fetch_page(&self.pool, &LIST, filter).await?;
        Ok(Page::new(
            rows.iter().map(map_row).collect(),
            filter.page,
            total,
        ))
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Municipality>> {
        let sql = format!("{} {} WHERE m.id = $1", SELECT, FROM);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(map_row))
    }

    async fn insert(&self, input: &MunicipalityInput) -> anyhow::Result<Municipality> {
        let id: Uuid = sqlx::query_scalar(
            r#"INSERT INTO municipalities (department_id, code, name) VALUES ($1, $2, $3)
               RETURNING id"#,
        )
        .bind(input.department_id)
        .bind(input.code.trim())
        .bind(input.name.trim())
        .fetch_one(&self.pool)
        .await?;
        self.find(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("municipality {} vanished after insert", id))
    }

    async fn update(
        &self,
        id: Uuid,
        input: &MunicipalityInput,
    ) -> anyhow::Result<Option<Municipality>> {
        let res = sqlx::query(
            r#"UPDATE municipalities SET department_id = $2, code = $3, name = $4, updated_at = now()
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(input.department_id)
        .bind(input.code.trim())
        .bind(input.name.trim())
        .execute(&self.pool)
        .await?;
        if res.rows_affected() == 0 {
            return Ok(None);
        }
        self.find(id).await
    }

    async fn set_active(&self, id: Uuid, active: bool) -> anyhow::Result<bool> {
        query::set_active(&self.pool, "municipalities", id, active).await
    }

    async fn conflicts(
        &self,
        input: &MunicipalityInput,
        except: Option<Uuid>,
    ) -> anyhow::Result<FieldErrors> {
        let mut errors = FieldErrors::new();
        let department_code: Option<String> = sqlx::query_scalar(
            "SELECT code FROM departments WHERE id = $1 AND is_active",
        )
        .bind(input.department_id)
        .fetch_optional(&self.pool)
        .await?;
        match department_code {
            None => errors.add("department_id", "Select an active department"),
            Some(prefix) => {
                if let Some(message) = input.code_prefix_error(&prefix) {
                    errors.add("code", message);
                }
            }
        }
        let code = Unique {
            table: "municipalities",
            column: "code",
            case_insensitive: false,
            scope: None,
        };
        if query::value_taken(&self.pool, code, &input.code, except).await? {
            errors.add("code", "Another municipality already uses this code");
        }
        let name = Unique {
            table: "municipalities",
            column: "name",
            case_insensitive: true,
            scope: Some(("department_id", input.department_id)),
        };
        if query::value_taken(&self.pool, name, &input.name, except).await? {
            errors.add("name", "This department already has a municipality with this name");
        }
        Ok(errors)
    }

    async fn active_dependents(&self, id: Uuid) -> anyhow::Result<i64> {
        query::count_dependents(&self.pool, &[("mayoralties", "municipality_id")], id).await
    }

    async fn options(&self, parent_id: Option<Uuid>) -> anyhow::Result<Vec<SelectOption>> {
        query::select_options(
            &self.pool,
            r#"SELECT id, name AS label FROM municipalities
               WHERE is_active AND ($1::uuid IS NULL OR department_id = $1)
               ORDER BY name"#,
            parent_id,
        )
        .await
    }
}
