use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use crate::application::ports::record_repository::RecordRepository;
use crate::domain::paging::{ListFilter, Page, SelectOption};
use crate::domain::territory::{Department, DepartmentInput};
use crate::domain::validation::FieldErrors;
use crate::infrastructure::db::PgPool;
use crate::infrastructure::db::query::{self, ListSpec, Unique};

const SELECT: &str = "SELECT d.id, d.code, d.name, d.is_active, d.created_at, d.updated_at";
const FROM: &str = "FROM departments d";

const LIST: ListSpec<'static> = ListSpec {
    select: SELECT,
    from: FROM,
    alias: "d",
    search: &["d.name", "d.code"],
    parent: None,
    order_by: "d.code ASC",
};

pub struct SqlxDepartmentRepository {
    pub pool: PgPool,
}

impl SqlxDepartmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_row(r: &PgRow) -> Department {
    Department {
        id: r.get("id"),
        code: r.get("code"),
        name: r.get("name"),
        is_active: r.get("is_active"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

#[async_trait]
impl RecordRepository for SqlxDepartmentRepository {
    type Record = Department;
    type Input = DepartmentInput;

    async fn list(&self, filter: &ListFilter) -> anyhow::Result<Page<Department>> {
        let (rows, total) = query::fetch_page(&self.pool, &LIST, filter).await?;
        Ok(Page::new(
            rows.iter().map(map_row).collect(),
            filter.page,
            total,
        ))
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Department>> {
        let sql = format!("{} {} WHERE d.id = $1", SELECT, FROM);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(map_row))
    }

    async fn insert(&self, input: &DepartmentInput) -> anyhow::Result<Department> {
        let row = sqlx::query(
            r#"INSERT INTO departments (code, name) VALUES ($1, $2)
               RETURNING id, code, name, is_active, created_at, updated_at"#,
        )
        .bind(input.code.trim())
        .bind(input.name.trim())
        .fetch_one(&self.pool)
        .await?;
        Ok(map_row(&row))
    }

    async fn update(
        &self,
        id: Uuid,
        input: &DepartmentInput,
    ) -> anyhow::Result<Option<Department>> {
        let row = sqlx::query(
            r#"UPDATE departments SET code = $2, name = $3, updated_at = now()
               WHERE id = $1
               RETURNING id, code, name, is_active, created_at, updated_at"#,
        )
        .bind(id)
        .bind(input.code.trim())
        .bind(input.name.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(map_row))
    }

    async fn set_active(&self, id: Uuid, active: bool) -> anyhow::Result<bool> {
        query::set_active(&self.pool, "departments", id, active).await
    }

    async fn conflicts(
        &self,
        input: &DepartmentInput,
        except: Option<Uuid>,
    ) -> anyhow::Result<FieldErrors> {
        let mut errors = FieldErrors::new();
        let code = Unique {
            table: "departments",
            column: "code",
            case_insensitive: false,
            scope: None,
        };
        if query::value_taken(&self.pool, code, &input.code, except).await? {
            errors.add("code", "Another department already uses this code");
        }
        let name = Unique {
            table: "departments",
            column: "name",
            case_insensitive: true,
            scope: None,
        };
        if query::value_taken(&self.pool, name, &input.name, except).await? {
            errors.add("name", "Another department already has this name");
        }
        Ok(errors)
    }

    async fn active_dependents(&self, id: Uuid) -> anyhow::Result<i64> {
        query::count_dependents(
            &self.pool,
            &[
                ("municipalities", "department_id"),
                ("departmental_plans", "department_id"),
            ],
            id,
        )
        .await
    }

    async fn options(&self, _parent_id: Option<Uuid>) -> anyhow::Result<Vec<SelectOption>> {
        query::root_options(
            &self.pool,
            "SELECT id, code || ' - ' || name AS label FROM departments WHERE is_active ORDER BY name",
        )
        .await
    }
}
