use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use crate::application::ports::record_repository::RecordRepository;
use crate::domain::paging::{ListFilter, Page, SelectOption};
use crate::domain::planning::{Program, ProgramInput};
use crate::domain::validation::FieldErrors;
use crate::infrastructure::db::PgPool;
use crate::infrastructure::db::query::{self, ListSpec, Unique, non_blank};

const SELECT: &str = "SELECT g.id, g.municipal_plan_id, mp.name AS municipal_plan_name, \
                      g.secretariat_id, s.name AS secretariat_name, g.code, g.name, \
                      g.description, g.is_active, g.created_at, g.updated_at";
const FROM: &str = "FROM programs g \
                    JOIN municipal_plans mp ON mp.id = g.municipal_plan_id \
                    LEFT JOIN secretariats s ON s.id = g.secretariat_id";

const LIST: ListSpec<'static> = ListSpec {
    select: SELECT,
    from: FROM,
    alias: "g",
    search: &["g.name", "g.code"],
    parent: Some("g.municipal_plan_id"),
    order_by: "g.code ASC",
};

pub struct SqlxProgramRepository {
    pub pool: PgPool,
}

impl SqlxProgramRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_row(r: &PgRow) -> Program {
    Program {
        id: r.get("id"),
        municipal_plan_id: r.get("municipal_plan_id"),
        municipal_plan_name: r.get("municipal_plan_name"),
        secretariat_id: r.get("secretariat_id"),
        secretariat_name: r.get("secretariat_name"),
        code: r.get("code"),
        name: r.get("name"),
        description: r.get("description"),
        is_active: r.get("is_active"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

#[async_trait]
impl RecordRepository for SqlxProgramRepository {
    type Record = Program;
    type Input = ProgramInput;

    async fn list(&self, filter: &ListFilter) -> anyhow::Result<Page<Program>> {
        let (rows, total) = query::fetch_page(&self.pool, &LIST, filter).await?;
        Ok(Page::new(
            rows.iter().map(map_row).collect(),
            filter.page,
            total,
        ))
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Program>> {
        let sql = format!("{} {} WHERE g.id = $1", SELECT, FROM);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(map_row))
    }

    async fn insert(&self, input: &ProgramInput) -> anyhow::Result<Program> {
        let id: Uuid = sqlx::query_scalar(
            r#"INSERT INTO programs (municipal_plan_id, secretariat_id, code, name, description)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING id"#,
        )
        .bind(input.municipal_plan_id)
        .bind(input.secretariat_id)
        .bind(input.code.trim())
        .bind(input.name.trim())
        .bind(non_blank(&input.description))
        .fetch_one(&self.pool)
        .await?;
        self.find(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("program {} vanished after insert", id))
    }

    async fn update(&self, id: Uuid, input: &ProgramInput) -> anyhow::Result<Option<Program>> {
        let res = sqlx::query(
            r#"UPDATE programs
               SET municipal_plan_id = $2, secretariat_id = $3, code = $4, name = $5,
                   description = $6, updated_at = now()
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(input.municipal_plan_id)
        .bind(input.secretariat_id)
        .bind(input.code.trim())
        .bind(input.name.trim())
        .bind(non_blank(&input.description))
        .execute(&self.pool)
        .await?;
        if res.rows_affected() == 0 {
            return Ok(None);
        }
        self.find(id).await
    }

    async fn set_active(&self, id: Uuid, active: bool) -> anyhow::Result<bool> {
        query::set_active(&self.pool, "programs", id, active).await
    }

    async fn conflicts(
        &self,
        input: &ProgramInput,
        except: Option<Uuid>,
    ) -> anyhow::Result<FieldErrors> {
        let mut errors = FieldErrors::new();
        if !query::active_exists(&self.pool, "municipal_plans", input.municipal_plan_id).await? {
            errors.add("municipal_plan_id", "Select an active municipal plan");
        }
        if let Some(secretariat_id) = input.secretariat_id {
            if !query::active_exists(&self.pool, "secretariats", secretariat_id).await? {
                errors.add("secretariat_id", "Select an active secretariat");
            }
        }
        let code = Unique {
            table: "programs",
            column: "code",
            case_insensitive: false,
            scope: Some(("municipal_plan_id", input.municipal_plan_id)),
        };
        if query::value_taken(&self.pool, code, &input.code, except).await? {
            errors.add("code", "This plan already has a program with this code");
        }
        Ok(errors)
    }

    async fn active_dependents(&self, id: Uuid) -> anyhow::Result<i64> {
        query::count_dependents(&self.pool, &[("products", "program_id")], id).await
    }

    async fn options(&self, parent_id: Option<Uuid>) -> anyhow::Result<Vec<SelectOption>> {
        query::select_options(
            &self.pool,
            r#"SELECT id, code || ' - ' || name AS label FROM programs
               WHERE is_active AND ($1::uuid IS NULL OR municipal_plan_id = $1)
               ORDER BY code"#,
            parent_id,
        )
        .await
    }
}
