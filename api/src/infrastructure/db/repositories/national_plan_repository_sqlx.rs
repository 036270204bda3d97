use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use crate::application::ports::record_repository::RecordRepository;
use crate::domain::paging::{ListFilter, Page, SelectOption};
use crate::domain::planning::{NationalPlan, NationalPlanInput};
use crate::domain::validation::FieldErrors;
use crate::infrastructure::db::PgPool;
use crate::infrastructure::db::query::{self, ListSpec, Unique, non_blank};

const COLUMNS: &str =
    "id, name, start_year, end_year, description, is_active, created_at, updated_at";

const LIST: ListSpec<'static> = ListSpec {
    select: "SELECT n.id, n.name, n.start_year, n.end_year, n.description, n.is_active, \
             n.created_at, n.updated_at",
    from: "FROM national_plans n",
    alias: "n",
    search: &["n.name"],
    parent: None,
    order_by: "n.start_year DESC, n.name ASC",
};

pub struct SqlxNationalPlanRepository {
    pub pool: PgPool,
}

impl SqlxNationalPlanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_row(r: &PgRow) -> NationalPlan {
    NationalPlan {
        id: r.get("id"),
        name: r.get("name"),
        start_year: r.get("start_year"),
        end_year: r.get("end_year"),
        description: r.get("description"),
        is_active: r.get("is_active"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

#[async_trait]
impl RecordRepository for SqlxNationalPlanRepository {
    type Record = NationalPlan;
    type Input = NationalPlanInput;

    async fn list(&self, filter: &ListFilter) -> anyhow::Result<Page<NationalPlan>> {
        let (rows, total) = query::fetch_page(&self.pool, &LIST, filter).await?;
        Ok(Page::new(
            rows.iter().map(map_row).collect(),
            filter.page,
            total,
        ))
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<NationalPlan>> {
        let sql = format!("SELECT {} FROM national_plans WHERE id = $1", COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(map_row))
    }

    async fn insert(&self, input: &NationalPlanInput) -> anyhow::Result<NationalPlan> {
        let sql = format!(
            "INSERT INTO national_plans (name, start_year, end_year, description) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(input.name.trim())
            .bind(input.start_year)
            .bind(input.end_year)
            .bind(non_blank(&input.description))
            .fetch_one(&self.pool)
            .await?;
        Ok(map_row(&row))
    }

    async fn update(
        &self,
        id: Uuid,
        input: &NationalPlanInput,
    ) -> anyhow::Result<Option<NationalPlan>> {
        let sql = format!(
            "UPDATE national_plans SET name = $2, start_year = $3, end_year = $4, \
             description = $5, updated_at = now() WHERE id = $1 RETURNING {}",
            COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(input.name.trim())
            .bind(input.start_year)
            .bind(input.end_year)
            .bind(non_blank(&input.description))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(map_row))
    }

    async fn set_active(&self, id: Uuid, active: bool) -> anyhow::Result<bool> {
        query::set_active(&self.pool, "national_plans", id, active).await
    }

    async fn conflicts(
        &self,
        input: &NationalPlanInput,
        except: Option<Uuid>,
    ) -> anyhow::Result<FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = Unique {
            table: "national_plans",
            column: "name",
            case_insensitive: true,
            scope: None,
        };
        if query::value_taken(&self.pool, name, &input.name, except).await? {
            errors.add("name", "Another national plan already has this name");
        }
        Ok(errors)
    }

    async fn active_dependents(&self, id: Uuid) -> anyhow::Result<i64> {
        query::count_dependents(&self.pool, &[("departmental_plans", "national_plan_id")], id)
            .await
    }

    async fn options(&self, _parent_id: Option<Uuid>) -> anyhow::Result<Vec<SelectOption>> {
        query::root_options(
            &self.pool,
            r#"SELECT id, name || ' (' || start_year || '-' || end_year || ')' AS label
               FROM national_plans WHERE is_active ORDER BY start_year DESC, name"#,
        )
        .await
    }
}
