use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use crate::application::ports::record_repository::RecordRepository;
use crate::domain::paging::{ListFilter, Page, SelectOption};
use crate::domain::planning::{DepartmentalPlan, DepartmentalPlanInput, periods_overlap};
use crate::domain::validation::FieldErrors;
use crate::infrastructure::db::PgPool;
use crate::infrastructure::db::query::{self, ListSpec, non_blank};

const SELECT: &str = "SELECT dp.id, dp.department_id, d.name AS department_name, \
                      dp.national_plan_id, n.name AS national_plan_name, dp.name, \
                      dp.start_year, dp.end_year, dp.description, dp.is_active, \
                      dp.created_at, dp.updated_at";
const FROM: &str = "FROM departmental_plans dp \
                    JOIN departments d ON d.id = dp.department_id \
                    LEFT JOIN national_plans n ON n.id = dp.national_plan_id";

const LIST: ListSpec<'static> = ListSpec {
    select: SELECT,
    from: FROM,
    alias: "dp",
    search: &["dp.name", "d.name"],
    parent: Some("dp.department_id"),
    order_by: "dp.start_year DESC, dp.name ASC",
};

pub struct SqlxDepartmentalPlanRepository {
    pub pool: PgPool,
}

impl SqlxDepartmentalPlanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_row(r: &PgRow) -> DepartmentalPlan {
    DepartmentalPlan {
        id: r.get("id"),
        department_id: r.get("department_id"),
        department_name: r.get("department_name"),
        national_plan_id: r.get("national_plan_id"),
        national_plan_name: r.get("national_plan_name"),
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
impl RecordRepository for SqlxDepartmentalPlanRepository {
    type Record = DepartmentalPlan;
    type Input = DepartmentalPlanInput;

    async fn list(&self, filter: &ListFilter) -> anyhow::Result<Page<DepartmentalPlan>> {
        let (rows, total) = query::fetch_page(&self.pool, &LIST, filter).await?;
        Ok(Page::new(
            rows.iter().map(map_row).collect(),
            filter.page,
            total,
        ))
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<DepartmentalPlan>> {
        let sql = format!("{} {} WHERE dp.id = $1", SELECT, FROM);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(map_row))
    }

    async fn insert(&self, input: &DepartmentalPlanInput) -> anyhow::Result<DepartmentalPlan> {
        let id: Uuid = sqlx::query_scalar(
            r#"INSERT INTO departmental_plans
                 (department_id, national_plan_id, name, start_year, end_year, description)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING id"#,
        )
        .bind(input.department_id)
        .bind(input.national_plan_id)
        .bind(input.name.trim())
        .bind(input.start_year)
        .bind(input.end_year)
        .bind(non_blank(&input.description))
        .fetch_one(&self.pool)
        .await?;
        self.find(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("departmental plan {} vanished after insert", id))
    }

    async fn update(
        &self,
        id: Uuid,
        input: &DepartmentalPlanInput,
    ) -> anyhow::Result<Option<DepartmentalPlan>> {
        let res = sqlx::query(
            r#"UPDATE departmental_plans
               SET department_id = $2, national_plan_id = $3, name = $4, start_year = $5,
                   end_year = $6, description = $7, updated_at = now()
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(input.department_id)
        .bind(input.national_plan_id)
        .bind(input.name.trim())
        .bind(input.start_year)
        .bind(input.end_year)
        .bind(non_blank(&input.description))
        .execute(&self.pool)
        .await?;
        if res.rows_affected() == 0 {
            return Ok(None);
        }
        self.find(id).await
    }

    async fn set_active(&self, id: Uuid, active: bool) -> anyhow::Result<bool> {
        query::set_active(&self.pool, "departmental_plans", id, active).await
    }

    async fn conflicts(
        &self,
        input: &DepartmentalPlanInput,
        _except: Option<Uuid>,
    ) -> anyhow::Result<FieldErrors> {
        let mut errors = FieldErrors::new();
        if !query::active_exists(&self.pool, "departments", input.department_id).await? {
            errors.add("department_id", "Select an active department");
        }
        if let Some(national_id) = input.national_plan_id {
            let period: Option<(i32, i32)> = sqlx::query_as(
                "SELECT start_year, end_year FROM national_plans WHERE id = $1 AND is_active",
            )
            .bind(national_id)
            .fetch_optional(&self.pool)
            .await?;
            match period {
                None => errors.add("national_plan_id", "Select an active national plan"),
                Some(p) if !periods_overlap(p, (input.start_year, input.end_year)) => errors.add(
                    "national_plan_id",
                    format!("The national plan runs {}-{} and does not overlap", p.0, p.1),
                ),
                Some(_) => {}
            }
        }
        Ok(errors)
    }

    async fn active_dependents(&self, id: Uuid) -> anyhow::Result<i64> {
        query::count_dependents(&self.pool, &[("municipal_plans", "departmental_plan_id")], id)
            .await
    }

    async fn options(&self, parent_id: Option<Uuid>) -> anyhow::Result<Vec<SelectOption>> {
        query::select_options(
            &self.pool,
            r#"SELECT id, name || ' (' || start_year || '-' || end_year || ')' AS label
               FROM departmental_plans
               WHERE is_active AND ($1::uuid IS NULL OR department_id = $1)
               ORDER BY start_year DESC, name"#,
            parent_id,
        )
        .await
    }
}
