use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use crate::application::ports::record_repository::RecordRepository;
use crate::domain::paging::{ListFilter, Page, SelectOption};
use crate::domain::planning::{DepartmentalPlanScope, MunicipalPlan, MunicipalPlanInput};
use crate::domain::validation::FieldErrors;
use crate::infrastructure::db::PgPool;
use crate::infrastructure::db::query::{self, ListSpec, non_blank};

const SELECT: &str = "SELECT mp.id, mp.mayoralty_id, a.name AS mayoralty_name, \
                      mp.departmental_plan_id, dp.name AS departmental_plan_name, mp.name, \
                      mp.start_year, mp.end_year, mp.description, mp.is_active, \
                      mp.created_at, mp.updated_at";
const FROM: &str = "FROM municipal_plans mp \
                    JOIN mayoralties a ON a.id = mp.mayoralty_id \
                    LEFT JOIN departmental_plans dp ON dp.id = mp.departmental_plan_id";

const LIST: ListSpec<'static> = ListSpec {
    select: SELECT,
    from: FROM,
    alias: "mp",
    search: &["mp.name", "a.name"],
    parent: Some("mp.mayoralty_id"),
    order_by: "mp.start_year DESC, mp.name ASC",
};

pub struct SqlxMunicipalPlanRepository {
    pub pool: PgPool,
}

impl SqlxMunicipalPlanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_row(r: &PgRow) -> MunicipalPlan {
    MunicipalPlan {
        id: r.get("id"),
        mayoralty_id: r.get("mayoralty_id"),
        mayoralty_name: r.get("mayoralty_name"),
        departmental_plan_id: r.get("departmental_plan_id"),
        departmental_plan_name: r.get("departmental_plan_name"),
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
impl RecordRepository for SqlxMunicipalPlanRepository {
    type Record = MunicipalPlan;
    type Input = MunicipalPlanInput;

    async fn list(&self, filter: &ListFilter) -> anyhow::Result<Page<MunicipalPlan>> {
        let (rows, total) = query::fetch_page(&self.pool, &LIST, filter).await?;
        Ok(Page::new(
            rows.iter().map(map_row).collect(),
            filter.page,
            total,
        ))
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<MunicipalPlan>> {
        let sql = format!("{} {} WHERE mp.id = $1", SELECT, FROM);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(map_row))
    }

    async fn insert(&self, input: &MunicipalPlanInput) -> anyhow::Result<MunicipalPlan> {
        let id: Uuid = sqlx::query_scalar(
            r#"INSERT INTO municipal_plans
                 (mayoralty_id, departmental_plan_id, name, start_year, end_year, description)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING id"#,
        )
        .bind(input.mayoralty_id)
        .bind(input.departmental_plan_id)
        .bind(input.name.trim())
        .bind(input.start_year)
        .bind(input.end_year)
        .bind(non_blank(&input.description))
        .fetch_one(&self.pool)
        .await?;
        self.find(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("municipal plan {} vanished after insert", id))
    }

    async fn update(
        &self,
        id: Uuid,
        input: &MunicipalPlanInput,
    ) -> anyhow::Result<Option<MunicipalPlan>> {
        let res = sqlx::query(
            r#"UPDATE municipal_plans
               SET mayoralty_id = $2, departmental_plan_id = $3, name = $4, start_year = $5,
                   end_year = $6, description = $7, updated_at = now()
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(input.mayoralty_id)
        .bind(input.departmental_plan_id)
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
        query::set_active(&self.pool, "municipal_plans", id, active).await
    }

    async fn conflicts(
        &self,
        input: &MunicipalPlanInput,
        _except: Option<Uuid>,
    ) -> anyhow::Result<FieldErrors> {
        let mut errors = FieldErrors::new();
        // department that the mayoralty's municipality belongs to
        let department_id: Option<Uuid> = sqlx::query_scalar(
            r#"SELECT m.department_id FROM mayoralties a
               JOIN municipalities m ON m.id = a.municipality_id
               WHERE a.id = $1 AND a.is_active"#,
        )
        .bind(input.mayoralty_id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(department_id) = department_id else {
            errors.add("mayoralty_id", "Select an active mayoralty");
            return Ok(errors);
        };
        if let Some(plan_id) = input.departmental_plan_id {
            let plan: Option<(Uuid, i32, i32)> = sqlx::query_as(
                r#"SELECT department_id, start_year, end_year FROM departmental_plans
                   WHERE id = $1 AND is_active"#,
            )
            .bind(plan_id)
            .fetch_optional(&self.pool)
            .await?;
            match plan {
                None => errors.add("departmental_plan_id", "Select an active departmental plan"),
                Some((plan_department, start_year, end_year)) => {
                    let scope = DepartmentalPlanScope {
                        department_id: plan_department,
                        start_year,
                        end_year,
                    };
                    if let Some(message) = input.departmental_plan_error(department_id, &scope) {
                        errors.add("departmental_plan_id", message);
                    }
                }
            }
        }
        Ok(errors)
    }

    async fn active_dependents(&self, id: Uuid) -> anyhow::Result<i64> {
        query::count_dependents(&self.pool, &[("programs", "municipal_plan_id")], id).await
    }

    async fn options(&self, parent_id: Option<Uuid>) -> anyhow::Result<Vec<SelectOption>> {
        query::select_options(
            &self.pool,
            r#"SELECT id, name || ' (' || start_year || '-' || end_year || ')' AS label
               FROM municipal_plans
               WHERE is_active AND ($1::uuid IS NULL OR mayoralty_id = $1)
               ORDER BY start_year DESC, name"#,
            parent_id,
        )
        .await
    }
}
