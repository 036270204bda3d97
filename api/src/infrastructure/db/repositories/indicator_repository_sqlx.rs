use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use crate::application::ports::record_repository::RecordRepository;
use crate::domain::paging::{ListFilter, Page, SelectOption};
use crate::domain::planning::{Indicator, IndicatorInput};
use crate::domain::validation::FieldErrors;
use crate::infrastructure::db::PgPool;
use crate::infrastructure::db::query::{self, ListSpec, Unique};

const SELECT: &str = "SELECT i.id, i.product_id, p.name AS product_name, i.code, i.name, \
                      i.unit, i.baseline, i.target, i.current_value, i.is_active, \
                      i.created_at, i.updated_at";
const FROM: &str = "FROM indicators i JOIN products p ON p.id = i.product_id";

const LIST: ListSpec<'static> = ListSpec {
    select: SELECT,
    from: FROM,
    alias: "i",
    search: &["i.name", "i.code"],
    parent: Some("i.product_id"),
    order_by: "i.code ASC",
};

pub struct SqlxIndicatorRepository {
    pub pool: PgPool,
}

impl SqlxIndicatorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_row(r: &PgRow) -> Indicator {
    Indicator {
        id: r.get("id"),
        product_id: r.get("product_id"),
        product_name: r.get("product_name"),
        code: r.get("code"),
        name: r.get("name"),
        unit: r.get("unit"),
        baseline: r.get("baseline"),
        target: r.get("target"),
        current_value: r.get("current_value"),
        is_active: r.get("is_active"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

#[async_trait]
impl RecordRepository for SqlxIndicatorRepository {
    type Record = Indicator;
    type Input = IndicatorInput;

    async fn list(&self, filter: &ListFilter) -> anyhow::Result<Page<Indicator>> {
        let (rows, total) = query::fetch_page(&self.pool, &LIST, filter).await?;
        Ok(Page::new(
            rows.iter().map(map_row).collect(),
            filter.page,
            total,
        ))
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Indicator>> {
        let sql = format!("{} {} WHERE i.id = $1", SELECT, FROM);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(map_row))
    }

    async fn insert(&self, input: &IndicatorInput) -> anyhow::Result<Indicator> {
        let id: Uuid = sqlx::query_scalar(
            r#"INSERT INTO indicators
                 (product_id, code, name, unit, baseline, target, current_value)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING id"#,
        )
        .bind(input.product_id)
        .bind(input.code.trim())
        .bind(input.name.trim())
        .bind(input.unit.trim())
        .bind(input.baseline)
        .bind(input.target)
        .bind(input.current_value)
        .fetch_one(&self.pool)
        .await?;
        self.find(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("indicator {} vanished after insert", id))
    }

    async fn update(
        &self,
        id: Uuid,
        input: &IndicatorInput,
    ) -> anyhow::Result<Option<Indicator>> {
        let res = sqlx::query(
            r#"UPDATE indicators
               SET product_id = $2, code = $3, name = $4, unit = $5, baseline = $6,
                   target = $7, current_value = $8, updated_at = now()
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(input.product_id)
        .bind(input.code.trim())
        .bind(input.name.trim())
        .bind(input.unit.trim())
        .bind(input.baseline)
        .bind(input.target)
        .bind(input.current_value)
        .execute(&self.pool)
        .await?;
        if res.rows_affected() == 0 {
            return Ok(None);
        }
        self.find(id).await
    }

    async fn set_active(&self, id: Uuid, active: bool) -> anyhow::Result<bool> {
        query::set_active(&self.pool, "indicators", id, active).await
    }

    async fn conflicts(
        &self,
        input: &IndicatorInput,
        except: Option<Uuid>,
    ) -> anyhow::Result<FieldErrors> {
        let mut errors = FieldErrors::new();
        if !query::active_exists(&self.pool, "products", input.product_id).await? {
            errors.add("product_id", "Select an active product");
        }
        let code = Unique {
            table: "indicators",
            column: "code",
            case_insensitive: false,
            scope: Some(("product_id", input.product_id)),
        };
        if query::value_taken(&self.pool, code, &input.code, except).await? {
            errors.add("code", "This product already has an indicator with this code");
        }
        Ok(errors)
    }

    async fn active_dependents(&self, id: Uuid) -> anyhow::Result<i64> {
        query::count_dependents(&self.pool, &[("evidences", "indicator_id")], id).await
    }

    async fn options(&self, parent_id: Option<Uuid>) -> anyhow::Result<Vec<SelectOption>> {
        query::select_options(
            &self.pool,
            r#"SELECT id, code || ' - ' || name AS label FROM indicators
               WHERE is_active AND ($1::uuid IS NULL OR product_id = $1)
               ORDER BY code"#,
            parent_id,
        )
        .await
    }
}
