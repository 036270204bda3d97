use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use crate::application::ports::record_repository::RecordRepository;
use crate::domain::paging::{ListFilter, Page, SelectOption};
use crate::domain::territory::{Mayoralty, MayoraltyInput};
use crate::domain::validation::FieldErrors;
use crate::infrastructure::db::PgPool;
use crate::infrastructure::db::query::{self, ListSpec, non_blank};

const SELECT: &str = "SELECT a.id, a.municipality_id, m.name AS municipality_name, \
                      d.name AS department_name, a.name, a.nit, a.address, a.phone, a.email, \
                      a.is_active, a.created_at, a.updated_at";
const FROM: &str = "FROM mayoralties a \
                    JOIN municipalities m ON m.id = a.municipality_id \
                    JOIN departments d ON d.id = m.department_id";

const LIST: ListSpec<'static> = ListSpec {
    select: SELECT,
    from: FROM,
    alias: "a",
    search: &["a.name", "a.nit", "m.name"],
    parent: Some("a.municipality_id"),
    order_by: "a.name ASC",
};

/// Another active mayoralty already serves the municipality. Backed by the
/// `mayoralties_one_active_idx` partial index.
const OCCUPIED_SQL: &str = "SELECT EXISTS(SELECT 1 FROM mayoralties \
                            WHERE municipality_id = $1 AND is_active \
                            AND ($2::uuid IS NULL OR id <> $2))";

pub struct SqlxMayoraltyRepository {
    pub pool: PgPool,
}

impl SqlxMayoraltyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_row(r: &PgRow) -> Mayoralty {
    Mayoralty {
        id: r.get("id"),
        municipality_id: r.get("municipality_id"),
        municipality_name: r.get("municipality_name"),
        department_name: r.get("department_name"),
        name: r.get("name"),
        nit: r.get("nit"),
        address: r.get("address"),
        phone: r.get("phone"),
        email: r.get("email"),
        is_active: r.get("is_active"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

#[async_trait]
impl RecordRepository for SqlxMayoraltyRepository {
    type Record = Mayoralty;
    type Input = MayoraltyInput;

    async fn list(&self, filter: &ListFilter) -> anyhow::Result<Page<Mayoralty>> {
        let (rows, total) = query::fetch_page(&self.pool, &LIST, filter).await?;
        Ok(Page::new(
            rows.iter().map(map_row).collect(),
            filter.page,
            total,
        ))
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Mayoralty>> {
        let sql = format!("{} {} WHERE a.id = $1", SELECT, FROM);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(map_row))
    }

    async fn insert(&self, input: &MayoraltyInput) -> anyhow::Result<Mayoralty> {
        let id: Uuid = sqlx::query_scalar(
            r#"INSERT INTO mayoralties (municipality_id, name, nit, address, phone, email)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING id"#,
        )
        .bind(input.municipality_id)
        .bind(input.name.trim())
        .bind(input.nit.trim())
        .bind(non_blank(&input.address))
        .bind(non_blank(&input.phone))
        .bind(non_blank(&input.email))
        .fetch_one(&self.pool)
        .await?;
        self.find(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("mayoralty {} vanished after insert", id))
    }

    async fn update(
        &self,
        id: Uuid,
        input: &MayoraltyInput,
    ) -> anyhow::Result<Option<Mayoralty>> {
        let res = sqlx::query(
            r#"UPDATE mayoralties
               SET municipality_id = $2, name = $3, nit = $4, address = $5, phone = $6,
                   email = $7, updated_at = now()
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(input.municipality_id)
        .bind(input.name.trim())
        .bind(input.nit.trim())
        .bind(non_blank(&input.address))
        .bind(non_blank(&input.phone))
        .bind(non_blank(&input.email))
        .execute(&self.pool)
        .await?;
        if res.rows_affected() == 0 {
            return Ok(None);
        }
        self.find(id).await
    }

    async fn set_active(&self, id: Uuid, active: bool) -> anyhow::Result<bool> {
        query::set_active(&self.pool, "mayoralties", id, active).await
    }

    async fn conflicts(
        &self,
        input: &MayoraltyInput,
        except: Option<Uuid>,
    ) -> anyhow::Result<FieldErrors> {
        let mut errors = FieldErrors::new();
        if !query::active_exists(&self.pool, "municipalities", input.municipality_id).await? {
            errors.add("municipality_id", "Select an active municipality");
            return Ok(errors);
        }
        let occupied: bool = sqlx::query_scalar(OCCUPIED_SQL)
        .bind(input.municipality_id)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;
        if occupied {
            errors.add(
                "municipality_id",
                "This municipality already has an active mayoralty",
            );
        }
        Ok(errors)
    }

    async fn active_dependents(&self, id: Uuid) -> anyhow::Result<i64> {
        query::count_dependents(
            &self.pool,
            &[
                ("mayors", "mayoralty_id"),
                ("secretariats", "mayoralty_id"),
                ("municipal_plans", "mayoralty_id"),
            ],
            id,
        )
        .await
    }

    async fn options(&self, parent_id: Option<Uuid>) -> anyhow::Result<Vec<SelectOption>> {
        query::select_options(
            &self.pool,
            r#"SELECT id, name AS label FROM mayoralties
               WHERE is_active AND ($1::uuid IS NULL OR municipality_id = $1)
               ORDER BY name"#,
            parent_id,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn occupancy_counts_only_other_active_rows() {
        assert_eq!(
            OCCUPIED_SQL,
            "SELECT EXISTS(SELECT 1 FROM mayoralties WHERE municipality_id = $1 AND is_active AND ($2::uuid IS NULL OR id <> $2))"
        );
    }
}
