use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use crate::application::ports::record_repository::RecordRepository;
use crate::domain::paging::{ListFilter, Page, SelectOption};
use crate::domain::territory::{Mayor, MayorInput};
use crate::domain::validation::FieldErrors;
use crate::infrastructure::db::PgPool;
use crate::infrastructure::db::query::{self, ListSpec, non_blank};

const SELECT: &str = "SELECT p.id, p.mayoralty_id, a.name AS mayoralty_name, p.full_name, \
                      p.document_number, p.email, p.phone, p.term_start, p.term_end, \
                      p.is_active, p.created_at, p.updated_at";
const FROM: &str = "FROM mayors p JOIN mayoralties a ON a.id = p.mayoralty_id";

const LIST: ListSpec<'static> = ListSpec {
    select: SELECT,
    from: FROM,
    alias: "p",
    search: &["p.full_name", "p.document_number", "a.name"],
    parent: Some("p.mayoralty_id"),
    order_by: "p.term_start DESC, p.full_name ASC",
};

/// Inclusive date ranges `[$2, $3]` against other active terms of the mayoralty.
const OVERLAP_SQL: &str = "SELECT EXISTS(SELECT 1 FROM mayors \
                           WHERE mayoralty_id = $1 AND is_active \
                           AND term_start <= $3 AND $2 <= term_end \
                           AND ($4::uuid IS NULL OR id <> $4))";

pub struct SqlxMayorRepository {
    pub pool: PgPool,
}

impl SqlxMayorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_row(r: &PgRow) -> Mayor {
    Mayor {
        id: r.get("id"),
        mayoralty_id: r.get("mayoralty_id"),
        mayoralty_name: r.get("mayoralty_name"),
        full_name: r.get("full_name"),
        document_number: r.get("document_number"),
        email: r.get("email"),
        phone: r.get("phone"),
        term_start: r.get("term_start"),
        term_end: r.get("term_end"),
        is_active: r.get("is_active"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

#[async_trait]
impl RecordRepository for SqlxMayorRepository {
    type Record = Mayor;
    type Input = MayorInput;

    async fn list(&self, filter: &ListFilter) -> anyhow::Result<Page<Mayor>> {
        let (rows, total) = query::fetch_page(&self.pool, &LIST, filter).await?;
        Ok(Page::new(
            rows.iter().map(map_row).collect(),
            filter.page,
            total,
        ))
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Mayor>> {
        let sql = format!("{} {} WHERE p.id = $1", SELECT, FROM);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(map_row))
    }

    async fn insert(&self, input: &MayorInput) -> anyhow::Result<Mayor> {
        let id: Uuid = sqlx::query_scalar(
            r#"INSERT INTO mayors (mayoralty_id, full_name, document_number, email, phone, term_start, term_end)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING id"#,
        )
        .bind(input.mayoralty_id)
        .bind(input.full_name.trim())
        .bind(input.document_number.trim())
        .bind(non_blank(&input.email))
        .bind(non_blank(&input.phone))
        .bind(input.term_start)
        .bind(input.term_end)
        .fetch_one(&self.pool)
        .await?;
        self.find(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("mayor {} vanished after insert", id))
    }

    async fn update(&self, id: Uuid, input: &MayorInput) -> anyhow::Result<Option<Mayor>> {
        let res = sqlx::query(
            r#"UPDATE mayors
               SET mayoralty_id = $2, full_name = $3, document_number = $4, email = $5,
                   phone = $6, term_start = $7, term_end = $8, updated_at = now()
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(input.mayoralty_id)
        .bind(input.full_name.trim())
        .bind(input.document_number.trim())
        .bind(non_blank(&input.email))
        .bind(non_blank(&input.phone))
        .bind(input.term_start)
        .bind(input.term_end)
        .execute(&self.pool)
        .await?;
        if res.rows_affected() == 0 {
            return Ok(None);
        }
        self.find(id).await
    }

    async fn set_active(&self, id: Uuid, active: bool) -> anyhow::Result<bool> {
        query::set_active(&self.pool, "mayors", id, active).await
    }

    async fn conflicts(
        &self,
        input: &MayorInput,
        except: Option<Uuid>,
    ) -> anyhow::Result<FieldErrors> {
        let mut errors = FieldErrors::new();
        if !query::active_exists(&self.pool, "mayoralties", input.mayoralty_id).await? {
            errors.add("mayoralty_id", "Select an active mayoralty");
            return Ok(errors);
        }
        let overlapping: bool = sqlx::query_scalar(OVERLAP_SQL)
        .bind(input.mayoralty_id)
        .bind(input.term_start)
        .bind(input.term_end)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;
        if overlapping {
            errors.add(
                "term_start",
                "The term overlaps another active mayor of this mayoralty",
            );
        }
        Ok(errors)
    }

    async fn active_dependents(&self, _id: Uuid) -> anyhow::Result<i64> {
        Ok(0)
    }

    async fn options(&self, parent_id: Option<Uuid>) -> anyhow::Result<Vec<SelectOption>> {
        query::select_options(
            &self.pool,
            r#"SELECT id, full_name AS label FROM mayors
               WHERE is_active AND ($1::uuid IS NULL OR mayoralty_id = $1)
               ORDER BY full_name"#,
            parent_id,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_check_is_inclusive_and_skips_inactive_and_self() {
        assert_eq!(
            OVERLAP_SQL,
            "SELECT EXISTS(SELECT 1 FROM mayors WHERE mayoralty_id = $1 AND is_active AND term_start <= $3 AND $2 <= term_end AND ($4::uuid IS NULL OR id <> $4))"
        );
    }
}
