use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use crate::application::ports::record_repository::RecordRepository;
use crate::domain::organization::{Responsible, ResponsibleInput};
use crate::domain::paging::{ListFilter, Page, SelectOption};
use crate::domain::validation::FieldErrors;
use crate::infrastructure::db::PgPool;
use crate::infrastructure::db::query::{self, ListSpec, non_blank};

const SELECT: &str = "SELECT r.id, r.secretariat_id, s.name AS secretariat_name, \
                      r.subsecretariat_id, ss.name AS subsecretariat_name, r.full_name, \
                      r.position, r.email, r.phone, r.is_active, r.created_at, r.updated_at";
const FROM: &str = "FROM responsibles r \
                    JOIN secretariats s ON s.id = r.secretariat_id \
                    LEFT JOIN subsecretariats ss ON ss.id = r.subsecretariat_id";

const LIST: ListSpec<'static> = ListSpec {
    select: SELECT,
    from: FROM,
    alias: "r",
    search: &["r.full_name", "r.position", "s.name"],
    parent: Some("r.secretariat_id"),
    order_by: "r.full_name ASC",
};

pub struct SqlxResponsibleRepository {
    pub pool: PgPool,
}

impl SqlxResponsibleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_row(r: &PgRow) -> Responsible {
    Responsible {
        id: r.get("id"),
        secretariat_id: r.get("secretariat_id"),
        secretariat_name: r.get("secretariat_name"),
        subsecretariat_id: r.get("subsecretariat_id"),
        subsecretariat_name: r.get("subsecretariat_name"),
        full_name: r.get("full_name"),
        position: r.get("position"),
        email: r.get("email"),
        phone: r.get("phone"),
        is_active: r.get("is_active"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

#[async_trait]
impl RecordRepository for SqlxResponsibleRepository {
    type Record = Responsible;
    type Input = ResponsibleInput;

    async fn list(&self, filter: &ListFilter) -> anyhow::Result<Page<Responsible>> {
        let (rows, total) = query::fetch_page(&self.pool, &LIST, filter).await?;
        Ok(Page::new(
            rows.iter().map(map_row).collect(),
            filter.page,
            total,
        ))
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Responsible>> {
        let sql = format!("{} {} WHERE r.id = $1", SELECT, FROM);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(map_row))
    }

    async fn insert(&self, input: &ResponsibleInput) -> anyhow::Result<Responsible> {
        let id: Uuid = sqlx::query_scalar(
            r#"INSERT INTO responsibles
                 (secretariat_id, subsecretariat_id, full_name, position, email, phone)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING id"#,
        )
        .bind(input.secretariat_id)
        .bind(input.subsecretariat_id)
        .bind(input.full_name.trim())
        .bind(input.position.trim())
        .bind(non_blank(&input.email))
        .bind(non_blank(&input.phone))
        .fetch_one(&self.pool)
        .await?;
        self.find(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("responsible {} vanished after insert", id))
    }

    async fn update(
        &self,
        id: Uuid,
        input: &ResponsibleInput,
    ) -> anyhow::Result<Option<Responsible>> {
        let res = sqlx::query(
            r#"UPDATE responsibles
               SET secretariat_id = $2, subsecretariat_id = $3, full_name = $4, position = $5,
                   email = $6, phone = $7, updated_at = now()
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(input.secretariat_id)
        .bind(input.subsecretariat_id)
        .bind(input.full_name.trim())
        .bind(input.position.trim())
        .bind(non_blank(&input.email))
        .bind(non_blank(&input.phone))
        .execute(&self.pool)
        .await?;
        if res.rows_affected() == 0 {
            return Ok(None);
        }
        self.find(id).await
    }

    async fn set_active(&self, id: Uuid, active: bool) -> anyhow::Result<bool> {
        query::set_active(&self.pool, "responsibles", id, active).await
    }

    async fn conflicts(
        &self,
        input: &ResponsibleInput,
        _except: Option<Uuid>,
    ) -> anyhow::Result<FieldErrors> {
        let mut errors = FieldErrors::new();
        if !query::active_exists(&self.pool, "secretariats", input.secretariat_id).await? {
            errors.add("secretariat_id", "Select an active secretariat");
        }
        if let Some(sub_id) = input.subsecretariat_id {
            let parent: Option<Uuid> = sqlx::query_scalar(
                "SELECT secretariat_id FROM subsecretariats WHERE id = $1 AND is_active",
            )
            .bind(sub_id)
            .fetch_optional(&self.pool)
            .await?;
            match parent {
                None => errors.add("subsecretariat_id", "Select an active subsecretariat"),
                Some(p) if p != input.secretariat_id => errors.add(
                    "subsecretariat_id",
                    "The subsecretariat belongs to another secretariat",
                ),
                Some(_) => {}
            }
        }
        Ok(errors)
    }

    async fn active_dependents(&self, id: Uuid) -> anyhow::Result<i64> {
        query::count_dependents(&self.pool, &[("products", "responsible_id")], id).await
    }

    async fn options(&self, parent_id: Option<Uuid>) -> anyhow::Result<Vec<SelectOption>> {
        query::select_options(
            &self.pool,
            r#"SELECT id, full_name || ' (' || position || ')' AS label FROM responsibles
               WHERE is_active AND ($1::uuid IS NULL OR secretariat_id = $1)
               ORDER BY full_name"#,
            parent_id,
        )
        .await
    }
}
