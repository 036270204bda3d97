use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use crate::application::ports::evidence_repository::EvidenceRepository;
use crate::domain::evidence::{Evidence, NewEvidence};
use crate::infrastructure::db::PgPool;
use crate::infrastructure::db::query::non_blank;

const SELECT: &str = "SELECT e.id, e.indicator_id, e.original_filename, e.filename, \
                      e.content_type, e.size, e.storage_path, e.content_hash, e.description, \
                      e.uploaded_by, u.name AS uploaded_by_name, e.is_active, e.created_at \
                      FROM evidences e LEFT JOIN users u ON u.id = e.uploaded_by";

pub struct SqlxEvidenceRepository {
    pub pool: PgPool,
}

impl SqlxEvidenceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_row(r: &PgRow) -> Evidence {
    Evidence {
        id: r.get("id"),
        indicator_id: r.get("indicator_id"),
        original_filename: r.get("original_filename"),
        filename: r.get("filename"),
        content_type: r.get("content_type"),
        size: r.get("size"),
        storage_path: r.get("storage_path"),
        content_hash: r.get("content_hash"),
        description: r.get("description"),
        uploaded_by: r.get("uploaded_by"),
        uploaded_by_name: r.get("uploaded_by_name"),
        is_active: r.get("is_active"),
        created_at: r.get("created_at"),
    }
}

#[async_trait]
impl EvidenceRepository for SqlxEvidenceRepository {
    async fn list_for_indicator(
        &self,
        indicator_id: Uuid,
        include_inactive: bool,
    ) -> anyhow::Result<Vec<Evidence>> {
        let sql = format!(
            "{} WHERE e.indicator_id = $1 AND ($2 OR e.is_active) ORDER BY e.created_at DESC",
            SELECT
        );
        let rows = sqlx::query(&sql)
            .bind(indicator_id)
            .bind(include_inactive)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(map_row).collect())
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Evidence>> {
        let sql = format!("{} WHERE e.id = $1", SELECT);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(map_row))
    }

    async fn insert(&self, evidence: &NewEvidence) -> anyhow::Result<Evidence> {
        let id: Uuid = sqlx::query_scalar(
            r#"INSERT INTO evidences
                 (indicator_id, original_filename, filename, content_type, size,
                  storage_path, content_hash, description, uploaded_by)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               RETURNING id"#,
        )
        .bind(evidence.indicator_id)
        .bind(&evidence.original_filename)
        .bind(&evidence.filename)
        .bind(evidence.content_type.as_deref())
        .bind(evidence.size)
        .bind(&evidence.storage_path)
        .bind(&evidence.content_hash)
        .bind(non_blank(&evidence.description))
        .bind(evidence.uploaded_by)
        .fetch_one(&self.pool)
        .await?;
        self.find(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("evidence {} vanished after insert", id))
    }

    async fn set_active(&self, id: Uuid, active: bool) -> anyhow::Result<bool> {
        let res = sqlx::query("UPDATE evidences SET is_active = $2 WHERE id = $1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
