use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use crate::application::ports::record_repository::RecordRepository;
use crate::domain::paging::{ListFilter, Page, SelectOption};
use crate::domain::planning::{Product, ProductInput, SdgRef};
use crate::domain::validation::FieldErrors;
use crate::infrastructure::db::PgPool;
use crate::infrastructure::db::query::{self, ListSpec, Unique, non_blank};

const SELECT: &str = "SELECT pr.id, pr.program_id, g.name AS program_name, pr.responsible_id, \
                      r.full_name AS responsible_name, pr.code, pr.name, pr.description, \
                      pr.is_active, pr.created_at, pr.updated_at";
const FROM: &str = "FROM products pr \
                    JOIN programs g ON g.id = pr.program_id \
                    LEFT JOIN responsibles r ON r.id = pr.responsible_id";

const LIST: ListSpec<'static> = ListSpec {
    select: SELECT,
    from: FROM,
    alias: "pr",
    search: &["pr.name", "pr.code"],
    parent: Some("pr.program_id"),
    order_by: "pr.code ASC",
};

pub struct SqlxProductRepository {
    pub pool: PgPool,
}

impl SqlxProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn sdgs_for(&self, product_ids: &[Uuid]) -> anyhow::Result<HashMap<Uuid, Vec<SdgRef>>> {
        let mut by_product: HashMap<Uuid, Vec<SdgRef>> = HashMap::new();
        if product_ids.is_empty() {
            return Ok(by_product);
        }
        let rows = sqlx::query(
            r#"SELECT ps.product_id, s.id, s.number, s.name
               FROM product_sdgs ps JOIN sdgs s ON s.id = ps.sdg_id
               WHERE ps.product_id = ANY($1)
               ORDER BY s.number"#,
        )
        .bind(product_ids)
        .fetch_all(&self.pool)
        .await?;
        for r in rows {
            by_product
                .entry(r.get("product_id"))
                .or_default()
                .push(SdgRef {
                    id: r.get("id"),
                    number: r.get("number"),
                    name: r.get("name"),
                });
        }
        Ok(by_product)
    }
}

fn map_row(r: &PgRow) -> Product {
    Product {
        id: r.get("id"),
        program_id: r.get("program_id"),
        program_name: r.get("program_name"),
        responsible_id: r.get("responsible_id"),
        responsible_name: r.get("responsible_name"),
        code: r.get("code"),
        name: r.get("name"),
        description: r.get("description"),
        sdgs: Vec::new(),
        is_active: r.get("is_active"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

fn distinct(ids: &[Uuid]) -> Vec<Uuid> {
    ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
}

#[async_trait]
impl RecordRepository for SqlxProductRepository {
    type Record = Product;
    type Input = ProductInput;

    async fn list(&self, filter: &ListFilter) -> anyhow::Result<Page<Product>> {
        let (rows, total) = query::fetch_page(&self.pool, &LIST, filter).await?;
        let mut items: Vec<Product> = rows.iter().map(map_row).collect();
        let ids: Vec<Uuid> = items.iter().map(|p| p.id).collect();
        let mut sdgs = self.sdgs_for(&ids).await?;
        for item in items.iter_mut() {
            item.sdgs = sdgs.remove(&item.id).unwrap_or_default();
        }
        Ok(Page::new(items, filter.page, total))
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Product>> {
        let sql = format!("{} {} WHERE pr.id = $1", SELECT, FROM);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let mut product = map_row(&row);
        product.sdgs = self.sdgs_for(&[id]).await?.remove(&id).unwrap_or_default();
        Ok(Some(product))
    }

    async fn insert(&self, input: &ProductInput) -> anyhow::Result<Product> {
        let mut tx = self.pool.begin().await?;
        let id: Uuid = sqlx::query_scalar(
            r#"INSERT INTO products (program_id, responsible_id, code, name, description)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING id"#,
        )
        .bind(input.program_id)
        .bind(input.responsible_id)
        .bind(input.code.trim())
        .bind(input.name.trim())
        .bind(non_blank(&input.description))
        .fetch_one(&mut *tx)
        .await?;
        sqlx::query("INSERT INTO product_sdgs (product_id, sdg_id) SELECT $1, UNNEST($2::uuid[])")
            .bind(id)
            .bind(distinct(&input.sdg_ids))
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        self.find(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("product {} vanished after insert", id))
    }

    async fn update(&self, id: Uuid, input: &ProductInput) -> anyhow::Result<Option<Product>> {
        let mut tx = self.pool.begin().await?;
        let res = sqlx::query(
            r#"UPDATE products
               SET program_id = $2, responsible_id = $3, code = $4, name = $5,
                   description = $6, updated_at = now()
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(input.program_id)
        .bind(input.responsible_id)
        .bind(input.code.trim())
        .bind(input.name.trim())
        .bind(non_blank(&input.description))
        .execute(&mut *tx)
        .await?;
        if res.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }
        sqlx::query("DELETE FROM product_sdgs WHERE product_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT INTO product_sdgs (product_id, sdg_id) SELECT $1, UNNEST($2::uuid[])")
            .bind(id)
            .bind(distinct(&input.sdg_ids))
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        self.find(id).await
    }

    async fn set_active(&self, id: Uuid, active: bool) -> anyhow::Result<bool> {
        query::set_active(&self.pool, "products", id, active).await
    }

    async fn conflicts(
        &self,
        input: &ProductInput,
        except: Option<Uuid>,
    ) -> anyhow::Result<FieldErrors> {
        let mut errors = FieldErrors::new();
        if !query::active_exists(&self.pool, "programs", input.program_id).await? {
            errors.add("program_id", "Select an active program");
        }
        if let Some(responsible_id) = input.responsible_id {
            if !query::active_exists(&self.pool, "responsibles", responsible_id).await? {
                errors.add("responsible_id", "Select an active responsible party");
            }
        }
        let code = Unique {
            table: "products",
            column: "code",
            case_insensitive: false,
            scope: Some(("program_id", input.program_id)),
        };
        if query::value_taken(&self.pool, code, &input.code, except).await? {
            errors.add("code", "This program already has a product with this code");
        }
        let wanted = distinct(&input.sdg_ids);
        if !wanted.is_empty() {
            let active: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM sdgs WHERE id = ANY($1) AND is_active",
            )
            .bind(&wanted)
            .fetch_one(&self.pool)
            .await?;
            if active != wanted.len() as i64 {
                errors.add("sdg_ids", "Select only active goals");
            }
        }
        Ok(errors)
    }

    async fn active_dependents(&self, id: Uuid) -> anyhow::Result<i64> {
        query::count_dependents(&self.pool, &[("indicators", "product_id")], id).await
    }

    async fn options(&self, parent_id: Option<Uuid>) -> anyhow::Result<Vec<SelectOption>> {
        query::select_options(
            &self.pool,
            r#"SELECT id, code || ' - ' || name AS label FROM products
               WHERE is_active AND ($1::uuid IS NULL OR program_id = $1)
               ORDER BY code"#,
            parent_id,
        )
        .await
    }
}
