use async_trait::async_trait;
use sqlx::Row;

use crate::application::ports::dashboard_repository::{
    DashboardRepository, EntityCount, IndicatorProgressRow,
};
use crate::infrastructure::db::PgPool;

/// (label, list path, table)
const COUNTED: &[(&str, &str, &str)] = &[
    ("Departments", "/departments", "departments"),
    ("Municipalities", "/municipalities", "municipalities"),
    ("Mayoralties", "/mayoralties", "mayoralties"),
    ("Mayors", "/mayors", "mayors"),
    ("Secretariats", "/secretariats", "secretariats"),
    ("Subsecretariats", "/subsecretariats", "subsecretariats"),
    ("Responsible parties", "/responsibles", "responsibles"),
    ("National plans", "/national-plans", "national_plans"),
    ("Departmental plans", "/departmental-plans", "departmental_plans"),
    ("Municipal plans", "/municipal-plans", "municipal_plans"),
    ("Programs", "/programs", "programs"),
    ("Products", "/products", "products"),
    ("Indicators", "/indicators", "indicators"),
    ("Sustainable Development Goals", "/sdgs", "sdgs"),
];

/// Same rule as `domain::planning::progress_percent`: share of the
/// baseline-to-target distance covered, clamped to 0..=100.
const PROGRESS_EXPR: &str = "CASE WHEN i.target = i.baseline \
                             THEN CASE WHEN i.current_value = i.target THEN 100.0 ELSE 0.0 END \
                             ELSE LEAST(GREATEST((i.current_value - i.baseline) \
                             / (i.target - i.baseline) * 100.0, 0.0), 100.0) END";

pub struct SqlxDashboardRepository {
    pub pool: PgPool,
}

impl SqlxDashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn counts_sql() -> String {
    COUNTED
        .iter()
        .enumerate()
        .map(|(i, (_, _, table))| {
            format!(
                "SELECT {} AS pos, COUNT(*) AS count FROM {} WHERE is_active",
                i, table
            )
        })
        .collect::<Vec<_>>()
        .join(" UNION ALL ")
}

fn lagging_sql() -> String {
    format!(
        "SELECT i.id, i.code, i.name, p.name AS product_name, i.unit, \
         i.baseline, i.target, i.current_value, ({})::float8 AS progress \
         FROM indicators i JOIN products p ON p.id = i.product_id \
         WHERE i.is_active ORDER BY progress ASC, i.code ASC LIMIT $1",
        PROGRESS_EXPR
    )
}

#[async_trait]
impl DashboardRepository for SqlxDashboardRepository {
    async fn active_counts(&self) -> anyhow::Result<Vec<EntityCount>> {
        let sql = counts_sql();
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        let mut counts = vec![0i64; COUNTED.len()];
        for r in rows {
            let pos: i32 = r.get("pos");
            if let Some(slot) = counts.get_mut(pos as usize) {
                *slot = r.get("count");
            }
        }
        Ok(COUNTED
            .iter()
            .zip(counts)
            .map(|((label, path, _), count)| EntityCount {
                label: (*label).to_string(),
                path: (*path).to_string(),
                count,
            })
            .collect())
    }

    async fn lagging_indicators(&self, limit: i64) -> anyhow::Result<Vec<IndicatorProgressRow>> {
        let sql = lagging_sql();
        let rows = sqlx::query(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| IndicatorProgressRow {
                id: r.get("id"),
                code: r.get("code"),
                name: r.get("name"),
                product_name: r.get("product_name"),
                unit: r.get("unit"),
                baseline: r.get("baseline"),
                target: r.get("target"),
                current_value: r.get("current_value"),
                progress: r.get("progress"),
            })
            .collect())
    }

    async fn average_progress(&self) -> anyhow::Result<Option<f64>> {
        let sql = format!(
            "SELECT AVG(({})::float8) FROM indicators i WHERE i.is_active",
            PROGRESS_EXPR
        );
        let avg: Option<f64> = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(avg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_query_covers_every_entity() {
        let sql = counts_sql();
        assert_eq!(sql.matches("UNION ALL").count(), COUNTED.len() - 1);
        assert!(sql.starts_with("SELECT 0 AS pos, COUNT(*) AS count FROM departments"));
    }

    #[test]
    fn lagging_query_orders_and_limits_in_sql() {
        let sql = lagging_sql();
        assert!(sql.contains("AS progress FROM indicators i JOIN products p"));
        assert!(sql.ends_with("WHERE i.is_active ORDER BY progress ASC, i.code ASC LIMIT $1"));
    }

    #[test]
    fn progress_expression_clamps_and_handles_flat_span() {
        assert!(PROGRESS_EXPR.starts_with(
            "CASE WHEN i.target = i.baseline THEN CASE WHEN i.current_value = i.target THEN 100.0 ELSE 0.0 END"
        ));
        assert!(PROGRESS_EXPR.contains(
            "LEAST(GREATEST((i.current_value - i.baseline) / (i.target - i.baseline) * 100.0, 0.0), 100.0)"
        ));
    }
}
