//! Shared SQL building for the catalog repositories: filtered paging,
//! uniqueness checks, dependent counts and soft-delete toggles.

use sqlx::postgres::PgRow;
use sqlx::{Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::domain::paging::{ListFilter, SelectOption};
use crate::infrastructure::db::PgPool;

/// Escapes `%`, `_` and `\` so user input matches literally inside `LIKE`.
pub fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Trimmed optional text, `None` when blank.
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Static description of a list query. `alias` qualifies `is_active`.
pub struct ListSpec<'a> {
    pub select: &'a str,
    pub from: &'a str,
    pub alias: &'a str,
    pub search: &'a [&'a str],
    pub parent: Option<&'a str>,
    pub order_by: &'a str,
}

pub fn push_where(qb: &mut QueryBuilder<'_, Postgres>, spec: &ListSpec<'_>, filter: &ListFilter) {
    let mut sep = " WHERE ";
    if !filter.include_inactive {
        qb.push(sep).push(spec.alias).push(".is_active");
        sep = " AND ";
    }
    if let (Some(column), Some(parent_id)) = (spec.parent, filter.parent_id) {
        qb.push(sep).push(column).push(" = ").push_bind(parent_id);
        sep = " AND ";
    }
    if let Some(term) = filter.search_term() {
        if !spec.search.is_empty() {
            let pattern = format!("%{}%", escape_like(term));
            qb.push(sep).push("(");
            for (i, column) in spec.search.iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                qb.push(*column).push(" ILIKE ").push_bind(pattern.clone());
            }
            qb.push(")");
        }
    }
}

pub fn count_query<'a>(spec: &ListSpec<'_>, filter: &ListFilter) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) ");
    qb.push(spec.from);
    push_where(&mut qb, spec, filter);
    qb
}

pub fn page_query<'a>(spec: &ListSpec<'_>, filter: &ListFilter) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new(spec.select);
    qb.push(" ").push(spec.from);
    push_where(&mut qb, spec, filter);
    qb.push(" ORDER BY ")
        .push(spec.order_by)
        .push(" LIMIT ")
        .push_bind(filter.page.per_page)
        .push(" OFFSET ")
        .push_bind(filter.page.offset());
    qb
}

/// Rows of the requested page plus the unpaged total.
pub async fn fetch_page(
    pool: &PgPool,
    spec: &ListSpec<'_>,
    filter: &ListFilter,
) -> anyhow::Result<(Vec<PgRow>, i64)> {
    let total = count_query(spec, filter)
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await?;
    let rows = page_query(spec, filter).build().fetch_all(pool).await?;
    Ok((rows, total))
}

pub async fn active_exists(pool: &PgPool, table: &str, id: Uuid) -> anyhow::Result<bool> {
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1 AND is_active)",
        table
    );
    let found: bool = sqlx::query_scalar(&sql).bind(id).fetch_one(pool).await?;
    Ok(found)
}

/// A text column that must be unique, optionally within a parent scope.
pub struct Unique<'a> {
    pub table: &'a str,
    pub column: &'a str,
    pub case_insensitive: bool,
    pub scope: Option<(&'a str, Uuid)>,
}

pub fn taken_query<'a>(
    unique: &Unique<'_>,
    value: &str,
    except: Option<Uuid>,
) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new("SELECT EXISTS(SELECT 1 FROM ");
    qb.push(unique.table).push(" WHERE ");
    if unique.case_insensitive {
        qb.push("LOWER(")
            .push(unique.column)
            .push(") = ")
            .push_bind(value.trim().to_lowercase());
    } else {
        qb.push(unique.column)
            .push(" = ")
            .push_bind(value.trim().to_string());
    }
    if let Some((column, parent_id)) = unique.scope {
        qb.push(" AND ").push(column).push(" = ").push_bind(parent_id);
    }
    if let Some(id) = except {
        qb.push(" AND id <> ").push_bind(id);
    }
    qb.push(")");
    qb
}

pub async fn value_taken(
    pool: &PgPool,
    unique: Unique<'_>,
    value: &str,
    except: Option<Uuid>,
) -> anyhow::Result<bool> {
    let taken = taken_query(&unique, value, except)
        .build_query_scalar::<bool>()
        .fetch_one(pool)
        .await?;
    Ok(taken)
}

/// `(table, foreign key column)` pairs whose active rows reference `id`.
pub fn dependents_sql(children: &[(&str, &str)]) -> String {
    if children.is_empty() {
        return "SELECT 0::BIGINT".to_string();
    }
    let parts: Vec<String> = children
        .iter()
        .map(|(table, column)| {
            format!(
                "(SELECT COUNT(*) FROM {} WHERE {} = $1 AND is_active)",
                table, column
            )
        })
        .collect();
    format!("SELECT {}", parts.join(" + "))
}

pub async fn count_dependents(
    pool: &PgPool,
    children: &[(&str, &str)],
    id: Uuid,
) -> anyhow::Result<i64> {
    let sql = dependents_sql(children);
    let count: i64 = sqlx::query_scalar(&sql).bind(id).fetch_one(pool).await?;
    Ok(count)
}

pub async fn set_active(pool: &PgPool, table: &str, id: Uuid, active: bool) -> anyhow::Result<bool> {
    let sql = format!(
        "UPDATE {} SET is_active = $2, updated_at = now() WHERE id = $1",
        table
    );
    let res = sqlx::query(&sql)
        .bind(id)
        .bind(active)
        .execute(pool)
        .await?;
    Ok(res.rows_affected() > 0)
}

/// `sql` selects `id` and `label`.
pub async fn root_options(pool: &PgPool, sql: &str) -> anyhow::Result<Vec<SelectOption>> {
    let rows = sqlx::query(sql).fetch_all(pool).await?;
    Ok(rows.iter().map(option_row).collect())
}

fn option_row(r: &PgRow) -> SelectOption {
    SelectOption {
        id: r.get("id"),
        label: r.get("label"),
    }
}

/// Like [`root_options`], with the optional parent bound as `$1`.
pub async fn select_options(
    pool: &PgPool,
    sql: &str,
    parent_id: Option<Uuid>,
) -> anyhow::Result<Vec<SelectOption>> {
    let rows = sqlx::query(sql).bind(parent_id).fetch_all(pool).await?;
    Ok(rows.iter().map(option_row).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::paging::PageRequest;

    const SPEC: ListSpec<'static> = ListSpec {
        select: "SELECT m.id, m.name, d.name AS department_name",
        from: "FROM municipalities m JOIN departments d ON d.id = m.department_id",
        alias: "m",
        search: &["m.name", "m.code"],
        parent: Some("m.department_id"),
        order_by: "m.name ASC",
    };

    #[test]
    fn blank_optional_text_is_null() {
        assert_eq!(non_blank(&Some("  ".into())), None);
        assert_eq!(non_blank(&Some(" a ".into())), Some("a"));
        assert_eq!(non_blank(&None), None);
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("50%_a\\b"), "50\\%\\_a\\\\b");
        assert_eq!(escape_like("Cali"), "Cali");
    }

    #[test]
    fn default_filter_hides_inactive_rows() {
        let qb = count_query(&SPEC, &ListFilter::default());
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM municipalities m JOIN departments d ON d.id = m.department_id WHERE m.is_active"
        );
    }

    #[test]
    fn search_parent_and_paging_are_bound() {
        let filter = ListFilter {
            page: PageRequest::new(Some(3), Some(10)),
            search: Some("  valle ".into()),
            parent_id: Some(Uuid::new_v4()),
            include_inactive: true,
        };
        let qb = page_query(&SPEC, &filter);
        assert_eq!(
            qb.sql(),
            "SELECT m.id, m.name, d.name AS department_name FROM municipalities m JOIN departments d ON d.id = m.department_id WHERE m.department_id = $1 AND (m.name ILIKE $2 OR m.code ILIKE $3) ORDER BY m.name ASC LIMIT $4 OFFSET $5"
        );
    }

    #[test]
    fn blank_search_adds_no_clause() {
        let filter = ListFilter {
            search: Some("   ".into()),
            include_inactive: true,
            ..ListFilter::default()
        };
        let qb = count_query(&SPEC, &filter);
        assert!(!qb.sql().contains("WHERE"));
    }

    #[test]
    fn uniqueness_check_is_scoped_and_excludes_self() {
        let unique = Unique {
            table: "municipalities",
            column: "name",
            case_insensitive: true,
            scope: Some(("department_id", Uuid::new_v4())),
        };
        let qb = taken_query(&unique, "Cali", Some(Uuid::new_v4()));
        assert_eq!(
            qb.sql(),
            "SELECT EXISTS(SELECT 1 FROM municipalities WHERE LOWER(name) = $1 AND department_id = $2 AND id <> $3)"
        );
    }

    #[test]
    fn dependents_sum_each_child_table() {
        assert_eq!(
            dependents_sql(&[("mayors", "mayoralty_id"), ("secretariats", "mayoralty_id")]),
            "SELECT (SELECT COUNT(*) FROM mayors WHERE mayoralty_id = $1 AND is_active) + (SELECT COUNT(*) FROM secretariats WHERE mayoralty_id = $1 AND is_active)"
        );
        assert_eq!(dependents_sql(&[]), "SELECT 0::BIGINT");
    }
}
