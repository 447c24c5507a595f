//! Shared helpers for list queries and row decoding

use anyhow::{Context, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::str::FromStr;

use crate::models::{ListParams, PagedResult};

/// Describes how a table is listed: which columns the free-text search
/// covers and which filter maps onto which column.
pub(crate) struct ListQuery<'a> {
    pub table: &'static str,
    pub columns: &'static str,
    pub search_columns: &'static [&'static str],
    pub filters: Vec<(&'static str, Option<&'a str>)>,
}

/// Append `WHERE ...` for the search term and every present equality filter
fn push_conditions(qb: &mut QueryBuilder<'_, Sqlite>, list: &ListQuery<'_>, search: Option<&str>) {
    let mut first = true;
    let mut and = |qb: &mut QueryBuilder<'_, Sqlite>| {
        qb.push(if first { " WHERE " } else { " AND " });
        first = false;
    };

    if let Some(term) = search {
        if !list.search_columns.is_empty() {
            let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
            and(qb);
            qb.push("(");
            for (idx, column) in list.search_columns.iter().enumerate() {
                if idx > 0 {
                    qb.push(" OR ");
                }
                qb.push("LOWER(COALESCE(")
                    .push(*column)
                    .push(", '')) LIKE ")
                    .push_bind(pattern.clone())
                    .push(" ESCAPE '\\'");
            }
            qb.push(")");
        }
    }

    for (column, value) in &list.filters {
        if let Some(value) = value {
            and(qb);
            qb.push(*column).push(" = ").push_bind(value.to_string());
        }
    }
}

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Run a filtered, paginated list query (newest first)
pub(crate) async fn fetch_page<T>(
    pool: &SqlitePool,
    list: ListQuery<'_>,
    params: &ListParams,
    map: impl Fn(&SqliteRow) -> Result<T>,
) -> Result<PagedResult<T>> {
    let search = params.search.as_deref();

    let mut count_qb = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", list.table));
    push_conditions(&mut count_qb, &list, search);
    let total: i64 = count_qb
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await
        .with_context(|| format!("Failed to count {}", list.table))?;

    let mut qb = QueryBuilder::new(format!("SELECT {} FROM {}", list.columns, list.table));
    push_conditions(&mut qb, &list, search);
    qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(params.limit)
        .push(" OFFSET ")
        .push_bind(params.offset());

    let rows = qb
        .build()
        .fetch_all(pool)
        .await
        .with_context(|| format!("Failed to list {}", list.table))?;

    let items = rows.iter().map(map).collect::<Result<Vec<_>>>()?;
    Ok(PagedResult::new(items, total, params))
}

/// Decode a TEXT column into a string-backed enum
pub(crate) fn get_enum<T>(row: &SqliteRow, column: &str) -> Result<T>
where
    T: FromStr<Err = anyhow::Error>,
{
    let raw: String = row.try_get(column)?;
    T::from_str(&raw).with_context(|| format!("Invalid value in column {}", column))
}

/// Decode a TEXT column holding JSON
pub(crate) fn get_json<T: serde::de::DeserializeOwned>(row: &SqliteRow, column: &str) -> Result<T> {
    let raw: String = row.try_get(column)?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in column {}", column))
}

/// True when a sqlx error is a UNIQUE constraint violation
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<sqlx::Error>()
            .and_then(|e| e.as_database_error())
            .map(|db| db.is_unique_violation())
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_conditions_sql() {
        let list = ListQuery {
            table: "courses",
            columns: "*",
            search_columns: &["title", "description"],
            filters: vec![("status", Some("published")), ("category", None)],
        };
        let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new("SELECT * FROM courses");
        push_conditions(&mut qb, &list, Some("Rust"));
        let sql = qb.sql();
        assert!(sql.contains("WHERE (LOWER(COALESCE(title, '')) LIKE ?"));
        assert!(sql.contains(" OR LOWER(COALESCE(description, '')) LIKE ?"));
        assert!(sql.contains(" AND status = ?"));
        assert!(!sql.contains("category ="));
    }
}
