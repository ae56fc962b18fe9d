use anyhow::{Context, Result};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OptionalExtension, params_from_iter};

use crate::model::{InsertOutcome, WorkRecord};
use crate::sources::{DimensionSpec, TableSpec};

pub fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

/// Create-if-absent for one source's work table and its dimension tables.
/// Runs before any insert in a process lifetime; repeated runs are no-ops.
pub fn ensure_schema(connection: &Connection, spec: &TableSpec) -> Result<()> {
    for dimension in spec.dimensions {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (id INTEGER PRIMARY KEY, {} TEXT UNIQUE)",
            dimension.table, dimension.name_column
        );
        connection
            .execute(&sql, [])
            .with_context(|| format!("failed to create table {}", dimension.table))?;
    }

    let mut columns = vec![
        "id_key INTEGER PRIMARY KEY".to_string(),
        "title TEXT UNIQUE".to_string(),
        "creation_year INTEGER".to_string(),
    ];
    for dimension in spec.dimensions {
        columns.push(format!("{} INTEGER", dimension.fk_column));
    }
    for scalar in spec.scalars {
        columns.push(format!("{} {}", scalar.column, scalar.decl));
    }

    let sql = format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        spec.work_table,
        columns.join(", ")
    );
    connection
        .execute(&sql, [])
        .with_context(|| format!("failed to create table {}", spec.work_table))?;

    Ok(())
}

/// Find-or-create on the dimension's unique name column. Callers pass
/// trimmed names, so raw strings that normalize alike share one row.
pub fn resolve_dimension(
    connection: &Connection,
    dimension: &DimensionSpec,
    name: &str,
) -> Result<i64> {
    let select = format!(
        "SELECT id FROM {} WHERE {} = ?1",
        dimension.table, dimension.name_column
    );
    let existing: Option<i64> = connection
        .query_row(&select, [name], |row| row.get(0))
        .optional()
        .with_context(|| format!("failed to look up {} in {}", name, dimension.table))?;

    if let Some(id) = existing {
        return Ok(id);
    }

    let insert = format!(
        "INSERT INTO {} ({}) VALUES (?1)",
        dimension.table, dimension.name_column
    );
    connection
        .execute(&insert, [name])
        .with_context(|| format!("failed to insert {} into {}", name, dimension.table))?;

    Ok(connection.last_insert_rowid())
}

/// Insert-or-ignore keyed on the unique title. A duplicate title reports
/// `Ignored` without error; NULL titles never collide with each other.
pub fn insert_work(
    connection: &Connection,
    spec: &TableSpec,
    record: &WorkRecord,
    fk_ids: &[Option<i64>],
) -> Result<InsertOutcome> {
    let mut columns: Vec<&str> = vec!["title", "creation_year"];
    let mut values: Vec<SqlValue> = vec![
        match &record.title {
            Some(title) => SqlValue::Text(title.clone()),
            None => SqlValue::Null,
        },
        match record.creation_year {
            Some(year) => SqlValue::Integer(year),
            None => SqlValue::Null,
        },
    ];

    for (dimension, fk_id) in spec.dimensions.iter().zip(fk_ids) {
        columns.push(dimension.fk_column);
        values.push(match fk_id {
            Some(id) => SqlValue::Integer(*id),
            None => SqlValue::Null,
        });
    }

    for scalar in spec.scalars {
        let value = record
            .scalars
            .iter()
            .find(|(column, _)| *column == scalar.column)
            .map(|(_, value)| value.clone())
            .unwrap_or(SqlValue::Null);
        columns.push(scalar.column);
        values.push(value);
    }

    let placeholders = (1..=values.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT OR IGNORE INTO {} ({}) VALUES ({})",
        spec.work_table,
        columns.join(", "),
        placeholders
    );

    let changed = connection
        .execute(&sql, params_from_iter(values))
        .with_context(|| format!("failed to insert into {}", spec.work_table))?;

    if changed > 0 {
        Ok(InsertOutcome::Accepted(connection.last_insert_rowid()))
    } else {
        Ok(InsertOutcome::Ignored)
    }
}

pub fn count_works(connection: &Connection, spec: &TableSpec) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", spec.work_table);
    let count = connection
        .query_row(&sql, [], |row| row.get(0))
        .with_context(|| format!("failed to count rows in {}", spec.work_table))?;
    Ok(count)
}
