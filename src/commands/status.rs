use std::fs;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use tracing::{info, warn};

use crate::cli::{SourceKind, StatusArgs};
use crate::sources::{self, SourceAdapter as _};

/// Read-only report: row counts for every known work/dimension table plus
/// how many run manifests have accumulated.
pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_dir = args.cache_root.join("manifests");

    info!(db = %args.db_path.display(), "status requested");

    if args.db_path.exists() {
        let connection = Connection::open(&args.db_path)
            .with_context(|| format!("failed to open {}", args.db_path.display()))?;

        for kind in [
            SourceKind::Books,
            SourceKind::Cleveland,
            SourceKind::Harvard,
            SourceKind::Met,
        ] {
            report_source(&connection, kind)?;
        }
    } else {
        warn!(path = %args.db_path.display(), "database file missing");
    }

    if manifest_dir.exists() {
        let manifest_count = fs::read_dir(&manifest_dir)
            .with_context(|| format!("failed to read {}", manifest_dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry
                    .path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
            })
            .count();
        info!(
            path = %manifest_dir.display(),
            manifest_count,
            "run manifests"
        );
    } else {
        warn!(path = %manifest_dir.display(), "manifest directory missing");
    }

    Ok(())
}

fn report_source(connection: &Connection, kind: SourceKind) -> Result<()> {
    let adapter = sources::adapter_for(kind)?;
    let spec = adapter.table_spec();

    if !table_exists(connection, spec.work_table)? {
        info!(source = kind.as_str(), "no table yet");
        return Ok(());
    }

    let works = query_count(connection, spec.work_table)?;
    info!(
        source = kind.as_str(),
        table = spec.work_table,
        works,
        "work count"
    );

    for dimension in spec.dimensions {
        if table_exists(connection, dimension.table)? {
            let names = query_count(connection, dimension.table)?;
            info!(
                source = kind.as_str(),
                table = dimension.table,
                names,
                "dimension count"
            );
        }
    }

    Ok(())
}

fn table_exists(connection: &Connection, table: &str) -> Result<bool> {
    let found: Option<String> = connection
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn query_count(connection: &Connection, table: &str) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {table}");
    let count = connection
        .query_row(&sql, [], |row| row.get(0))
        .with_context(|| format!("failed to count rows in {table}"))?;
    Ok(count)
}
