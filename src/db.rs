use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result, bail};
use rusqlite::types::{Value, ValueRef};
use rusqlite::{Connection, OpenFlags, Row, params, params_from_iter};

use crate::error::CkwError;
use crate::filter::RecordFilter;
use crate::model::{SynonymEntry, VendorRecord};

pub const VENDORS_TABLE: &str = "vendors";
pub const SEEDS_TABLE: &str = "ckw_seeds";

/// Text columns read from `vendors`, in `VendorRecord` field order.
const VENDOR_TEXT_COLUMNS: &[&str] = &[
    "business_name",
    "category",
    "service",
    "contact_name",
    "phone",
    "email",
    "website",
    "keywords",
    "ckw_manual_extra",
    "computed_keywords",
    "ckw_version",
];

/// Opens an existing database; a missing file is reported like a missing `vendors` table.
pub fn open_existing(db_path: &Path, read_only: bool) -> Result<Connection> {
    if !db_path.exists() {
        return Err(schema_missing(db_path).into());
    }
    if read_only {
        open_read_only(db_path)
    } else {
        open_read_write(db_path)
    }
}

/// Opens without touching the file; `configure_connection` runs once the schema is checked.
pub fn open_read_write(db_path: &Path) -> Result<Connection> {
    Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("failed to open database: {}", db_path.display()))
}

pub fn open_read_only(db_path: &Path) -> Result<Connection> {
    Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("failed to open database read-only: {}", db_path.display()))
}

/// Per-connection settings only; the file's journal mode belongs to its owner.
pub fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

pub fn table_exists(connection: &Connection, table_name: &str) -> Result<bool> {
    let count: i64 = connection
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table_name],
            |row| row.get(0),
        )
        .with_context(|| format!("failed to look up table {table_name}"))?;
    Ok(count > 0)
}

pub fn require_vendors_table(connection: &Connection, db_path: &Path) -> Result<()> {
    if !table_exists(connection, VENDORS_TABLE)? {
        return Err(schema_missing(db_path).into());
    }
    Ok(())
}

fn schema_missing(db_path: &Path) -> CkwError {
    CkwError::SchemaMissing {
        table: VENDORS_TABLE.to_string(),
        db_path: db_path.display().to_string(),
    }
}

pub fn table_columns(connection: &Connection, table_name: &str) -> Result<HashSet<String>> {
    let pragma_sql = format!("PRAGMA table_info(\"{table_name}\")");
    let mut statement = connection
        .prepare(&pragma_sql)
        .with_context(|| format!("failed to inspect schema for table {table_name}"))?;

    let mut columns = HashSet::new();
    let mut rows = statement.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        columns.insert(name.to_ascii_lowercase());
    }
    Ok(columns)
}

pub fn ensure_column_exists(
    connection: &Connection,
    table_name: &str,
    column_definition: &str,
) -> Result<()> {
    let Some(column_name) = column_definition.split_whitespace().next() else {
        bail!("invalid column definition: {column_definition}");
    };

    if table_columns(connection, table_name)?.contains(&column_name.to_ascii_lowercase()) {
        return Ok(());
    }

    let alter_sql = format!("ALTER TABLE \"{table_name}\" ADD COLUMN {column_definition}");
    connection
        .execute(&alter_sql, [])
        .with_context(|| format!("failed to add column {column_name} on {table_name}"))?;
    Ok(())
}

/// Adds the engine-owned output columns to `vendors` when an older schema lacks them.
pub fn ensure_output_columns(connection: &Connection) -> Result<()> {
    ensure_column_exists(connection, VENDORS_TABLE, "computed_keywords TEXT")?;
    ensure_column_exists(connection, VENDORS_TABLE, "ckw_version TEXT")?;
    Ok(())
}

pub fn ensure_seed_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS ckw_seeds (
              id   INTEGER PRIMARY KEY,
              kind TEXT NOT NULL,
              term TEXT NOT NULL,
              syn  TEXT NOT NULL
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_ckw_seeds_unique ON ckw_seeds(kind, term, syn);
            ",
        )
        .context("failed to ensure ckw_seeds schema")?;
    Ok(())
}

/// Reads every seed triple; a missing table reads as no seeds.
pub fn load_synonym_entries(connection: &Connection) -> Result<Vec<SynonymEntry>> {
    if !table_exists(connection, SEEDS_TABLE)? {
        return Ok(Vec::new());
    }

    let mut statement = connection
        .prepare("SELECT kind, term, syn FROM ckw_seeds ORDER BY id")
        .context("failed to prepare ckw_seeds query")?;
    let entries = statement
        .query_map([], |row| {
            Ok(SynonymEntry {
                kind: text_value(row, 0)?.unwrap_or_default(),
                term: text_value(row, 1)?.unwrap_or_default(),
                synonym: text_value(row, 2)?.unwrap_or_default(),
            })
        })?
        .collect::<rusqlite::Result<Vec<SynonymEntry>>>()
        .context("failed to read ckw_seeds rows")?;

    Ok(entries)
}

/// Unlocked vendors matching `filter`, ordered by id, capped at `limit` when non-zero.
pub fn load_unlocked_vendors(
    connection: &Connection,
    filter: &RecordFilter,
    limit: usize,
) -> Result<Vec<VendorRecord>> {
    let columns = table_columns(connection, VENDORS_TABLE)?;
    let mut sql = format!(
        "SELECT {} FROM vendors WHERE {}",
        vendor_select_list(&columns)?,
        unlocked_predicate(&columns)
    );

    let (filter_sql, mut values) = filter.to_sql(&columns)?;
    if !filter_sql.is_empty() {
        sql.push_str(&format!(" AND ({filter_sql})"));
    }
    sql.push_str(" ORDER BY id");
    if limit > 0 {
        sql.push_str(" LIMIT ?");
        values.push(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
    }

    let mut statement = connection
        .prepare(&sql)
        .context("failed to prepare vendor selection")?;
    let rows = statement
        .query_map(params_from_iter(values), vendor_from_row)?
        .collect::<rusqlite::Result<Vec<VendorRecord>>>()
        .context("failed to read vendor rows")?;

    Ok(rows)
}

pub fn load_vendor_by_id(connection: &Connection, id: i64) -> Result<Option<VendorRecord>> {
    let columns = table_columns(connection, VENDORS_TABLE)?;
    let sql = format!(
        "SELECT {} FROM vendors WHERE id = ?1",
        vendor_select_list(&columns)?
    );

    let mut statement = connection
        .prepare(&sql)
        .context("failed to prepare vendor lookup")?;
    let mut rows = statement.query_map(params![id], vendor_from_row)?;
    let record = rows
        .next()
        .transpose()
        .with_context(|| format!("failed to read vendor {id}"))?;
    Ok(record)
}

pub fn update_computed_keywords(
    connection: &Connection,
    id: i64,
    computed_keywords: &str,
    ckw_version: &str,
) -> Result<()> {
    connection
        .execute(
            "UPDATE vendors SET computed_keywords = ?1, ckw_version = ?2 WHERE id = ?3",
            params![computed_keywords, ckw_version, id],
        )
        .with_context(|| format!("failed to update computed keywords for vendor {id}"))?;
    Ok(())
}

pub fn count_rows(connection: &Connection, table_name: &str) -> Result<i64> {
    if !table_exists(connection, table_name)? {
        return Ok(0);
    }
    let count = connection
        .query_row(&format!("SELECT COUNT(*) FROM \"{table_name}\""), [], |row| {
            row.get(0)
        })
        .with_context(|| format!("failed to count rows in {table_name}"))?;
    Ok(count)
}

pub fn count_locked_vendors(connection: &Connection) -> Result<i64> {
    let columns = table_columns(connection, VENDORS_TABLE)?;
    if !columns.contains("ckw_locked") {
        return Ok(0);
    }
    let count = connection
        .query_row(
            "SELECT COUNT(*) FROM vendors WHERE coalesce(ckw_locked, 0) != 0",
            [],
            |row| row.get(0),
        )
        .context("failed to count locked vendors")?;
    Ok(count)
}

/// Unlocked vendors whose stored version tag differs from `current_version`.
pub fn count_stale_vendors(connection: &Connection, current_version: &str) -> Result<i64> {
    let columns = table_columns(connection, VENDORS_TABLE)?;
    let version_predicate = if columns.contains("ckw_version") {
        "coalesce(CAST(ckw_version AS TEXT), '') != ?1"
    } else {
        "?1 IS NOT NULL"
    };
    let sql = format!(
        "SELECT COUNT(*) FROM vendors WHERE {} AND {version_predicate}",
        unlocked_predicate(&columns)
    );
    let count = connection
        .query_row(&sql, params![current_version], |row| row.get(0))
        .context("failed to count stale vendors")?;
    Ok(count)
}

/// SHA-256 over the ordered `sqlite_master` definitions.
pub fn schema_checksum(connection: &Connection) -> Result<String> {
    let mut statement = connection
        .prepare(
            "SELECT sql FROM sqlite_master WHERE type IN ('table', 'index', 'view', 'trigger') ORDER BY 1",
        )
        .context("failed to prepare schema query")?;
    let parts = statement
        .query_map([], |row| row.get::<_, Option<String>>(0))?
        .collect::<rusqlite::Result<Vec<Option<String>>>>()
        .context("failed to read schema definitions")?
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect::<Vec<String>>();

    Ok(crate::util::sha256_hex(parts.join("\n").as_bytes()))
}

fn unlocked_predicate(columns: &HashSet<String>) -> &'static str {
    if columns.contains("ckw_locked") {
        "coalesce(ckw_locked, 0) = 0"
    } else {
        "1 = 1"
    }
}

fn vendor_select_list(columns: &HashSet<String>) -> Result<String> {
    if !columns.contains("id") {
        bail!("vendors table has no id column");
    }

    let mut select = vec!["id".to_string()];
    for column in VENDOR_TEXT_COLUMNS {
        if columns.contains(*column) {
            select.push(format!("\"{column}\""));
        } else {
            select.push(format!("NULL AS \"{column}\""));
        }
    }
    if columns.contains("ckw_locked") {
        select.push("CASE WHEN coalesce(ckw_locked, 0) = 0 THEN 0 ELSE 1 END".to_string());
    } else {
        select.push("0".to_string());
    }

    Ok(select.join(", "))
}

fn vendor_from_row(row: &Row<'_>) -> rusqlite::Result<VendorRecord> {
    Ok(VendorRecord {
        id: row.get(0)?,
        business_name: text_value(row, 1)?,
        category: text_value(row, 2)?,
        service: text_value(row, 3)?,
        contact_name: text_value(row, 4)?,
        phone: text_value(row, 5)?,
        email: text_value(row, 6)?,
        website: text_value(row, 7)?,
        keywords: text_value(row, 8)?,
        ckw_manual_extra: text_value(row, 9)?,
        computed_keywords: text_value(row, 10)?,
        ckw_version: text_value(row, 11)?,
        ckw_locked: row.get::<_, i64>(12)? != 0,
    })
}

/// Reads any SQLite storage class as text so odd values never abort a run.
fn text_value(row: &Row<'_>, index: usize) -> rusqlite::Result<Option<String>> {
    let value = match row.get_ref(index)? {
        ValueRef::Null => None,
        ValueRef::Integer(value) => Some(value.to_string()),
        ValueRef::Real(value) => Some(value.to_string()),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Some(String::from_utf8_lossy(bytes).into_owned())
        }
    };
    Ok(value)
}
