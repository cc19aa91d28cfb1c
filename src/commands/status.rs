use std::io::{self, Write};

use anyhow::Result;
use rusqlite::Connection;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::db::{
    SEEDS_TABLE, VENDORS_TABLE, count_locked_vendors, count_rows, count_stale_vendors,
    open_read_only, schema_checksum, table_exists,
};
use crate::keywords::CURRENT_CKW_VERSION;
use crate::model::RowCounts;
use crate::util::write_json_pretty;

#[derive(Debug, Clone, PartialEq, Eq)]
struct StatusReport {
    row_counts: RowCounts,
    locked_vendors: i64,
    stale_vendors: i64,
    schema_checksum: String,
}

pub fn run(args: StatusArgs) -> Result<()> {
    info!(db_path = %args.db_path.display(), "status requested");

    if !args.db_path.exists() {
        warn!(path = %args.db_path.display(), "database file missing");
        return Ok(());
    }

    let connection = open_read_only(&args.db_path)?;
    let report = collect_status(&connection)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    render_status(&report, &mut out)?;

    if let Some(baseline_path) = &args.baseline_path {
        write_json_pretty(baseline_path, &report.row_counts)?;
        info!(path = %baseline_path.display(), "row-count baseline written");
    }

    Ok(())
}

fn collect_status(connection: &Connection) -> Result<StatusReport> {
    let row_counts = RowCounts {
        categories: count_rows(connection, "categories")?,
        ckw_seeds: count_rows(connection, SEEDS_TABLE)?,
        services: count_rows(connection, "services")?,
        vendors: count_rows(connection, VENDORS_TABLE)?,
    };

    let (locked_vendors, stale_vendors) = if table_exists(connection, VENDORS_TABLE)? {
        (
            count_locked_vendors(connection)?,
            count_stale_vendors(connection, CURRENT_CKW_VERSION)?,
        )
    } else {
        warn!("vendors table missing");
        (0, 0)
    };

    Ok(StatusReport {
        row_counts,
        locked_vendors,
        stale_vendors,
        schema_checksum: schema_checksum(connection)?,
    })
}

fn render_status(report: &StatusReport, out: &mut dyn Write) -> Result<()> {
    let counts = &report.row_counts;
    writeln!(out, "vendors={}", counts.vendors)?;
    writeln!(out, "categories={}", counts.categories)?;
    writeln!(out, "services={}", counts.services)?;
    writeln!(out, "ckw_seeds={}", counts.ckw_seeds)?;
    writeln!(out, "locked_vendors={}", report.locked_vendors)?;
    writeln!(
        out,
        "stale_vendors={} (current {CURRENT_CKW_VERSION})",
        report.stale_vendors
    )?;
    writeln!(out, "schema_sha256={}", report.schema_checksum)?;
    Ok(())
}
