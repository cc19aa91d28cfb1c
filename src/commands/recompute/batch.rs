use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use rusqlite::Connection;
use tracing::{debug, info};

use crate::db::{
    configure_connection, ensure_output_columns, ensure_seed_schema, load_synonym_entries, load_unlocked_vendors,
    require_vendors_table, update_computed_keywords,
};
use crate::error::CkwError;
use crate::filter::RecordFilter;
use crate::keywords::{CURRENT_CKW_VERSION, Thesaurus, compute_keywords, needs_update};
use crate::model::RecomputeCounts;

#[derive(Debug, Clone)]
pub(super) struct RecomputeOptions {
    pub(super) dry_run: bool,
    pub(super) limit: usize,
    pub(super) batch_size: usize,
    pub(super) filter: RecordFilter,
}

#[derive(Debug, Clone, Default)]
pub(super) struct RecomputeOutcome {
    pub(super) counts: RecomputeCounts,
    pub(super) thesaurus_terms: usize,
    pub(super) skipped_seed_rows: usize,
}

impl RecomputeOutcome {
    pub(super) fn new(dry_run: bool) -> Self {
        Self {
            counts: RecomputeCounts {
                dry_run,
                ..RecomputeCounts::default()
            },
            ..Self::default()
        }
    }
}

/// Source of the stop request polled between rows and before each commit.
pub(super) trait Interrupt {
    fn requested(&self) -> bool;
}

impl Interrupt for AtomicBool {
    fn requested(&self) -> bool {
        self.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
struct PendingUpdate {
    id: i64,
    computed_keywords: String,
}

/// Recomputes keywords for the selected unlocked vendors and commits changed
/// rows `batch_size` at a time. Dry-run diffs go to `out`. `outcome` keeps
/// the counts reached so far when the run stops early.
pub(super) fn recompute_into(
    outcome: &mut RecomputeOutcome,
    connection: &mut Connection,
    db_path: &Path,
    options: &RecomputeOptions,
    interrupted: &dyn Interrupt,
    out: &mut dyn Write,
) -> Result<()> {
    require_vendors_table(connection, db_path)?;
    if !options.dry_run {
        configure_connection(connection)?;
        ensure_seed_schema(connection)?;
        ensure_output_columns(connection)?;
    }

    let seeds = load_synonym_entries(connection)?;
    let thesaurus = Thesaurus::from_entries(&seeds);
    info!(
        seed_rows = seeds.len(),
        terms = thesaurus.term_count(),
        skipped_seed_rows = thesaurus.skipped_entries(),
        "thesaurus built"
    );

    outcome.thesaurus_terms = thesaurus.term_count();
    outcome.skipped_seed_rows = thesaurus.skipped_entries();

    let rows = load_unlocked_vendors(connection, &options.filter, options.limit)?;
    check_interrupted(interrupted, 0)?;
    let total = rows.len();
    if total == 0 {
        writeln!(out, "No unlocked rows matched the filter.")?;
        return Ok(());
    }
    writeln!(out, "Scanning {total} unlocked row(s)...")?;

    let batch_size = options.batch_size.max(1);
    let counts = &mut outcome.counts;
    let mut pending = Vec::<PendingUpdate>::with_capacity(batch_size);

    for (index, record) in rows.iter().enumerate() {
        check_interrupted(interrupted, counts.updated)?;
        counts.scanned += 1;
        let position = index + 1;

        let computed_keywords = compute_keywords(record, &thesaurus);
        if !needs_update(record, &computed_keywords) {
            counts.skipped_unchanged += 1;
            if position % batch_size == 0 {
                debug!(
                    position,
                    total,
                    skipped_unchanged = counts.skipped_unchanged,
                    "scan progress"
                );
            }
            continue;
        }

        if options.dry_run {
            counts.would_update += 1;
            writeln!(
                out,
                "[dry-run] id={} :: '{}' -> '{}'",
                record.id,
                record.computed_keywords.as_deref().unwrap_or_default().trim(),
                computed_keywords
            )?;
            continue;
        }

        pending.push(PendingUpdate {
            id: record.id,
            computed_keywords,
        });

        if pending.len() >= batch_size {
            check_interrupted(interrupted, counts.updated)?;
            counts.updated += flush_batch(connection, &mut pending)?;
            info!(
                position,
                total,
                updated = counts.updated,
                skipped_unchanged = counts.skipped_unchanged,
                "batch committed"
            );
        }
    }

    if !pending.is_empty() {
        check_interrupted(interrupted, counts.updated)?;
        counts.updated += flush_batch(connection, &mut pending)?;
        info!(
            updated = counts.updated,
            skipped_unchanged = counts.skipped_unchanged,
            "final batch committed"
        );
    }

    Ok(())
}

/// Writes all pending updates in one transaction.
fn flush_batch(connection: &mut Connection, pending: &mut Vec<PendingUpdate>) -> Result<usize> {
    if pending.is_empty() {
        return Ok(0);
    }

    let tx = connection.transaction()?;
    let mut updated = 0usize;
    for update in pending.drain(..) {
        update_computed_keywords(&tx, update.id, &update.computed_keywords, CURRENT_CKW_VERSION)?;
        updated += 1;
    }
    tx.commit()?;

    Ok(updated)
}

fn check_interrupted(interrupted: &dyn Interrupt, committed: usize) -> Result<(), CkwError> {
    if interrupted.requested() {
        return Err(CkwError::Interrupted { committed });
    }
    Ok(())
}
