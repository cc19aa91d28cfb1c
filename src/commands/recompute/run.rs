use std::io::{self, Write};
use std::sync::atomic::AtomicBool;
use std::time::Instant;

use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};

use super::{Interrupt, RecomputeOptions, RecomputeOutcome, recompute_into};
use crate::cli::RecomputeArgs;
use crate::db::open_existing;
use crate::error::{EXIT_INTERRUPTED, exit_code_for};
use crate::filter::RecordFilter;
use crate::keywords::CURRENT_CKW_VERSION;
use crate::model::{RecomputeCounts, RecomputeRunManifest};
use crate::util::{now_utc_string, utc_compact_string, write_json_pretty};

pub fn run(args: RecomputeArgs, interrupted: &AtomicBool) -> Result<()> {
    let filter = RecordFilter::parse_all(&args.filters)?;
    let started_at = now_utc_string();
    let started = Instant::now();
    let run_id = format!("ckw-{}", utc_compact_string(Utc::now()));

    info!(
        db_path = %args.db_path.display(),
        run_id = %run_id,
        dry_run = args.dry_run,
        limit = args.limit,
        filters = ?filter.describe(),
        "starting keyword recompute"
    );

    let options = RecomputeOptions {
        dry_run: args.dry_run,
        limit: args.limit,
        batch_size: args.batch_size.max(1),
        filter,
    };
    let mut outcome = RecomputeOutcome::new(options.dry_run);
    let result = execute(&args, &options, &mut outcome, interrupted);

    if let Some(report_path) = &args.report_path {
        let status = run_status(&result);
        let manifest = RecomputeRunManifest {
            manifest_version: 1,
            run_id,
            started_at,
            finished_at: now_utc_string(),
            db_path: args.db_path.display().to_string(),
            ckw_version: CURRENT_CKW_VERSION.to_string(),
            filters: options.filter.describe(),
            limit: options.limit,
            batch_size: options.batch_size,
            thesaurus_terms: outcome.thesaurus_terms,
            skipped_seed_rows: outcome.skipped_seed_rows,
            counts: outcome.counts,
            duration_ms: started.elapsed().as_millis(),
            status: status.to_string(),
        };

        match write_json_pretty(report_path, &manifest) {
            Ok(()) => info!(path = %report_path.display(), status, "run report written"),
            Err(err) if result.is_ok() => return Err(err),
            // The run error takes precedence over a report failure.
            Err(err) => warn!(path = %report_path.display(), error = %err, "run report not written"),
        }
    }

    result
}

fn execute(
    args: &RecomputeArgs,
    options: &RecomputeOptions,
    outcome: &mut RecomputeOutcome,
    interrupted: &dyn Interrupt,
) -> Result<()> {
    let mut connection = open_existing(&args.db_path, options.dry_run)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    recompute_into(
        outcome,
        &mut connection,
        &args.db_path,
        options,
        interrupted,
        &mut out,
    )?;
    writeln!(out, "{}", summary_line(&outcome.counts))?;

    info!(
        scanned = outcome.counts.scanned,
        updated = outcome.counts.updated,
        skipped_unchanged = outcome.counts.skipped_unchanged,
        dry_run = outcome.counts.dry_run,
        "keyword recompute completed"
    );
    Ok(())
}

pub(super) fn run_status(result: &Result<()>) -> &'static str {
    match result {
        Ok(()) => "completed",
        Err(err) if exit_code_for(err) == EXIT_INTERRUPTED => "interrupted",
        Err(_) => "failed",
    }
}

pub(super) fn summary_line(counts: &RecomputeCounts) -> String {
    let mut line = format!(
        "Done. scanned={} updated={} skipped_unchanged={} dry_run={}",
        counts.scanned, counts.updated, counts.skipped_unchanged, counts.dry_run
    );
    if counts.dry_run {
        line.push_str(&format!(" would_update={}", counts.would_update));
    }
    line
}
