use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub const DEFAULT_DB_PATH: &str = "providers.db";
pub const DEFAULT_BATCH_SIZE: usize = 200;

#[derive(Parser, Debug)]
#[command(
    name = "ckw",
    version,
    about = "Computed-keyword indexing for the providers database"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Recompute computed_keywords for every unlocked vendor.
    Recompute(RecomputeArgs),
    /// Show how one vendor's keywords are derived, without writing.
    Explain(ExplainArgs),
    /// Row counts, keyword staleness and schema checksum.
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RecomputeArgs {
    #[arg(long, env = "SQLITE_PATH", default_value = DEFAULT_DB_PATH)]
    pub db_path: PathBuf,

    /// Print old -> new keywords for rows that would change; write nothing.
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Maximum number of rows to scan (0 = unlimited).
    #[arg(long, default_value_t = 0)]
    pub limit: usize,

    /// Row predicate such as `category=plumbing`, `id>=100` or `website~rio`; repeat to AND.
    #[arg(long = "where", value_name = "PREDICATE")]
    pub filters: Vec<String>,

    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Write a JSON run report to this path.
    #[arg(long)]
    pub report_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ExplainArgs {
    #[arg(long, env = "SQLITE_PATH", default_value = DEFAULT_DB_PATH)]
    pub db_path: PathBuf,

    #[arg(long)]
    pub id: i64,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, env = "SQLITE_PATH", default_value = DEFAULT_DB_PATH)]
    pub db_path: PathBuf,

    /// Write the table row counts as JSON to this path.
    #[arg(long)]
    pub baseline_path: Option<PathBuf>,
}
