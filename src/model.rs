use serde::Serialize;

/// One row of the `vendors` table as seen by the keyword engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VendorRecord {
    pub id: i64,
    pub business_name: Option<String>,
    pub category: Option<String>,
    pub service: Option<String>,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub keywords: Option<String>,
    pub ckw_manual_extra: Option<String>,
    pub computed_keywords: Option<String>,
    pub ckw_locked: bool,
    pub ckw_version: Option<String>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SynonymKind {
    Category,
    Service,
}

impl SynonymKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Service => "service",
        }
    }
}

/// A raw `ckw_seeds` row; normalization happens when the thesaurus is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynonymEntry {
    pub kind: String,
    pub term: String,
    pub synonym: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecomputeCounts {
    pub scanned: usize,
    pub updated: usize,
    pub skipped_unchanged: usize,
    pub would_update: usize,
    pub dry_run: bool,
}

#[derive(Debug, Serialize)]
pub struct RecomputeRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub started_at: String,
    pub finished_at: String,
    pub db_path: String,
    pub ckw_version: String,
    pub filters: Vec<String>,
    pub limit: usize,
    pub batch_size: usize,
    pub thesaurus_terms: usize,
    pub skipped_seed_rows: usize,
    pub counts: RecomputeCounts,
    pub duration_ms: u128,
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RowCounts {
    pub categories: i64,
    pub ckw_seeds: i64,
    pub services: i64,
    pub vendors: i64,
}
