//! Computed-keyword derivation: normalization, per-field extraction, synonym
//! expansion and composition of the final keyword string.

mod compose;
mod extract;
mod normalize;
mod thesaurus;

pub use compose::{KeywordSources, compute_keywords, needs_update};
pub use thesaurus::Thesaurus;

/// Bump whenever the composed output changes so stored rows get backfilled.
pub const CURRENT_CKW_VERSION: &str = "ckw-1";

pub const MIN_TOKEN_LEN: usize = 3;
pub const PHONE_MIN_LEN: usize = 7;
pub const LAST4_LEN: usize = 4;
pub const BIGRAM_MIN_WORDS: usize = 2;

pub const STOPWORDS: &[&str] = &[
    "a", "an", "and", "the", "for", "of", "to", "in", "on", "at", "by", "llc", "inc", "co",
    "company",
];
