use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use super::normalize::{normalize, stable_unique};
use crate::model::SynonymEntry;

type KindKey = (String, String);

/// Bidirectional, one-hop synonym index over category and service values.
#[derive(Debug, Default, Clone)]
pub struct Thesaurus {
    forward: HashMap<KindKey, BTreeSet<String>>,
    reverse: HashMap<KindKey, BTreeSet<String>>,
    skipped_entries: usize,
}

impl Thesaurus {
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a SynonymEntry>,
    {
        let mut thesaurus = Self::default();

        for entry in entries {
            let kind = normalize(&entry.kind);
            let term = normalize(&entry.term);
            let synonym = normalize(&entry.synonym);
            if kind.is_empty() || term.is_empty() || synonym.is_empty() {
                debug!(
                    kind = %entry.kind,
                    term = %entry.term,
                    synonym = %entry.synonym,
                    "skipping malformed seed row"
                );
                thesaurus.skipped_entries += 1;
                continue;
            }

            thesaurus
                .forward
                .entry((kind.clone(), term.clone()))
                .or_default()
                .insert(synonym.clone());
            thesaurus
                .reverse
                .entry((kind, synonym))
                .or_default()
                .insert(term);
        }

        thesaurus
    }

    /// The normalized value first, then its synonyms, then the terms it is a synonym of.
    pub fn expand(&self, kind: &str, value: &str) -> Vec<String> {
        let value = normalize(value);
        if value.is_empty() {
            return Vec::new();
        }

        let key = (normalize(kind), value.clone());
        let forward = self.forward.get(&key).into_iter().flatten().cloned();
        let reverse = self.reverse.get(&key).into_iter().flatten().cloned();

        stable_unique(std::iter::once(value).chain(forward).chain(reverse))
    }

    pub fn term_count(&self) -> usize {
        self.forward.len()
    }

    pub fn skipped_entries(&self) -> usize {
        self.skipped_entries
    }
}
