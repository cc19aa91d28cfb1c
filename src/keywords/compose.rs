use super::extract::{
    business_name_tokens, category_tokens, contact_tokens, email_tokens, freeform_tokens,
    phone_tokens, service_tokens, website_tokens,
};
use super::normalize::{
    collapse_hyphen_space, is_numeric, is_stopword, normalize, split_tokens, stable_unique,
    token_len,
};
use super::thesaurus::Thesaurus;
use super::{CURRENT_CKW_VERSION, LAST4_LEN, MIN_TOKEN_LEN, PHONE_MIN_LEN};
use crate::model::VendorRecord;

/// Per-source extractor output for one record, in composition order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordSources {
    pub category: Vec<String>,
    pub service: Vec<String>,
    pub business_name: Vec<String>,
    pub website: Vec<String>,
    pub email: Vec<String>,
    pub phone: Vec<String>,
    pub freeform: Vec<String>,
    pub contact: Vec<String>,
    pub manual_extra: Vec<String>,
}

impl KeywordSources {
    pub fn extract(record: &VendorRecord, thesaurus: &Thesaurus) -> Self {
        Self {
            category: category_tokens(field(&record.category), thesaurus),
            service: service_tokens(field(&record.service), thesaurus),
            business_name: business_name_tokens(field(&record.business_name)),
            website: website_tokens(field(&record.website)),
            email: email_tokens(field(&record.email)),
            phone: phone_tokens(field(&record.phone)),
            freeform: freeform_tokens(field(&record.keywords)),
            contact: contact_tokens(field(&record.contact_name)),
            manual_extra: split_tokens(&normalize(field(&record.ckw_manual_extra))),
        }
    }

    pub fn labeled(&self) -> [(&'static str, &[String]); 9] {
        [
            ("category", &self.category),
            ("service", &self.service),
            ("business_name", &self.business_name),
            ("website", &self.website),
            ("email", &self.email),
            ("phone", &self.phone),
            ("keywords", &self.freeform),
            ("contact_name", &self.contact),
            ("ckw_manual_extra", &self.manual_extra),
        ]
    }

    /// Filters the extracted candidates, appends the manual extras unfiltered
    /// and keeps the first occurrence of every token.
    pub fn compose(&self) -> Vec<String> {
        let candidates = [
            &self.category,
            &self.service,
            &self.business_name,
            &self.website,
            &self.email,
            &self.phone,
            &self.freeform,
            &self.contact,
        ];

        let filtered = candidates
            .into_iter()
            .flatten()
            .filter(|token| !is_stopword(token))
            .flat_map(|token| {
                if is_numeric(token) {
                    if is_meaningful_number(token) {
                        vec![token.clone()]
                    } else {
                        Vec::new()
                    }
                } else if token_len(token) >= MIN_TOKEN_LEN {
                    collapse_hyphen_space(token)
                } else {
                    Vec::new()
                }
            });

        stable_unique(filtered.chain(self.manual_extra.iter().cloned()))
    }
}

/// Full phone numbers and four-digit suffixes survive; other numbers are noise.
pub fn is_meaningful_number(token: &str) -> bool {
    let len = token.len();
    len >= PHONE_MIN_LEN || len == LAST4_LEN
}

pub fn compute_tokens(record: &VendorRecord, thesaurus: &Thesaurus) -> Vec<String> {
    KeywordSources::extract(record, thesaurus).compose()
}

pub fn compute_keywords(record: &VendorRecord, thesaurus: &Thesaurus) -> String {
    compute_tokens(record, thesaurus).join(" ")
}

/// A row is rewritten unless both the stored keywords and the stored version match.
pub fn needs_update(record: &VendorRecord, new_keywords: &str) -> bool {
    let stored_keywords = field(&record.computed_keywords).trim();
    let stored_version = field(&record.ckw_version);
    stored_keywords != new_keywords || stored_version != CURRENT_CKW_VERSION
}

fn field(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or_default()
}
