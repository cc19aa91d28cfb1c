use super::normalize::{
    collapse_hyphen_space, is_content_eligible, normalize, split_tokens, stable_unique,
};
use super::thesaurus::Thesaurus;
use super::{BIGRAM_MIN_WORDS, LAST4_LEN, PHONE_MIN_LEN};
use crate::model::SynonymKind;

pub fn business_name_tokens(name: &str) -> Vec<String> {
    let words = content_tokens(name);

    let mut tokens = words
        .iter()
        .flat_map(|word| collapse_hyphen_space(word))
        .collect::<Vec<String>>();
    if words.len() >= BIGRAM_MIN_WORDS {
        tokens.push(format!("{} {}", words[0], words[1]));
    }

    tokens
}

pub fn website_tokens(url: &str) -> Vec<String> {
    let normalized = normalize(url);
    let without_scheme = normalized
        .strip_prefix("https://")
        .or_else(|| normalized.strip_prefix("http://"))
        .unwrap_or(&normalized);
    let without_www = without_scheme
        .strip_prefix("www.")
        .unwrap_or(without_scheme);

    let host = without_www.split('/').next().unwrap_or_default();
    if host.is_empty() {
        return Vec::new();
    }

    let leftmost_label = host.split('.').next().unwrap_or_default();
    stable_unique(
        [leftmost_label.to_string(), host.replace('.', ""), host.to_string()]
            .into_iter()
            .filter(|token| !token.is_empty()),
    )
}

pub fn email_tokens(email: &str) -> Vec<String> {
    if !email.contains('@') {
        return Vec::new();
    }

    let normalized = normalize(email);
    let Some((local, domain)) = normalized.split_once('@') else {
        return Vec::new();
    };

    let mut tokens = vec![local.to_string()];
    tokens.extend(collapse_hyphen_space(local));
    let domain_core = domain.split('.').next().unwrap_or_default();
    tokens.push(domain_core.to_string());
    tokens.push(domain.replace('.', ""));
    tokens.push(domain.to_string());

    stable_unique(tokens.into_iter().filter(|token| is_content_eligible(token)))
}

pub fn phone_tokens(phone: &str) -> Vec<String> {
    let digits = phone
        .chars()
        .filter(char::is_ascii_digit)
        .collect::<String>();

    let mut tokens = Vec::new();
    if digits.len() >= PHONE_MIN_LEN {
        tokens.push(digits.clone());
    }
    if digits.len() >= LAST4_LEN {
        tokens.push(digits[digits.len() - LAST4_LEN..].to_string());
    }

    tokens
}

pub fn category_tokens(category: &str, thesaurus: &Thesaurus) -> Vec<String> {
    thesaurus.expand(SynonymKind::Category.as_str(), category)
}

pub fn service_tokens(service: &str, thesaurus: &Thesaurus) -> Vec<String> {
    thesaurus.expand(SynonymKind::Service.as_str(), service)
}

pub fn freeform_tokens(keywords: &str) -> Vec<String> {
    content_tokens(keywords)
}

pub fn contact_tokens(contact_name: &str) -> Vec<String> {
    content_tokens(contact_name)
}

fn content_tokens(value: &str) -> Vec<String> {
    split_tokens(&normalize(value))
        .into_iter()
        .filter(|token| is_content_eligible(token))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SynonymEntry;

    #[test]
    fn business_name_tokens_drop_stopwords_and_add_bigram() {
        assert_eq!(
            business_name_tokens("Rio Grande HVAC & Air LLC"),
            vec!["rio", "grande", "hvac", "air", "rio grande"]
        );
    }

    #[test]
    fn business_name_tokens_skip_bigram_for_single_word() {
        assert_eq!(business_name_tokens("The Plumbers, Inc."), vec!["plumbers"]);
        assert!(business_name_tokens("A & B Co").is_empty());
    }

    #[test]
    fn business_name_tokens_split_hyphenated_words() {
        assert_eq!(
            business_name_tokens("Al-Amin Señor Roofing"),
            vec!["amin", "senor", "roofing", "amin senor"]
        );
    }

    #[test]
    fn website_tokens_strip_scheme_www_and_path() {
        assert_eq!(
            website_tokens("https://www.RioGrandeHVAC.com/contact?x=1"),
            vec!["riograndehvac", "riograndehvaccom", "riograndehvac.com"]
        );
        assert_eq!(
            website_tokens("http://shop.example.org"),
            vec!["shop", "shopexampleorg", "shop.example.org"]
        );
    }

    #[test]
    fn website_tokens_dedupe_single_label_hosts() {
        assert_eq!(website_tokens("localhost"), vec!["localhost"]);
    }

    #[test]
    fn website_tokens_empty_host_yields_nothing() {
        assert!(website_tokens("").is_empty());
        assert!(website_tokens("https://").is_empty());
        assert!(website_tokens("https://www./about").is_empty());
    }

    #[test]
    fn email_tokens_cover_local_part_and_domain() {
        assert_eq!(
            email_tokens("Jose-Luis@Rio-Grande.com"),
            vec![
                "jose-luis",
                "joseluis",
                "rio-grande",
                "rio-grandecom",
                "rio-grande.com",
            ]
        );
    }

    #[test]
    fn email_tokens_filter_short_and_stopword_parts() {
        assert_eq!(email_tokens("co@ab.io"), vec!["abio", "ab.io"]);
        assert!(email_tokens("no-at-sign.example.com").is_empty());
    }

    #[test]
    fn phone_tokens_emit_full_number_and_last_four() {
        assert_eq!(phone_tokens("(512) 555-1212"), vec!["5125551212", "1212"]);
        assert_eq!(phone_tokens("ext 1234"), vec!["1234"]);
        assert!(phone_tokens("42").is_empty());
        assert!(phone_tokens("").is_empty());
    }

    #[test]
    fn category_and_service_tokens_use_thesaurus() {
        let seeds = vec![
            SynonymEntry {
                kind: "category".to_string(),
                term: "hvac".to_string(),
                synonym: "heating".to_string(),
            },
            SynonymEntry {
                kind: "service".to_string(),
                term: "ac".to_string(),
                synonym: "air conditioning".to_string(),
            },
        ];
        let thesaurus = Thesaurus::from_entries(&seeds);

        assert_eq!(category_tokens("HVAC", &thesaurus), vec!["hvac", "heating"]);
        assert_eq!(service_tokens("AC", &thesaurus), vec!["ac", "air conditioning"]);
    }

    #[test]
    fn freeform_and_contact_tokens_apply_content_filter() {
        assert_eq!(
            freeform_tokens("24/7 emergency, AC & furnace"),
            vec!["emergency", "furnace"]
        );
        assert_eq!(contact_tokens("Dr. Ana María de la Cruz"), vec!["ana", "maria", "cruz"]);
    }
}
