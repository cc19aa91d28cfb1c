use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use super::{MIN_TOKEN_LEN, STOPWORDS};

const FOLD_FROM: &str = "àáâãäåçèéêëìíîïñòóôõöùúûüýÿÀÁÂÃÄÅÇÈÉÊËÌÍÎÏÑÒÓÔÕÖÙÚÛÜÝ";
const FOLD_TO: &str = "aaaaaaceeeeiiiinooooouuuuyyAAAAAACEEEEIIIINOOOOOUUUUY";

static ASCII_FOLD: LazyLock<HashMap<char, char>> =
    LazyLock::new(|| FOLD_FROM.chars().zip(FOLD_TO.chars()).collect());

pub fn ascii_fold(input: &str) -> String {
    input
        .chars()
        .map(|ch| ASCII_FOLD.get(&ch).copied().unwrap_or(ch))
        .collect()
}

/// Folds accents, lowercases, trims and collapses whitespace runs to one space.
pub fn normalize(input: &str) -> String {
    ascii_fold(input)
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}

/// Splits on every run of characters outside `[0-9a-zA-Z]`.
pub fn split_tokens(input: &str) -> Vec<String> {
    input
        .split(|ch: char| !ch.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn stable_unique<I>(tokens: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for token in tokens {
        if seen.insert(token.clone()) {
            out.push(token);
        }
    }
    out
}

/// Returns the token, followed by its hyphen/space-stripped form when it has one.
pub fn collapse_hyphen_space(token: &str) -> Vec<String> {
    if token.contains('-') || token.contains(' ') {
        vec![token.to_string(), token.replace(['-', ' '], "")]
    } else {
        vec![token.to_string()]
    }
}

pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

pub fn token_len(token: &str) -> usize {
    token.chars().count()
}

pub fn is_content_eligible(token: &str) -> bool {
    !is_stopword(token) && token_len(token) >= MIN_TOKEN_LEN
}

pub fn is_numeric(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|ch| ch.is_ascii_digit())
}
