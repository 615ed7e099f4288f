//! String inflection used for URL paths and wire keys.
//!
//! The adapter only depends on the [`Inflector`] trait; [`DefaultInflector`]
//! covers regular English nouns plus a registrable list of irregular and
//! uncountable words.

use std::collections::{BTreeMap, BTreeSet};

/// Pluralize, singularize, dasherize and camelize names.
pub trait Inflector: Send + Sync {
    /// `post` -> `posts`, `blog-category` -> `blog-categories`.
    fn pluralize(&self, word: &str) -> String;

    /// `posts` -> `post`.
    fn singularize(&self, word: &str) -> String;

    /// `blogPost` / `blog_post` -> `blog-post`.
    fn dasherize(&self, word: &str) -> String {
        let mut out = String::with_capacity(word.len() + 4);
        let mut previous_lower = false;
        for c in word.chars() {
            if c == '_' || c == ' ' {
                out.push('-');
                previous_lower = false;
            } else if c.is_ascii_uppercase() {
                if previous_lower {
                    out.push('-');
                }
                out.push(c.to_ascii_lowercase());
                previous_lower = false;
            } else {
                out.push(c);
                previous_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
            }
        }
        out
    }

    /// `published-at` / `published_at` -> `publishedAt`.
    fn camelize(&self, word: &str) -> String {
        let mut out = String::with_capacity(word.len());
        let mut upper_next = false;
        for c in word.chars() {
            if c == '-' || c == '_' || c == ' ' {
                upper_next = !out.is_empty();
            } else if upper_next {
                out.push(c.to_ascii_uppercase());
                upper_next = false;
            } else {
                out.push(c);
            }
        }
        out
    }
}

/// English inflector with the usual suffix rules.
#[derive(Debug, Clone)]
pub struct DefaultInflector {
    irregular: BTreeMap<String, String>,
    uncountable: BTreeSet<String>,
}

const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("man", "men"),
    ("woman", "women"),
    ("child", "children"),
    ("mouse", "mice"),
    ("goose", "geese"),
    ("tooth", "teeth"),
    ("foot", "feet"),
    ("ox", "oxen"),
];

const UNCOUNTABLE: &[&str] = &[
    "equipment",
    "information",
    "rice",
    "money",
    "species",
    "series",
    "fish",
    "sheep",
    "jeans",
    "police",
    "news",
];

/// Words ending in a single `s` that still take `es`.
const SINGULAR_S: &[&str] = &["status", "alias", "bus", "campus", "virus"];

impl Default for DefaultInflector {
    fn default() -> Self {
        Self {
            irregular: IRREGULAR
                .iter()
                .map(|(s, p)| ((*s).to_string(), (*p).to_string()))
                .collect(),
            uncountable: UNCOUNTABLE.iter().map(ToString::to_string).collect(),
        }
    }
}

impl DefaultInflector {
    /// Inflector with the built-in word lists.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an irregular singular/plural pair.
    #[must_use]
    pub fn irregular(mut self, singular: impl Into<String>, plural: impl Into<String>) -> Self {
        self.irregular.insert(singular.into(), plural.into());
        self
    }

    /// Register a word that has no plural form.
    #[must_use]
    pub fn uncountable(mut self, word: impl Into<String>) -> Self {
        self.uncountable.insert(word.into());
        self
    }

    /// Split `blog-post` into (`blog-`, `post`) so rules only see the last word.
    fn split_last(word: &str) -> (&str, &str) {
        word.rfind(['-', '_', '/'])
            .map_or(("", word), |index| word.split_at(index + 1))
    }

    fn pluralize_word(&self, word: &str) -> String {
        let lower = word.to_ascii_lowercase();
        if self.uncountable.contains(&lower) {
            return word.to_string();
        }
        if let Some(plural) = self.irregular.get(&lower) {
            return plural.clone();
        }
        if self.irregular.values().any(|plural| *plural == lower) {
            return word.to_string();
        }
        if SINGULAR_S.contains(&lower.as_str()) || lower.ends_with("ss") {
            return format!("{word}es");
        }
        if lower.ends_with('s') {
            return word.to_string();
        }
        if lower.ends_with("quiz") {
            return format!("{word}zes");
        }
        if lower.ends_with('x') || lower.ends_with("ch") || lower.ends_with("sh") {
            return format!("{word}es");
        }
        if let Some(stem) = lower.strip_suffix('y') {
            if !stem.ends_with(['a', 'e', 'i', 'o', 'u']) {
                return format!("{}ies", prefix(word, stem.len()));
            }
        }
        if let Some(stem) = lower.strip_suffix("fe") {
            return format!("{}ves", prefix(word, stem.len()));
        }
        if let Some(stem) = lower.strip_suffix("lf") {
            return format!("{}lves", prefix(word, stem.len()));
        }
        format!("{word}s")
    }

    fn singularize_word(&self, word: &str) -> String {
        let lower = word.to_ascii_lowercase();
        if self.uncountable.contains(&lower) {
            return word.to_string();
        }
        if let Some((singular, _)) = self.irregular.iter().find(|(_, plural)| **plural == lower) {
            return singular.clone();
        }
        if self.irregular.contains_key(&lower) {
            return word.to_string();
        }
        let keep = lower.len();
        let cut = |suffix: usize| prefix(word, keep.saturating_sub(suffix));
        if SINGULAR_S.iter().any(|s| lower == format!("{s}es")) {
            return cut(2).to_string();
        }
        if SINGULAR_S.contains(&lower.as_str()) || lower.ends_with("ss") {
            return word.to_string();
        }
        if lower.ends_with("quizzes") {
            return cut(3).to_string();
        }
        if lower.ends_with("yses") {
            return format!("{}is", cut(2));
        }
        if lower.ends_with("sses")
            || lower.ends_with("xes")
            || lower.ends_with("ches")
            || lower.ends_with("shes")
        {
            return cut(2).to_string();
        }
        if lower.ends_with("ies") && keep > 4 {
            return format!("{}y", cut(3));
        }
        if lower.ends_with("lves") {
            return format!("{}f", cut(3));
        }
        if lower.ends_with("ves") {
            return format!("{}fe", cut(3));
        }
        if lower.ends_with('s') && !lower.ends_with("us") && !lower.ends_with("is") {
            return cut(1).to_string();
        }
        word.to_string()
    }
}

/// First `len` bytes of an ASCII-cased word.
fn prefix(word: &str, len: usize) -> &str {
    word.get(..len).unwrap_or(word)
}

impl Inflector for DefaultInflector {
    fn pluralize(&self, word: &str) -> String {
        let (head, last) = Self::split_last(word);
        format!("{head}{}", self.pluralize_word(last))
    }

    fn singularize(&self, word: &str) -> String {
        let (head, last) = Self::split_last(word);
        format!("{head}{}", self.singularize_word(last))
    }
}
