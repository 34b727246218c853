//! Vietnamese word segmentation.
//!
//! Vietnamese writes one syllable per space-separated chunk, so a word like
//! "hạnh phúc" spans two chunks. Segmentation splits punctuation off, then
//! greedily merges the longest syllable run found in the embedded word list
//! (syllables joined by `_`, original casing kept). Words are re-joined with
//! single spaces. The output only feeds the classifier and the stored surface
//! form; it never changes what the sentence says.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Longest word (in syllables) the dictionary may contain.
pub const MAX_WORD_SYLLABLES: usize = 4;

static WORDS: Lazy<HashSet<String>> = Lazy::new(|| {
    include_str!("../../data/vi_words.txt")
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase())
        .collect()
});

// numbers with separators | word chars (incl. `_` from earlier merges) | single symbol
static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:[.,]\d+)*|\w+|[^\w\s]").expect("valid token regex"));

#[derive(Debug, Clone, Copy)]
pub struct Tokenizer {
    enabled: bool,
}

impl Tokenizer {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Canonical surface form. Identity when disabled.
    pub fn tokenize(&self, text: &str) -> String {
        if !self.enabled {
            return text.to_string();
        }
        segment(text).join(" ")
    }
}

/// Force dictionary load (used by pipeline warm-up).
pub(crate) fn warm_up() -> usize {
    WORDS.len()
}

fn is_syllable(tok: &str) -> bool {
    !tok.is_empty() && tok.chars().all(char::is_alphabetic)
}

fn segment(text: &str) -> Vec<String> {
    let raw: Vec<&str> = TOKEN_RE.find_iter(text).map(|m| m.as_str()).collect();
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;

    while i < raw.len() {
        if !is_syllable(raw[i]) {
            out.push(raw[i].to_string());
            i += 1;
            continue;
        }

        // length of the syllable run starting at i, capped
        let run = raw[i..]
            .iter()
            .take(MAX_WORD_SYLLABLES)
            .take_while(|t| is_syllable(t))
            .count();

        let merged = (2..=run).rev().find(|&n| {
            let key = raw[i..i + n]
                .iter()
                .map(|s| s.to_lowercase())
                .collect::<Vec<_>>()
                .join(" ");
            WORDS.contains(&key)
        });

        match merged {
            Some(n) => {
                out.push(raw[i..i + n].join("_"));
                i += n;
            }
            None => {
                out.push(raw[i].to_string());
                i += 1;
            }
        }
    }
    out
}
