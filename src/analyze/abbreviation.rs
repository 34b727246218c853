//! Abbreviation / teencode expansion (`ko` -> `không`, `dc` -> `được`, ...).
//!
//! The table is loaded once from a two-column CSV and owned by the pipeline;
//! it is passed explicitly to [`expand`]. Matching is case-insensitive and
//! whole-token: only the alphanumeric core of a whitespace-delimited token is
//! looked up, so `"ko,"` becomes `"không,"` while `"kol"` is left alone.
//!
//! Source format:
//! - UTF-8, optional BOM
//! - optional header row (`abbreviation,expansion` or similar) as the first
//!   non-blank, non-comment row
//! - optional double quotes around fields (commas allowed inside, `""` escapes a quote)
//! - blank lines, `#` comments and malformed rows are skipped
//! - duplicate keys: first row wins

use anyhow::{Context, Result};
use std::{collections::HashMap, fs, path::Path};
use tracing::{debug, warn};

const HEADER_KEYS: &[&str] = &["abbreviation", "abbr", "abbrev", "short", "viết tắt", "tu_viet_tat"];

#[derive(Debug, Clone, Default)]
pub struct AbbreviationTable {
    map: HashMap<String, String>,
}

impl AbbreviationTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Case-insensitive lookup.
    pub fn get(&self, token: &str) -> Option<&str> {
        self.map.get(&token.to_lowercase()).map(String::as_str)
    }

    /// Load from a CSV file. IO errors are returned; bad rows are not.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading abbreviation table from {}", path.display()))?;
        Ok(Self::parse_csv(&content))
    }

    /// Like [`load_from_file`](Self::load_from_file) but never fails: falls back to
    /// an empty table and logs a warning.
    pub fn load_or_empty<P: AsRef<Path>>(path: P) -> Self {
        match Self::load_from_file(path.as_ref()) {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, "abbreviation table unavailable, continuing with empty table");
                Self::empty()
            }
        }
    }

    pub fn parse_csv(content: &str) -> Self {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let mut map = HashMap::new();
        let mut skipped = 0usize;

        let mut first_row = true;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let is_first = std::mem::replace(&mut first_row, false);
            let Some((k, v)) = split_row(line) else {
                skipped += 1;
                continue;
            };
            let key = k.to_lowercase();
            if is_first && HEADER_KEYS.contains(&key.as_str()) {
                continue;
            }
            if key.is_empty() || v.is_empty() || key.chars().any(char::is_whitespace) {
                skipped += 1;
                continue;
            }
            map.entry(key).or_insert(v);
        }

        if skipped > 0 {
            debug!(skipped, "abbreviation rows skipped");
        }
        Self { map }
    }

    #[cfg(test)]
    pub(crate) fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let map = pairs
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.to_string()))
            .collect();
        Self { map }
    }

    #[cfg(test)]
    pub(crate) fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Split `abbr,expansion` (extra columns ignored). Fields may be double-quoted;
/// a quoted field may contain commas and `""` for a literal quote. Unbalanced
/// quotes make the row malformed.
fn split_row(line: &str) -> Option<(String, String)> {
    let mut fields = split_fields(line)?.into_iter();
    let k = fields.next()?;
    let v = fields.next()?;
    Some((k, v))
}

fn split_fields(line: &str) -> Option<Vec<String>> {
    let mut fields = Vec::new();
    let mut chars = line.chars().peekable();

    loop {
        while chars.next_if(|c| *c == ' ' || *c == '\t').is_some() {}

        let mut field = String::new();
        if chars.next_if_eq(&'"').is_some() {
            loop {
                match chars.next()? {
                    '"' if chars.next_if_eq(&'"').is_some() => field.push('"'),
                    '"' => break,
                    c => field.push(c),
                }
            }
            // only padding may follow the closing quote
            while chars.next_if(|c| *c == ' ' || *c == '\t').is_some() {}
            if chars.peek().is_some_and(|c| *c != ',') {
                return None;
            }
        } else {
            while let Some(c) = chars.next_if(|c| *c != ',') {
                if c == '"' {
                    return None;
                }
                field.push(c);
            }
        }
        fields.push(field.trim().to_string());

        if chars.next().is_none() {
            return Some(fields);
        }
    }
}

/// Replace every whitespace token whose core matches a table key.
/// Tokens are re-joined with single spaces.
pub fn expand(text: &str, table: &AbbreviationTable) -> String {
    if table.is_empty() {
        return text.split_whitespace().collect::<Vec<_>>().join(" ");
    }
    text.split_whitespace()
        .map(|tok| expand_token(tok, table))
        .collect::<Vec<_>>()
        .join(" ")
}

fn expand_token(tok: &str, table: &AbbreviationTable) -> String {
    let core_start = tok.find(|c: char| c.is_alphanumeric());
    let Some(start) = core_start else {
        return tok.to_string();
    };
    // exclusive byte end of the last alphanumeric char
    let end = tok
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_alphanumeric())
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(tok.len());

    let (prefix, rest) = tok.split_at(start);
    let (core, suffix) = rest.split_at(end - start);

    match table.get(core) {
        Some(exp) => format!("{prefix}{exp}{suffix}"),
        None => tok.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> AbbreviationTable {
        AbbreviationTable::from_pairs(&[("ko", "không"), ("dc", "được"), ("mn", "mọi người")])
    }

    #[test]
    fn expands_whole_tokens_case_insensitively() {
        let t = table();
        assert_eq!(expand("Hôm nay KO vui", &t), "Hôm nay không vui");
        assert_eq!(expand("kol dcx", &t), "kol dcx");
        assert_eq!(expand("chào mn", &t), "chào mọi người");
    }

    #[test]
    fn keeps_surrounding_punctuation() {
        let t = table();
        assert_eq!(expand("ko, dc!", &t), "không, được!");
        assert_eq!(expand("(ko)", &t), "(không)");
        assert_eq!(expand("...", &t), "...");
    }

    #[test]
    fn collapses_whitespace() {
        let t = table();
        assert_eq!(expand("  ko \t  dc  ", &t), "không được");
        assert_eq!(expand("  a   b ", &AbbreviationTable::empty()), "a b");
    }

    #[test]
    fn idempotent_without_transitive_keys() {
        let t = table();
        for s in ["ko dc gì đâu mn ơi", "KO, Dc", "tôi rất vui"] {
            let once = expand(s, &t);
            assert_eq!(expand(&once, &t), once);
        }
    }

    #[test]
    fn csv_parsing_skips_bad_rows() {
        let csv = "\u{feff}abbreviation,expansion\n\
                   ko,không\n\
                   \n\
                   # comment\n\
                   broken-row\n\
                   ,empty key\n\
                   empty value,\n\
                   \"DC\",\"được\"\n\
                   ko,khác\n\
                   two words,nope\n";
        let t = AbbreviationTable::parse_csv(csv);
        assert_eq!(t.len(), 2);
        assert_eq!(t.get("ko"), Some("không"));
        assert_eq!(t.get("dc"), Some("được"));
        assert!(t.get("abbreviation").is_none());
    }

    #[test]
    fn quoted_fields_keep_commas_and_quotes() {
        let csv = "abbreviation,expansion\n\
                   vd,\"ví dụ, như\"\n\
                   ng,\"người \"\"thân\"\"\"\n\
                   bad,\"unterminated\n\
                   odd,ab\"c\n";
        let t = AbbreviationTable::parse_csv(csv);
        assert_eq!(t.get("vd"), Some("ví dụ, như"));
        assert_eq!(t.get("ng"), Some("người \"thân\""));
        assert!(t.get("bad").is_none());
        assert!(t.get("odd").is_none());
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn header_after_leading_comment_is_still_a_header() {
        let t = AbbreviationTable::parse_csv("# teencode\n\nabbreviation,expansion\nko,không\n");
        assert_eq!(t.len(), 1);
        assert!(t.get("abbreviation").is_none());
        assert_eq!(expand("abbreviation ko", &t), "abbreviation không");
    }

    #[test]
    fn header_is_optional() {
        let t = AbbreviationTable::parse_csv("ko,không\nj,gì\n");
        assert_eq!(t.len(), 2);
        assert_eq!(t.get("J"), Some("gì"));
    }

    #[test]
    fn missing_file_falls_back_to_empty() {
        let t = AbbreviationTable::load_or_empty("/definitely/not/here.csv");
        assert!(t.is_empty());
    }

    #[test]
    fn shipped_table_has_no_transitive_expansions() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/abbreviation.csv");
        let t = AbbreviationTable::load_from_file(path).unwrap();
        assert!(!t.is_empty());
        for (k, v) in t.entries() {
            for word in v.split_whitespace() {
                assert!(
                    t.get(word).is_none(),
                    "expansion {v:?} of {k:?} contains key {word:?}"
                );
            }
        }
    }
}
