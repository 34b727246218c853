//! Lexicon classifier for normalized Vietnamese text.
//!
//! The model is a polarity lexicon (phrase -> weight in `-3..=3`, `0` marks a
//! neutral phrase). Text is lowercased and split into syllables (whitespace
//! and `_`), then matched greedily against lexicon phrases and modifiers,
//! longest phrase first.
//!
//! Scoring:
//! - a negator within the previous 3 units flips a polar hit
//! - an intensifier right before or after a polar hit scales it by 1.5
//!
//! Decision, in order:
//! 1. no alphabetic unit at all -> INVALID
//! 2. no polar and no neutral hit -> INVALID
//! 3. only neutral hits -> NEUTRAL
//! 4. `|score| < neutral_band` or `|score| / Σ|w| < min_confidence` -> NEUTRAL
//! 5. sign of score -> POSITIVE / NEGATIVE
//!
//! Same text + same lexicon always gives the same label.

use std::{collections::HashMap, fs, path::Path, path::PathBuf};

use serde::Serialize;

use crate::config::ClassifierConfig;
use crate::sentiment::SentimentLabel;

const EMBEDDED_LEXICON: &str = include_str!("../../data/sentiment_lexicon_vi.json");

pub const MAX_PHRASE_SYLLABLES: usize = 4;
const MAX_ABS_WEIGHT: i32 = 3;
const NEGATION_WINDOW: usize = 3;
const INTENSIFIER_FACTOR: f32 = 1.5;

const NEGATORS: &[&str] = &[
    "không",
    "chẳng",
    "chả",
    "chưa",
    "không hề",
    "chẳng hề",
    "đâu có",
    "not",
];

const INTENSIFIERS: &[&str] = &[
    "rất", "quá", "lắm", "cực", "cực kỳ", "vô cùng", "siêu", "thật", "thật sự", "very",
];

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("reading lexicon {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing lexicon: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("lexicon is empty")]
    EmptyLexicon,
    #[error("weight {weight} for {phrase:?} outside -3..=3")]
    WeightOutOfRange { phrase: String, weight: i32 },
}

/// Diagnostic view of one classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub label: SentimentLabel,
    pub score: f32,
    pub confidence: f32,
    pub polar_hits: usize,
    pub neutral_hits: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Unit {
    Polar(i32),
    Neutral,
    Negator,
    Intensifier,
    Other,
}

#[derive(Debug, Clone)]
pub struct Classifier {
    lexicon: HashMap<String, i32>,
    neutral_band: f32,
    min_confidence: f32,
}

impl Classifier {
    /// Build from config: the embedded lexicon unless `lexicon_path` is set.
    pub fn load(cfg: &ClassifierConfig) -> Result<Self, ClassifierError> {
        let raw = match &cfg.lexicon_path {
            Some(p) => read_lexicon(p)?,
            None => EMBEDDED_LEXICON.to_string(),
        };
        let parsed: HashMap<String, i32> = serde_json::from_str(&raw)?;
        Self::from_lexicon(parsed, cfg.neutral_band, cfg.min_confidence)
    }

    pub fn from_lexicon(
        lexicon: HashMap<String, i32>,
        neutral_band: f32,
        min_confidence: f32,
    ) -> Result<Self, ClassifierError> {
        if lexicon.is_empty() {
            return Err(ClassifierError::EmptyLexicon);
        }
        let mut norm = HashMap::with_capacity(lexicon.len());
        for (phrase, weight) in lexicon {
            if weight.abs() > MAX_ABS_WEIGHT {
                return Err(ClassifierError::WeightOutOfRange { phrase, weight });
            }
            let key = syllables(&phrase).join(" ");
            if !key.is_empty() {
                norm.insert(key, weight);
            }
        }
        Ok(Self {
            lexicon: norm,
            neutral_band,
            min_confidence,
        })
    }

    pub fn lexicon_len(&self) -> usize {
        self.lexicon.len()
    }

    pub fn classify(&self, normalized: &str) -> SentimentLabel {
        self.score_text(normalized).label
    }

    pub fn score_text(&self, normalized: &str) -> Classification {
        let syl = syllables(normalized);
        let units = self.match_units(&syl);

        let mut score = 0.0f32;
        let mut magnitude = 0.0f32;
        let mut polar_hits = 0usize;
        let mut neutral_hits = 0usize;

        for (j, unit) in units.iter().enumerate() {
            match *unit {
                Unit::Polar(w) => {
                    polar_hits += 1;
                    let negated = (1..=NEGATION_WINDOW)
                        .any(|k| j >= k && units[j - k] == Unit::Negator);
                    let intensified = (j >= 1 && units[j - 1] == Unit::Intensifier)
                        || units.get(j + 1) == Some(&Unit::Intensifier);

                    let mut v = w as f32;
                    if intensified {
                        v *= INTENSIFIER_FACTOR;
                    }
                    if negated {
                        v = -v;
                    }
                    score += v;
                    magnitude += v.abs();
                }
                Unit::Neutral => neutral_hits += 1,
                _ => {}
            }
        }

        let confidence = if magnitude > 0.0 {
            score.abs() / magnitude
        } else {
            0.0
        };

        let label = if units.is_empty() || (polar_hits == 0 && neutral_hits == 0) {
            SentimentLabel::Invalid
        } else if polar_hits == 0
            || score.abs() < self.neutral_band
            || confidence < self.min_confidence
        {
            SentimentLabel::Neutral
        } else if score > 0.0 {
            SentimentLabel::Positive
        } else {
            SentimentLabel::Negative
        };

        Classification {
            label,
            score,
            confidence,
            polar_hits,
            neutral_hits,
        }
    }

    fn match_units(&self, syl: &[String]) -> Vec<Unit> {
        let mut out = Vec::with_capacity(syl.len());
        let mut i = 0;
        while i < syl.len() {
            let max_n = MAX_PHRASE_SYLLABLES.min(syl.len() - i);
            let hit = (1..=max_n).rev().find_map(|n| {
                let key = syl[i..i + n].join(" ");
                self.unit_for(&key).map(|u| (u, n))
            });
            match hit {
                Some((u, n)) => {
                    out.push(u);
                    i += n;
                }
                None => {
                    out.push(Unit::Other);
                    i += 1;
                }
            }
        }
        out
    }

    fn unit_for(&self, key: &str) -> Option<Unit> {
        if let Some(&w) = self.lexicon.get(key) {
            return Some(if w == 0 { Unit::Neutral } else { Unit::Polar(w) });
        }
        if NEGATORS.contains(&key) {
            return Some(Unit::Negator);
        }
        if INTENSIFIERS.contains(&key) {
            return Some(Unit::Intensifier);
        }
        None
    }
}

fn read_lexicon(path: &Path) -> Result<String, ClassifierError> {
    fs::read_to_string(path).map_err(|source| ClassifierError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Lowercased syllables with edge punctuation stripped; tokens without any
/// alphabetic char are dropped.
fn syllables(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || c == '_')
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| t.chars().any(char::is_alphabetic))
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clf() -> Classifier {
        Classifier::load(&ClassifierConfig::default()).expect("embedded lexicon")
    }

    #[test]
    fn embedded_lexicon_loads() {
        assert!(clf().lexicon_len() > 100);
    }

    #[test]
    fn positive_with_intensifier() {
        let c = clf().score_text("Hôm_nay tôi rất vui");
        assert_eq!(c.label, SentimentLabel::Positive);
        assert!((c.score - 3.0).abs() < 1e-6);
        assert_eq!(c.polar_hits, 1);
    }

    #[test]
    fn works_on_untokenized_text_too() {
        let c = clf();
        assert_eq!(c.classify("Hôm nay tôi rất vui"), SentimentLabel::Positive);
        assert_eq!(c.classify("tôi thấy hạnh_phúc"), c.classify("tôi thấy hạnh phúc"));
    }

    #[test]
    fn negation_flips_polarity() {
        let c = clf();
        assert_eq!(c.classify("món này không ngon"), SentimentLabel::Negative);
        assert_eq!(c.classify("phim chẳng hề chán"), SentimentLabel::Positive);
    }

    #[test]
    fn negative_sentence() {
        assert_eq!(
            clf().classify("Dịch_vụ quá tệ , tôi rất thất_vọng"),
            SentimentLabel::Negative
        );
    }

    #[test]
    fn neutral_phrase_and_balanced_mix() {
        let c = clf();
        assert_eq!(c.classify("mọi thứ bình thường thôi"), SentimentLabel::Neutral);
        // +2 and -2 cancel out
        assert_eq!(c.classify("đồ ăn ngon nhưng phục vụ chậm chạp"), SentimentLabel::Neutral);
    }

    #[test]
    fn no_sentiment_tokens_is_invalid() {
        let c = clf();
        assert_eq!(c.classify("asdfgh qwerty"), SentimentLabel::Invalid);
        assert_eq!(c.classify("12345 !!!"), SentimentLabel::Invalid);
        assert_eq!(c.classify(""), SentimentLabel::Invalid);
    }

    #[test]
    fn repeated_calls_agree() {
        let c = clf();
        for s in ["Hôm_nay tôi rất vui", "không tốt lắm", "abc xyz", "tạm được"] {
            assert_eq!(c.score_text(s), c.score_text(s));
        }
    }

    #[test]
    fn rejects_bad_lexicons() {
        assert!(matches!(
            Classifier::from_lexicon(HashMap::new(), 0.5, 0.3),
            Err(ClassifierError::EmptyLexicon)
        ));
        let mut m = HashMap::new();
        m.insert("quá đỉnh".to_string(), 9);
        assert!(matches!(
            Classifier::from_lexicon(m, 0.5, 0.3),
            Err(ClassifierError::WeightOutOfRange { weight: 9, .. })
        ));
    }

    #[test]
    fn missing_lexicon_file_is_io_error() {
        let cfg = ClassifierConfig {
            lexicon_path: Some(PathBuf::from("/nope/lexicon.json")),
            ..ClassifierConfig::default()
        };
        assert!(matches!(Classifier::load(&cfg), Err(ClassifierError::Io { .. })));
    }
}
