// src/config/app.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_CONFIG_PATH: &str = "config/app.toml";
pub const DEFAULT_ABBREVIATION_PATH: &str = "abbreviation.csv";
pub const DEFAULT_DATABASE_PATH: &str = "data/history.db";
pub const DEFAULT_PER_PAGE: u32 = 5;

pub const ENV_CONFIG_PATH: &str = "SENTIMENT_CONFIG_PATH";
pub const ENV_ENABLE_TOKENIZATION: &str = "SENTIMENT_ENABLE_TOKENIZATION";
pub const ENV_ABBREVIATION_PATH: &str = "SENTIMENT_ABBREVIATION_PATH";
pub const ENV_DB_PATH: &str = "SENTIMENT_DB_PATH";
pub const ENV_PERSIST_INVALID: &str = "SENTIMENT_PERSIST_INVALID";

fn default_true() -> bool {
    true
}
fn default_abbreviation_path() -> PathBuf {
    PathBuf::from(DEFAULT_ABBREVIATION_PATH)
}
fn default_database_path() -> PathBuf {
    PathBuf::from(DEFAULT_DATABASE_PATH)
}
fn default_neutral_band() -> f32 {
    0.5
}
fn default_min_confidence() -> f32 {
    0.3
}
fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

/// Options recognized by the pipeline constructor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_true")]
    pub enable_tokenization: bool,
    /// Two-column CSV (`abbreviation,expansion`). A missing or unreadable file
    /// yields an empty table, never a failed construction.
    #[serde(default = "default_abbreviation_path")]
    pub abbreviation_source_path: PathBuf,
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            enable_tokenization: true,
            abbreviation_source_path: default_abbreviation_path(),
            classifier: ClassifierConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Replacement lexicon (JSON object phrase -> weight). `None` uses the embedded one.
    #[serde(default)]
    pub lexicon_path: Option<PathBuf>,
    /// |score| below this is NEUTRAL.
    #[serde(default = "default_neutral_band")]
    pub neutral_band: f32,
    /// |score| / sum(|weights|) below this is NEUTRAL.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            lexicon_path: None,
            neutral_band: default_neutral_band(),
            min_confidence: default_min_confidence(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Persist results whose classification came back INVALID.
    /// Validation rejections are never persisted regardless of this flag.
    #[serde(default)]
    pub persist_invalid: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            per_page: DEFAULT_PER_PAGE,
            persist_invalid: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// On-disk layout: `[classifier]` is a top-level table in the file but lives
/// inside [`PipelineConfig`] at runtime.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    pipeline: Option<RawPipeline>,
    #[serde(default)]
    classifier: Option<ClassifierConfig>,
    #[serde(default)]
    store: Option<StoreConfig>,
    #[serde(default)]
    history: Option<HistoryConfig>,
    #[serde(default)]
    metrics: Option<MetricsConfig>,
}

#[derive(Debug, Deserialize)]
struct RawPipeline {
    #[serde(default = "default_true")]
    enable_tokenization: bool,
    #[serde(default = "default_abbreviation_path")]
    abbreviation_source_path: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub pipeline: PipelineConfig,
    pub store: StoreConfig,
    pub history: HistoryConfig,
    pub metrics: MetricsConfig,
}

impl AppConfig {
    /// Parse TOML text, then sanitize ranges. No env overrides applied.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(s).context("parsing app config TOML")?;
        let mut pipeline = match raw.pipeline {
            Some(p) => PipelineConfig {
                enable_tokenization: p.enable_tokenization,
                abbreviation_source_path: p.abbreviation_source_path,
                classifier: ClassifierConfig::default(),
            },
            None => PipelineConfig::default(),
        };
        if let Some(c) = raw.classifier {
            pipeline.classifier = c;
        }
        let mut cfg = AppConfig {
            pipeline,
            store: raw.store.unwrap_or_default(),
            history: raw.history.unwrap_or_default(),
            metrics: raw.metrics.unwrap_or_default(),
        };
        cfg.sanitize();
        Ok(cfg)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading app config from {}", path.display()))?;
        Self::from_toml_str(&data)
    }

    /// Resolve config using env var + fallbacks:
    /// 1) $SENTIMENT_CONFIG_PATH (must exist)
    /// 2) config/app.toml
    /// 3) built-in defaults
    ///
    /// Env overrides are applied last.
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                anyhow::bail!("{ENV_CONFIG_PATH} points to non-existent path {}", pb.display());
            }
            Self::load_from_file(&pb)?
        } else {
            let fallback = PathBuf::from(DEFAULT_CONFIG_PATH);
            if fallback.exists() {
                Self::load_from_file(&fallback)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Some(b) = parse_bool_env(env::var(ENV_ENABLE_TOKENIZATION).ok()) {
            self.pipeline.enable_tokenization = b;
        }
        if let Some(p) = non_empty_env(ENV_ABBREVIATION_PATH) {
            self.pipeline.abbreviation_source_path = PathBuf::from(p);
        }
        if let Some(p) = non_empty_env(ENV_DB_PATH) {
            self.store.database_path = PathBuf::from(p);
        }
        if let Some(b) = parse_bool_env(env::var(ENV_PERSIST_INVALID).ok()) {
            self.history.persist_invalid = b;
        }
    }

    fn sanitize(&mut self) {
        let c = &mut self.pipeline.classifier;
        if !c.neutral_band.is_finite() || c.neutral_band < 0.0 {
            c.neutral_band = default_neutral_band();
        }
        if !(0.0..=1.0).contains(&c.min_confidence) {
            c.min_confidence = default_min_confidence();
        }
        if self.history.per_page == 0 {
            self.history.per_page = DEFAULT_PER_PAGE;
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Accepts 1/0, true/false, yes/no, on/off (case-insensitive). Anything else is ignored.
pub(crate) fn parse_bool_env(raw: Option<String>) -> Option<bool> {
    let v = raw?;
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let cfg = AppConfig::from_toml_str("").unwrap();
        assert!(cfg.pipeline.enable_tokenization);
        assert_eq!(
            cfg.pipeline.abbreviation_source_path,
            PathBuf::from(DEFAULT_ABBREVIATION_PATH)
        );
        assert_eq!(cfg.history.per_page, 5);
        assert!(!cfg.history.persist_invalid);
        assert!(cfg.metrics.enabled);
    }

    #[test]
    fn classifier_section_is_folded_into_pipeline() {
        let cfg = AppConfig::from_toml_str(
            r#"
[pipeline]
enable_tokenization = false

[classifier]
neutral_band = 1.0
min_confidence = 7.0
"#,
        )
        .unwrap();
        assert!(!cfg.pipeline.enable_tokenization);
        assert_eq!(cfg.pipeline.classifier.neutral_band, 1.0);
        // out of range -> default
        assert_eq!(cfg.pipeline.classifier.min_confidence, 0.3);
    }

    #[test]
    fn zero_per_page_is_reset() {
        let cfg = AppConfig::from_toml_str("[history]\nper_page = 0\n").unwrap();
        assert_eq!(cfg.history.per_page, DEFAULT_PER_PAGE);
    }

    #[test]
    fn bool_env_parsing() {
        assert_eq!(parse_bool_env(Some("1".into())), Some(true));
        assert_eq!(parse_bool_env(Some(" Off ".into())), Some(false));
        assert_eq!(parse_bool_env(Some("maybe".into())), None);
        assert_eq!(parse_bool_env(None), None);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(AppConfig::from_toml_str("[pipeline\n").is_err());
    }
}
