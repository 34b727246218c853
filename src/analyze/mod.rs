// src/analyze/mod.rs
//! Analysis pipeline: Validator -> AbbreviationExpander -> Tokenizer -> Classifier.
//!
//! Per call the pipeline moves through
//! `Received -> Validated -> Normalized -> Classified -> Done`,
//! or ends in `Rejected` (bad input) or `Failed` (internal fault).
//!
//! One instance per process, built lazily on first use and shared read-only
//! afterwards. Construction loads the abbreviation table and the classifier
//! lexicon, then runs a throwaway classification as warm-up.

pub mod abbreviation;
pub mod classifier;
pub mod tokenizer;
pub mod validator;

use once_cell::sync::OnceCell;
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, info, warn};

use crate::config::{AppConfig, PipelineConfig};
use crate::logging::anon_hash;
use crate::sentiment::{AnalysisResult, SentimentLabel};

pub use abbreviation::{expand, AbbreviationTable};
pub use classifier::{Classification, Classifier, ClassifierError};
pub use tokenizer::Tokenizer;
pub use validator::{validate, InputRejection, MIN_INPUT_CHARS};

/// Generic message shown to end users when processing fails internally.
pub const COULD_NOT_PROCESS: &str = "Câu không hợp lệ, thử lại.";

static GLOBAL: OnceCell<SentimentPipeline> = OnceCell::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Received,
    Validated,
    Normalized,
    Classified,
    Done,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    /// User-correctable; never persisted, never logged as a fault.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputRejection),
    /// Fault inside the pipeline. `stage` is the last state reached.
    #[error("internal failure after {stage:?}: {cause}")]
    InternalFailure { stage: Stage, cause: String },
}

impl PipelineError {
    /// Message safe to show to end users (never the raw cause).
    pub fn user_message(&self) -> &'static str {
        match self {
            PipelineError::InvalidInput(r) => r.user_message(),
            PipelineError::InternalFailure { .. } => COULD_NOT_PROCESS,
        }
    }
}

pub struct SentimentPipeline {
    abbreviations: AbbreviationTable,
    tokenizer: Tokenizer,
    /// Model load errors are kept, not raised: construction must not fail,
    /// every call then reports `InternalFailure`.
    classifier: Result<Classifier, String>,
    #[cfg(test)]
    panic_after_normalize: bool,
}

impl SentimentPipeline {
    /// Process-wide instance, built on first use from [`AppConfig::load_default`].
    /// A config that fails to load falls back to defaults.
    pub fn global() -> &'static SentimentPipeline {
        GLOBAL.get_or_init(|| {
            let cfg = match AppConfig::load_default() {
                Ok(c) => c.pipeline,
                Err(e) => {
                    warn!(error = %e, "app config unavailable, using pipeline defaults");
                    PipelineConfig::default()
                }
            };
            Self::new(cfg)
        })
    }

    /// Install the process-wide instance with an explicit config. Only the
    /// first call builds; later calls return the existing instance unchanged.
    pub fn install(cfg: PipelineConfig) -> &'static SentimentPipeline {
        let mut built_here = false;
        let p = GLOBAL.get_or_init(|| {
            built_here = true;
            Self::new(cfg)
        });
        if !built_here {
            warn!("sentiment pipeline already initialized; ignoring new config");
        }
        p
    }

    pub(crate) fn new(cfg: PipelineConfig) -> Self {
        let abbreviations = AbbreviationTable::load_or_empty(&cfg.abbreviation_source_path);
        let tokenizer = Tokenizer::new(cfg.enable_tokenization);
        let classifier = Classifier::load(&cfg.classifier).map_err(|e| {
            error!(error = %e, "classifier model failed to load");
            e.to_string()
        });

        let pipeline = Self {
            abbreviations,
            tokenizer,
            classifier,
            #[cfg(test)]
            panic_after_normalize: false,
        };
        pipeline.warm_up();

        info!(
            abbreviations = pipeline.abbreviations.len(),
            tokenization = pipeline.tokenizer.is_enabled(),
            model_ready = pipeline.classifier.is_ok(),
            "sentiment pipeline ready"
        );
        pipeline
    }

    fn warm_up(&self) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            tokenizer::warm_up();
            if let Ok(c) = &self.classifier {
                let _ = c.classify(&self.tokenizer.tokenize("xin chào"));
            }
        }));
        if outcome.is_err() {
            warn!("pipeline warm-up panicked; continuing");
        }
    }

    pub fn abbreviations(&self) -> &AbbreviationTable {
        &self.abbreviations
    }

    pub fn tokenization_enabled(&self) -> bool {
        self.tokenizer.is_enabled()
    }

    pub fn model_ready(&self) -> bool {
        self.classifier.is_ok()
    }

    /// Run the full pipeline on raw user text.
    pub fn analyze(&self, raw: &str) -> Result<AnalysisResult, PipelineError> {
        let id = anon_hash(raw);
        let mut stage = Stage::Received;

        let run = panic::catch_unwind(AssertUnwindSafe(|| self.run_stages(raw, &mut stage)));

        match run {
            Ok(Ok(res)) => {
                info!(%id, sentiment = %res.sentiment, "analysis done");
                Ok(res)
            }
            Ok(Err(PipelineError::InvalidInput(r))) => {
                debug!(%id, reason = %r, "input rejected");
                Err(PipelineError::InvalidInput(r))
            }
            Ok(Err(e)) => {
                error!(%id, error = %e, "pipeline failed");
                Err(e)
            }
            Err(payload) => {
                let cause = panic_message(payload.as_ref());
                error!(%id, ?stage, %cause, "pipeline panicked");
                Err(PipelineError::InternalFailure { stage, cause })
            }
        }
    }

    fn run_stages(&self, raw: &str, stage: &mut Stage) -> Result<AnalysisResult, PipelineError> {
        let valid = validate(raw)?;
        *stage = Stage::Validated;

        let expanded = expand(&valid, &self.abbreviations);
        let text = self.tokenizer.tokenize(&expanded);
        *stage = Stage::Normalized;
        self.fault_point();

        let classifier = self
            .classifier
            .as_ref()
            .map_err(|cause| PipelineError::InternalFailure {
                stage: *stage,
                cause: format!("classifier unavailable: {cause}"),
            })?;
        let sentiment = classifier.classify(&text);
        *stage = Stage::Classified;

        if text.is_empty() && sentiment != SentimentLabel::Invalid {
            return Err(PipelineError::InternalFailure {
                stage: *stage,
                cause: "empty surface form with a non-INVALID label".into(),
            });
        }
        *stage = Stage::Done;
        Ok(AnalysisResult { text, sentiment })
    }

    #[cfg(test)]
    fn fault_point(&self) {
        if self.panic_after_normalize {
            panic!("injected fault after normalization");
        }
    }

    #[cfg(not(test))]
    #[inline]
    fn fault_point(&self) {}

    /// Diagnostics for an already-normalized text; `None` when the model is unavailable.
    pub fn explain(&self, normalized: &str) -> Option<Classification> {
        self.classifier.as_ref().ok().map(|c| c.score_text(normalized))
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
