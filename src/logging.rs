// src/logging.rs
//! Tracing bootstrap and the privacy rule for logs: raw user text is never
//! logged, only a short SHA-256 fingerprint of it.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const DEFAULT_LOG_FILTER: &str = "vi_sentiment_assistant=info,warn";

/// Install the global subscriber. `RUST_LOG` wins over the default filter.
/// `SENTIMENT_LOG_JSON=1` switches to JSON lines (for log shippers).
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let json = std::env::var("SENTIMENT_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let result = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    // already initialized (tests, embedding hosts) -> keep the existing one
    let _ = result;
}

/// 12 hex chars of SHA-256, enough to correlate log lines for one input.
pub fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anon_hash_is_stable_and_short() {
        let a = anon_hash("Hôm nay tôi rất vui");
        assert_eq!(a.len(), 12);
        assert_eq!(a, anon_hash("Hôm nay tôi rất vui"));
        assert_ne!(a, anon_hash("Hôm nay tôi buồn"));
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn init_twice_does_not_panic() {
        init_tracing();
        init_tracing();
    }
}
