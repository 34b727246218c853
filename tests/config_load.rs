// tests/config_load.rs
use std::path::PathBuf;
use std::{env, fs};

use vi_sentiment_assistant::config::app::{
    ENV_CONFIG_PATH, ENV_DB_PATH, ENV_ENABLE_TOKENIZATION, ENV_PERSIST_INVALID,
};
use vi_sentiment_assistant::config::AppConfig;

fn clear_env() {
    for k in [
        ENV_CONFIG_PATH,
        ENV_ENABLE_TOKENIZATION,
        ENV_DB_PATH,
        ENV_PERSIST_INVALID,
        "SENTIMENT_ABBREVIATION_PATH",
    ] {
        env::remove_var(k);
    }
}

#[test]
fn shipped_config_parses() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/app.toml");
    let cfg = AppConfig::load_from_file(path).unwrap();
    assert!(cfg.pipeline.enable_tokenization);
    assert_eq!(cfg.history.per_page, 5);
    assert!(!cfg.history.persist_invalid);
    assert!(cfg.metrics.enabled);
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // isolate CWD so the repo's config/ is not picked up
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    clear_env();

    // 1) nothing at all -> built-in defaults
    let d = AppConfig::load_default().unwrap();
    assert!(d.pipeline.enable_tokenization);
    assert_eq!(d.history.per_page, 5);
    assert_eq!(d.store.database_path, PathBuf::from("data/history.db"));

    // 2) ./config/app.toml fallback
    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(
        cfg_dir.join("app.toml"),
        "[pipeline]\nenable_tokenization = false\n\n[history]\nper_page = 10\n",
    )
    .unwrap();
    let f = AppConfig::load_default().unwrap();
    assert!(!f.pipeline.enable_tokenization);
    assert_eq!(f.history.per_page, 10);

    // 3) env path wins over the fallback
    let p_env = tmp.path().join("other.toml");
    fs::write(&p_env, "[classifier]\nneutral_band = 1.0\n").unwrap();
    env::set_var(ENV_CONFIG_PATH, p_env.display().to_string());
    let e = AppConfig::load_default().unwrap();
    assert!(e.pipeline.enable_tokenization);
    assert_eq!(e.pipeline.classifier.neutral_band, 1.0);

    // 4) env path that does not exist is an error, not a silent default
    env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml").display().to_string());
    assert!(AppConfig::load_default().is_err());

    clear_env();
    env::set_current_dir(&old).unwrap();
}

#[serial_test::serial]
#[test]
fn env_overrides_apply_last() {
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    clear_env();

    env::set_var(ENV_ENABLE_TOKENIZATION, "off");
    env::set_var(ENV_DB_PATH, "/tmp/elsewhere.db");
    env::set_var(ENV_PERSIST_INVALID, "YES");
    let cfg = AppConfig::load_default().unwrap();
    assert!(!cfg.pipeline.enable_tokenization);
    assert_eq!(cfg.store.database_path, PathBuf::from("/tmp/elsewhere.db"));
    assert!(cfg.history.persist_invalid);

    // unparseable booleans are ignored
    env::set_var(ENV_ENABLE_TOKENIZATION, "maybe");
    env::set_var(ENV_DB_PATH, "   ");
    let cfg = AppConfig::load_default().unwrap();
    assert!(cfg.pipeline.enable_tokenization);
    assert_eq!(cfg.store.database_path, PathBuf::from("data/history.db"));

    clear_env();
    env::set_current_dir(&old).unwrap();
}

#[test]
fn malformed_toml_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("bad.toml");
    fs::write(&p, "[history\nper_page = ").unwrap();
    assert!(AppConfig::load_from_file(&p).is_err());
    assert!(AppConfig::load_from_file(dir.path().join("nope.toml")).is_err());
}
