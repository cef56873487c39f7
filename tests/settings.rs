use std::fs;

use lexupdater::config::DEFAULT_NEW_WORD_PREFIX;
use lexupdater::{Dialect, RunMode, Settings, ValidationMode, logging};

#[test]
fn defaults_cover_every_dialect() {
    let settings = Settings::load(None).expect("defaults");
    assert_eq!(settings.mode, RunMode::Apply);
    assert_eq!(settings.validation, ValidationMode::Tolerant);
    assert!(!settings.write_base);
    assert!(settings.new_words_file.is_none());
    let run = settings.run_config();
    assert_eq!(run.dialects, Dialect::ALL.to_vec());
    assert_eq!(run.new_word_prefix, DEFAULT_NEW_WORD_PREFIX);
}

#[test]
fn library_validation_stays_strict_while_the_binary_tolerates() {
    assert_eq!(ValidationMode::default(), ValidationMode::Strict);
    let settings = Settings::load(None).expect("defaults");
    assert_ne!(settings.validation, ValidationMode::default());
}

#[test]
fn settings_file_overrides_defaults() {
    let path = std::env::temp_dir().join(format!("lexupdater-settings-{}.json", std::process::id()));
    fs::write(
        &path,
        r#"{
            "database": "lexicon.db",
            "dialects": ["n_written", "bokmål", "e_spoken", "n_written"],
            "mode": "track",
            "tracked": ["masc_0", "retrotest"],
            "validation": "strict",
            "new_word_prefix": "NY_",
            "write_base": true
        }"#,
    )
    .expect("write settings");
    let settings = Settings::load(Some(path.as_path())).expect("settings");
    let _ = fs::remove_file(&path);

    assert_eq!(settings.database.to_str(), Some("lexicon.db"));
    assert_eq!(settings.mode, RunMode::Track);
    assert_eq!(settings.tracked, vec!["masc_0".to_string(), "retrotest".to_string()]);
    assert_eq!(settings.validation, ValidationMode::Strict);
    assert!(settings.write_base);
    assert_eq!(settings.output_dir.to_str(), Some("lexica"));

    let run = settings.run_config();
    assert_eq!(run.dialects, vec![Dialect::NWritten, Dialect::ESpoken]);
    assert_eq!(run.new_word_prefix, "NY_");
}

#[test]
fn logging_can_be_initialised_more_than_once() {
    assert!(logging::init("lexupdater=debug").is_ok());
    assert!(logging::init("info").is_ok());
}
