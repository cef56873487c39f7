//! Run settings.
//!
//! Settings are layered: built-in defaults, then an optional settings file
//! (JSON or TOML, picked by extension), then `LEXUPDATER_*` environment
//! variables, e.g. `LEXUPDATER_MODE=match`.
//!
//! Rule documents are validated tolerantly unless the settings ask for
//! `strict`; library callers get [`ValidationMode::Strict`] by default.

use std::path::{Path, PathBuf};

use ::config::{Config, Environment, File};
use serde::Deserialize;

use crate::dialect::Dialect;
use crate::error::Result;
use crate::schema::ValidationMode;

pub const DEFAULT_NEW_WORD_PREFIX: &str = "NEW_WORD_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Apply all rules and write the updated lexicon of every dialect.
    #[default]
    Apply,
    /// Only list the rows each rule would change.
    Match,
    /// Apply all rules and write before/after pairs for the tracked ones.
    Track,
}

/// What the updater itself needs to know about a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub dialects: Vec<Dialect>,
    pub new_word_prefix: String,
}

impl RunConfig {
    pub fn new(dialects: impl IntoIterator<Item = Dialect>) -> Self {
        Self {
            dialects: dialects.into_iter().collect(),
            new_word_prefix: DEFAULT_NEW_WORD_PREFIX.to_string(),
        }
    }
    pub fn with_new_word_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.new_word_prefix = prefix.into();
        self
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new(Dialect::ALL)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: PathBuf,
    pub rules_file: PathBuf,
    pub exemptions_file: PathBuf,
    #[serde(default)]
    pub new_words_file: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub dialects: Vec<String>,
    pub mode: RunMode,
    #[serde(default)]
    pub tracked: Vec<String>,
    pub validation: ValidationMode,
    pub new_word_prefix: String,
    pub log_filter: String,
    pub write_base: bool,
    #[serde(default)]
    pub phoneme_inventory: Option<PathBuf>,
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let all_dialects: Vec<&str> = Dialect::ALL.iter().map(Dialect::as_str).collect();
        let mut builder = Config::builder()
            .set_default("database", "backend-db03.db")?
            .set_default("rules_file", "rules.json")?
            .set_default("exemptions_file", "exemptions.json")?
            .set_default("output_dir", "lexica")?
            .set_default("dialects", all_dialects)?
            .set_default("mode", "apply")?
            .set_default("tracked", Vec::<String>::new())?
            .set_default("validation", "tolerant")?
            .set_default("new_word_prefix", DEFAULT_NEW_WORD_PREFIX)?
            .set_default("log_filter", "info")?
            .set_default("write_base", false)?;
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let settings = builder
            .add_source(
                Environment::with_prefix("LEXUPDATER")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("dialects")
                    .with_list_parse_key("tracked")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// The typed run configuration. Unknown dialect names are dropped with a warning.
    pub fn run_config(&self) -> RunConfig {
        RunConfig::new(Dialect::parse_list(&self.dialects)).with_new_word_prefix(self.new_word_prefix.as_str())
    }
}
