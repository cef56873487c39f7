//! Lexupdater – rule-driven dialect updates for a pronunciation lexicon.
//!
//! A pronunciation lexicon keeps one transcription per word and pronunciation
//! variant in a SQLite store. Lexupdater derives the transcriptions of a number
//! of dialects from that base by applying regular expression rules:
//! * A [`rules::Rule`] replaces every match of a pattern in a transcription,
//!   optionally only for words whose metadata satisfies its [`rules::Constraint`]s.
//! * A [`rules::RuleSet`] names an ordered bundle of rules, the dialects
//!   ([`dialect::Dialect`]) it targets, and the words exempt from it.
//!
//! Canonical data is never modified. Each run works on temporary copies
//! (see [`snapshot`]), one per requested dialect.
//!
//! ## Modules
//! * [`rules`] and [`schema`] – the domain model and validation of rule documents.
//! * [`condition`] and [`statement`] – compile rules into parameterized SQL.
//!   Patterns, replacements and metadata values are always bound, never spliced.
//! * [`snapshot`] – working tables and the `REGEXP`/`REGREPLACE` functions.
//! * [`updater`] – applies rule sets in order, optionally tracking changes.
//! * [`report`] – tab-separated output and phoneme inventory checks.
//! * [`config`] and [`logging`] – settings and log output for the binary.
//!
//! ## Quick Start
//! ```
//! use lexupdater::{Dialect, Rule, RuleSet, RunConfig, Updater};
//! use rusqlite::Connection;
//! let conn = Connection::open_in_memory().unwrap();
//! conn.execute_batch("
//!     create table words (word_id integer primary key, wordform text, pos text, feats text, unique_id text);
//!     create table base (pron_id integer primary key, nofabet text, certainty integer, unique_id text);
//!     insert into words (wordform, pos, feats, unique_id) values ('barn', 'NN', 'NEU', 'b1');
//!     insert into base (nofabet, certainty, unique_id) values ('B AA1 RN', 1, 'b1');
//! ").unwrap();
//! let rule = Rule::new(r"\bRN\b", "R N", vec![]).unwrap();
//! let retro = RuleSet::new("retro", [Dialect::ESpoken], [rule], vec![]).unwrap();
//! let mut updater = Updater::new(conn, &RunConfig::new([Dialect::ESpoken]), &[]).unwrap();
//! let lexicon = updater.apply(&[retro], &[Dialect::ESpoken]).unwrap();
//! assert_eq!(lexicon[&Dialect::ESpoken][0].transcription, "B AA1 R N");
//! ```

use std::hash::BuildHasherDefault;

use seahash::SeaHasher;

pub mod condition;
pub mod config;
pub mod dialect;
pub mod error;
pub mod logging;
pub mod report;
pub mod rules;
pub mod schema;
pub mod snapshot;
pub mod statement;
pub mod updater;

/// Hasher for maps and sets keyed by names, words and row ids.
pub type FastHasher = BuildHasherDefault<SeaHasher>;

pub use crate::config::{RunConfig, RunMode, Settings};
pub use dialect::Dialect;
pub use error::{LexError, Result};
pub use rules::{Constraint, Exemption, ExemptionMap, Rule, RuleSet};
pub use schema::{ValidationMode, Validator};
pub use snapshot::{LexiconRow, MatchRow, NewWord, Snapshot};
pub use updater::{ChangeRecord, RuleMatches, StatementFailure, TrackedRules, Updater};
