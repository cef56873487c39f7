//! Per-dialect working copies of the lexicon.
//!
//! The canonical `words` and `base` tables are never written to. A run copies
//! them into the connection's `temp` schema: `words_tmp` (all word metadata),
//! `pron_tmp` (the base pronunciations plus any new words), and one table per
//! requested dialect seeded from `pron_tmp`. Rules are applied to the dialect
//! tables only, and everything disappears when the connection closes.

use std::sync::Arc;

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, Row, params, params_from_iter};
use serde::Deserialize;
use tracing::{debug, info};

use crate::dialect::Dialect;
use crate::error::{LexError, Result};
use crate::statement::{Statement, compile_base_state, compile_dialect_state, compile_working_state};

// ------------- Store layout -------------
pub const WORD_TABLE: &str = "words";
pub const BASE_TABLE: &str = "base";
pub const WORKING_WORD_TABLE: &str = "words_tmp";
pub const WORKING_PRON_TABLE: &str = "pron_tmp";
pub const TRANSCRIPTION: &str = "nofabet";

pub const NEW_WORD_CERTAINTY: i64 = 1;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

lazy_static! {
    // octal escape, \1, \g<name>, an escaped backslash, or a literal dollar sign
    static ref GROUP_REFERENCE: Regex =
        Regex::new(r"\\([0-3][0-7]{2}|0[0-7]{0,2})|\\([1-9]\d?)|\\g<(\w+)>|\\\\|\$")
            .expect("group reference pattern");
}

/// Rewrites a replacement written with `\1` or `\g<name>` group references into
/// the `${1}` form understood by the regex crate. Literal `$` signs are escaped.
///
/// `\0` and three digit escapes such as `\101` are octal character escapes,
/// so `\0` is a NUL character. The whole match is written `\g<0>`.
pub fn translate_replacement(replacement: &str) -> String {
    GROUP_REFERENCE
        .replace_all(replacement, |caps: &Captures| {
            if let Some(octal) = caps.get(1) {
                match u32::from_str_radix(octal.as_str(), 8).ok().and_then(char::from_u32) {
                    Some('$') => "$$".to_string(),
                    Some(ch) => ch.to_string(),
                    None => caps[0].to_string(),
                }
            } else if let Some(group) = caps.get(2).or_else(|| caps.get(3)) {
                format!("${{{}}}", group.as_str())
            } else if &caps[0] == "$" {
                "$$".to_string()
            } else {
                "\\".to_string()
            }
        })
        .into_owned()
}

fn compile_pattern(value: rusqlite::types::ValueRef<'_>) -> std::result::Result<Regex, BoxError> {
    Ok(Regex::new(value.as_str()?)?)
}

/// Registers `REGEXP(pattern, value)` and `REGREPLACE(pattern, replacement, value)`.
/// Compiled patterns are kept as auxiliary data for the lifetime of a statement.
pub fn register_functions(connection: &Connection) -> Result<()> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;
    connection.create_scalar_function("REGEXP", 2, flags, |ctx| {
        let pattern: Arc<Regex> = ctx.get_or_create_aux(0, compile_pattern)?;
        let value: Option<String> = ctx.get(1)?;
        Ok(value.is_some_and(|value| pattern.is_match(&value)))
    })?;
    connection.create_scalar_function("REGREPLACE", 3, flags, |ctx| {
        let pattern: Arc<Regex> = ctx.get_or_create_aux(0, compile_pattern)?;
        let replacement: Arc<String> =
            ctx.get_or_create_aux(1, |value| -> std::result::Result<String, BoxError> {
                Ok(translate_replacement(value.as_str()?))
            })?;
        let value: Option<String> = ctx.get(2)?;
        Ok(value.map(|value| pattern.replace_all(&value, replacement.as_str()).into_owned()))
    })?;
    Ok(())
}

// ------------- Rows -------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexiconRow {
    pub unique_id: String,
    pub wordform: String,
    pub pos: Option<String>,
    pub feats: Option<String>,
    pub transcription: String,
    pub pron_id: i64,
}
impl LexiconRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            unique_id: row.get(0)?,
            wordform: row.get(1)?,
            pos: row.get(2)?,
            feats: row.get(3)?,
            transcription: row.get(4)?,
            pron_id: row.get(5)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRow {
    pub pron_id: i64,
    pub unique_id: String,
    pub wordform: String,
    pub transcription: String,
}
impl MatchRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            pron_id: row.get(0)?,
            unique_id: row.get(1)?,
            wordform: row.get(2)?,
            transcription: row.get(3)?,
        })
    }
}

/// A word added to the working copy before rules are applied.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewWord {
    pub wordform: String,
    #[serde(default)]
    pub pos: Option<String>,
    #[serde(default)]
    pub feats: Option<String>,
    pub transcriptions: Vec<String>,
}

// ------------- Identities -------------
/// Hands out the counter part of new word ids, never the same one twice.
#[derive(Debug, Default)]
pub struct IdGenerator {
    next: u64,
}
impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn generate(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
    pub fn issued(&self) -> u64 {
        self.next
    }
}

// ------------- Snapshot -------------
pub struct Snapshot {
    connection: Connection,
    dialects: Vec<Dialect>,
    ids: IdGenerator,
    id_prefix: String,
}

impl Snapshot {
    pub fn create(
        connection: Connection,
        dialects: &[Dialect],
        id_prefix: impl Into<String>,
        new_words: &[NewWord],
    ) -> Result<Self> {
        let mut snapshot = Self {
            connection,
            dialects: Vec::with_capacity(dialects.len()),
            ids: IdGenerator::new(),
            id_prefix: id_prefix.into(),
        };
        register_functions(&snapshot.connection)?;
        snapshot.create_working_tables()?;
        snapshot.insert_new_words(new_words)?;
        for dialect in dialects {
            if !snapshot.contains(*dialect) {
                snapshot.create_dialect_table(*dialect)?;
            }
        }
        Ok(snapshot)
    }

    fn create_working_tables(&self) -> Result<()> {
        debug!("creating working tables {WORKING_WORD_TABLE} and {WORKING_PRON_TABLE}");
        self.connection.execute_batch(&format!(
            "
            drop table if exists temp.{WORKING_WORD_TABLE};
            create temp table {WORKING_WORD_TABLE} as select * from main.{WORD_TABLE};
            create index temp.{WORKING_WORD_TABLE}_unique_id on {WORKING_WORD_TABLE} (unique_id);
            drop table if exists temp.{WORKING_PRON_TABLE};
            create temp table {WORKING_PRON_TABLE} (
                pron_id integer primary key,
                {TRANSCRIPTION} text not null,
                certainty integer not null,
                unique_id text not null
            );
            insert into {WORKING_PRON_TABLE} (pron_id, {TRANSCRIPTION}, certainty, unique_id)
                select pron_id, {TRANSCRIPTION}, certainty, unique_id
                from main.{BASE_TABLE};
            "
        ))?;
        Ok(())
    }

    fn create_dialect_table(&mut self, dialect: Dialect) -> Result<()> {
        self.connection.execute_batch(&format!(
            "
            drop table if exists temp.{dialect};
            create temp table {dialect} (
                pron_id integer primary key,
                {TRANSCRIPTION} text not null,
                certainty integer not null,
                unique_id text not null
            );
            create index temp.{dialect}_unique_id on {dialect} (unique_id);
            insert into {dialect} (pron_id, {TRANSCRIPTION}, certainty, unique_id)
                select pron_id, {TRANSCRIPTION}, certainty, unique_id
                from {WORKING_PRON_TABLE};
            "
        ))?;
        self.dialects.push(dialect);
        info!(%dialect, "created dialect snapshot");
        Ok(())
    }

    /// Adds new words to the working copy and every dialect table created so far.
    /// Returns the unique ids assigned to the words, in input order.
    pub fn insert_new_words(&mut self, words: &[NewWord]) -> Result<Vec<String>> {
        let mut assigned = Vec::with_capacity(words.len());
        if words.is_empty() {
            return Ok(assigned);
        }
        let transaction = self.connection.unchecked_transaction()?;
        {
            let mut add_word = transaction.prepare(&format!(
                "insert into {WORKING_WORD_TABLE} (wordform, pos, feats, unique_id) values (?, ?, ?, ?)"
            ))?;
            let mut add_pron = transaction.prepare(&format!(
                "insert into {WORKING_PRON_TABLE} ({TRANSCRIPTION}, certainty, unique_id) values (?, ?, ?)"
            ))?;
            let mut add_dialect_prons = self
                .dialects
                .iter()
                .map(|dialect| {
                    transaction.prepare(&format!(
                        "insert into {dialect} (pron_id, {TRANSCRIPTION}, certainty, unique_id) values (?, ?, ?, ?)"
                    ))
                })
                .collect::<rusqlite::Result<Vec<_>>>()?;
            for word in words {
                let unique_id = format!("{}{}", self.id_prefix, self.ids.generate());
                add_word.execute(params![word.wordform, word.pos, word.feats, unique_id])?;
                for transcription in &word.transcriptions {
                    add_pron.execute(params![transcription, NEW_WORD_CERTAINTY, unique_id])?;
                    let pron_id = transaction.last_insert_rowid();
                    for add_dialect_pron in add_dialect_prons.iter_mut() {
                        add_dialect_pron.execute(params![
                            pron_id,
                            transcription,
                            NEW_WORD_CERTAINTY,
                            unique_id
                        ])?;
                    }
                }
                assigned.push(unique_id);
            }
        }
        transaction.commit()?;
        info!(words = assigned.len(), "inserted new words");
        Ok(assigned)
    }

    pub fn dialects(&self) -> &[Dialect] {
        &self.dialects
    }
    pub fn contains(&self, dialect: Dialect) -> bool {
        self.dialects.contains(&dialect)
    }
    pub fn require(&self, dialect: Dialect) -> Result<()> {
        if self.contains(dialect) {
            Ok(())
        } else {
            Err(LexError::MissingSnapshot(dialect.to_string()))
        }
    }
    pub fn new_words_issued(&self) -> u64 {
        self.ids.issued()
    }
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Runs a statement that changes rows, returning how many were touched.
    pub fn execute(&self, statement: &Statement) -> Result<usize> {
        let mut prepared = self.connection.prepare_cached(statement.sql())?;
        Ok(prepared.execute(params_from_iter(statement.values()))?)
    }
    fn query<T>(
        &self,
        statement: &Statement,
        map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>> {
        let mut prepared = self.connection.prepare_cached(statement.sql())?;
        let rows = prepared.query_map(params_from_iter(statement.values()), map)?;
        let collected = rows.collect::<rusqlite::Result<Vec<T>>>()?;
        Ok(collected)
    }
    pub fn matches(&self, statement: &Statement) -> Result<Vec<MatchRow>> {
        self.query(statement, MatchRow::from_row)
    }
    pub fn transcriptions(&self, statement: &Statement) -> Result<Vec<(i64, String)>> {
        self.query(statement, |row| Ok((row.get(0)?, row.get(1)?)))
    }
    pub fn lexicon(&self, statement: &Statement) -> Result<Vec<LexiconRow>> {
        self.query(statement, LexiconRow::from_row)
    }
    pub fn dialect_rows(&self, dialect: Dialect) -> Result<Vec<LexiconRow>> {
        self.require(dialect)?;
        self.lexicon(&compile_dialect_state(dialect))
    }
    /// The canonical lexicon, before any new words or rules.
    pub fn base_rows(&self) -> Result<Vec<LexiconRow>> {
        self.lexicon(&compile_base_state())
    }
    /// The working copy including new words, without dialect changes.
    pub fn working_rows(&self) -> Result<Vec<LexiconRow>> {
        self.lexicon(&compile_working_state())
    }
    pub fn close(self) -> Result<()> {
        self.connection.close().map_err(|(_, e)| LexError::from(e))
    }
}
