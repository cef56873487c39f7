//! Parameterized statements run against the snapshot tables.
//!
//! Statement text only ever contains table names taken from [`Dialect`], column
//! names from the fixed store layout and word fields from the closed field
//! vocabulary. Patterns, replacements, constraint patterns, exempt words and
//! row ids are always bound as values.

use rusqlite::types::Value as SqlValue;

use crate::condition::{Condition, JoinPrefix, WORD_ALIAS};
use crate::dialect::Dialect;
use crate::rules::Rule;
use crate::snapshot::{BASE_TABLE, TRANSCRIPTION, WORD_TABLE, WORKING_PRON_TABLE, WORKING_WORD_TABLE};

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    values: Vec<SqlValue>,
}

impl Statement {
    fn new(sql: String, values: Vec<SqlValue>) -> Self {
        Self { sql, values }
    }
    pub fn sql(&self) -> &str {
        &self.sql
    }
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }
    pub fn placeholder_count(&self) -> usize {
        self.sql.matches('?').count()
    }
}

fn text_values<'a>(head: impl IntoIterator<Item = &'a str>, condition: &'a Condition) -> Vec<SqlValue> {
    head.into_iter()
        .chain(condition.values().iter().map(String::as_str))
        .map(|value| SqlValue::Text(value.to_string()))
        .collect()
}

/// Rewrites the transcriptions of every row in the dialect whose word
/// satisfies the condition. Without a condition every row is rewritten.
pub fn compile_update(dialect: Dialect, rule: &Rule, condition: &Condition) -> Statement {
    let mut sql = format!(
        "UPDATE {dialect} SET {TRANSCRIPTION} = REGREPLACE(?, ?, {TRANSCRIPTION})"
    );
    if !condition.is_empty() {
        sql.push_str(&format!(
            " WHERE unique_id IN (SELECT {w}.unique_id FROM {WORKING_WORD_TABLE} {w} WHERE {})",
            condition.fragment(),
            w = WORD_ALIAS
        ));
    }
    Statement::new(sql, text_values([rule.pattern(), rule.replacement()], condition))
}

/// Rows of the dialect whose transcription matches the rule pattern and whose
/// word satisfies the condition, as `(pron_id, unique_id, wordform, transcription)`.
pub fn compile_select(dialect: Dialect, rule: &Rule, condition: &Condition) -> Statement {
    let sql = format!(
        "SELECT p.pron_id, {w}.unique_id, {w}.wordform, p.{TRANSCRIPTION} \
         FROM {WORKING_WORD_TABLE} {w} JOIN {dialect} p ON p.unique_id = {w}.unique_id \
         WHERE REGEXP(?, p.{TRANSCRIPTION}){} ORDER BY p.pron_id",
        condition.with_prefix(JoinPrefix::And).sql(),
        w = WORD_ALIAS
    );
    Statement::new(sql, text_values([rule.pattern()], condition))
}

/// Current `(pron_id, transcription)` of the given rows.
pub fn compile_select_by_ids(dialect: Dialect, pron_ids: &[i64]) -> Statement {
    let placeholders = vec!["?"; pron_ids.len()].join(", ");
    let sql = format!(
        "SELECT pron_id, {TRANSCRIPTION} FROM {dialect} WHERE pron_id IN ({placeholders}) ORDER BY pron_id"
    );
    Statement::new(sql, pron_ids.iter().map(|id| SqlValue::Integer(*id)).collect())
}

fn lexicon_select(word_table: &str, pron_table: &str) -> Statement {
    let sql = format!(
        "SELECT {w}.unique_id, {w}.wordform, {w}.pos, {w}.feats, p.{TRANSCRIPTION}, p.pron_id \
         FROM {word_table} {w} JOIN {pron_table} p ON p.unique_id = {w}.unique_id \
         ORDER BY p.pron_id",
        w = WORD_ALIAS
    );
    Statement::new(sql, Vec::new())
}

pub fn compile_dialect_state(dialect: Dialect) -> Statement {
    lexicon_select(WORKING_WORD_TABLE, dialect.as_str())
}

pub fn compile_working_state() -> Statement {
    lexicon_select(WORKING_WORD_TABLE, WORKING_PRON_TABLE)
}

pub fn compile_base_state() -> Statement {
    lexicon_select(&format!("main.{WORD_TABLE}"), &format!("main.{BASE_TABLE}"))
}
