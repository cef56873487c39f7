//! Compiles rule constraints and exempt words into a boolean fragment with
//! positional placeholders.
//!
//! Only field names from [`crate::rules::WORD_FIELDS`] are written into the
//! fragment; every pattern and word is bound as a value, in the order the
//! placeholders appear.

use std::fmt;

use crate::rules::{Constraint, WordField};

/// Alias of the word table in the statements a condition is embedded in.
pub const WORD_ALIAS: &str = "w";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinPrefix {
    Where,
    And,
}

impl fmt::Display for JoinPrefix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JoinPrefix::Where => f.write_str("WHERE"),
            JoinPrefix::And => f.write_str("AND"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Condition {
    fragment: String,
    prefix: Option<JoinPrefix>,
    values: Vec<String>,
}

impl Condition {
    /// The bare boolean expression, without any join prefix.
    pub fn fragment(&self) -> &str {
        &self.fragment
    }
    /// The expression as it should be spliced into a statement. Empty when
    /// there is no restriction, so no dangling prefix is ever produced.
    pub fn sql(&self) -> String {
        match self.prefix {
            Some(prefix) if !self.fragment.is_empty() => format!(" {} {}", prefix, self.fragment),
            _ => self.fragment.clone(),
        }
    }
    pub fn values(&self) -> &[String] {
        &self.values
    }
    pub fn is_empty(&self) -> bool {
        self.fragment.is_empty()
    }
    pub fn placeholder_count(&self) -> usize {
        self.fragment.matches('?').count()
    }
    /// The same condition rendered behind a different join prefix.
    pub fn with_prefix(&self, prefix: JoinPrefix) -> Condition {
        Condition {
            fragment: self.fragment.clone(),
            prefix: Some(prefix),
            values: self.values.clone(),
        }
    }
}

fn column(field: WordField) -> String {
    format!("{}.{}", WORD_ALIAS, field.as_str())
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

pub fn compile_condition(
    constraints: &[Constraint],
    exempt_words: &[String],
    prefix: Option<JoinPrefix>,
) -> Condition {
    let mut parts = Vec::with_capacity(constraints.len() + 1);
    let mut values = Vec::with_capacity(constraints.len() + exempt_words.len());
    for constraint in constraints {
        let operator = if constraint.is_regex() { "REGEXP" } else { "=" };
        parts.push(format!("{} {} ?", column(constraint.field()), operator));
        values.push(constraint.pattern().to_string());
    }
    if !exempt_words.is_empty() {
        parts.push(format!(
            "{} NOT IN ({})",
            column(WordField::WORDFORM),
            placeholders(exempt_words.len())
        ));
        values.extend(exempt_words.iter().cloned());
    }
    Condition {
        fragment: parts.join(" AND "),
        prefix,
        values,
    }
}
