//! Rules, their constraints, and the named rule sets that bundle them.
//!
//! A [`Rule`] rewrites transcriptions matching a regex pattern. A [`Constraint`]
//! narrows the words a rule may touch by their metadata. A [`RuleSet`] scopes
//! rules to a list of dialects and carries the words exempt from all its rules.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::FastHasher;
use crate::dialect::Dialect;
use crate::error::{LexError, Result};
use crate::schema::{ValidationMode, Validator};

// ------------- Word fields -------------
/// Metadata columns of the word table that constraints may refer to.
/// Field names end up in statement text, so nothing outside this list is accepted.
pub const WORD_FIELDS: &[&str] = &[
    "wordform",
    "pos",
    "feats",
    "source",
    "decomp_ort",
    "decomp_pos",
    "garbage",
    "domain",
    "abbr",
    "set_name",
    "style_status",
    "inflector_role",
    "inflector_rule",
    "morph_label",
    "compounder_code",
    "update_info",
    "lang_code",
    "expansion",
    "set_id",
    "lemma",
    "sem_code",
    "frequency",
    "orig_wf",
    "comment",
    "unique_id",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct WordField(&'static str);

impl WordField {
    pub const WORDFORM: WordField = WordField("wordform");

    pub fn lookup(name: &str) -> Option<WordField> {
        WORD_FIELDS
            .iter()
            .find(|field| **field == name)
            .map(|field| WordField(*field))
    }
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

// ------------- Constraint -------------
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Constraint {
    field: WordField,
    pattern: String,
    is_regex: bool,
}

impl Constraint {
    pub fn new(field: &str, pattern: impl Into<String>, is_regex: bool) -> Result<Self> {
        let field = WordField::lookup(field).ok_or_else(|| {
            LexError::validation("constraint", format!("unknown word field '{field}'"))
        })?;
        Ok(Self {
            field,
            pattern: pattern.into(),
            is_regex,
        })
    }
    pub fn exact(field: &str, pattern: impl Into<String>) -> Result<Self> {
        Self::new(field, pattern, false)
    }
    pub fn regex(field: &str, pattern: impl Into<String>) -> Result<Self> {
        Self::new(field, pattern, true)
    }
    pub fn field(&self) -> WordField {
        self.field
    }
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
    pub fn is_regex(&self) -> bool {
        self.is_regex
    }
    pub fn to_dict(&self) -> Value {
        json!({
            "field": self.field.as_str(),
            "pattern": self.pattern,
            "is_regex": self.is_regex,
        })
    }
}

// ------------- Rule -------------
/// A replacement rule. `==` compares everything including the constraints,
/// while [`Rule::same_pattern_as`] only looks at pattern and replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pattern: String,
    replacement: String,
    constraints: Vec<Constraint>,
}

impl Rule {
    pub fn new(
        pattern: impl Into<String>,
        replacement: impl Into<String>,
        constraints: Vec<Constraint>,
    ) -> Result<Self> {
        let pattern = pattern.into();
        let replacement = replacement.into();
        if pattern.is_empty() {
            return Err(LexError::validation("rule", "pattern must not be empty"));
        }
        if replacement.is_empty() {
            return Err(LexError::validation("rule", "replacement must not be empty"));
        }
        let mut rule = Self {
            pattern,
            replacement,
            constraints: Vec::with_capacity(constraints.len()),
        };
        for constraint in constraints {
            rule.add_constraint(constraint);
        }
        Ok(rule)
    }
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
    pub fn replacement(&self) -> &str {
        &self.replacement
    }
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }
    /// Appends a constraint unless an identical one is already present.
    pub fn add_constraint(&mut self, constraint: Constraint) -> bool {
        if self.constraints.contains(&constraint) {
            debug!(field = constraint.field().as_str(), pattern = constraint.pattern(), "skipping repeated constraint");
            return false;
        }
        self.constraints.push(constraint);
        true
    }
    /// Digest of pattern and replacement, the identity used when de-duplicating rules.
    pub fn content_hash(&self) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(self.pattern.len() as u64).to_le_bytes());
        hasher.update(self.pattern.as_bytes());
        hasher.update(self.replacement.as_bytes());
        hasher.finalize()
    }
    pub fn same_pattern_as(&self, other: &Rule) -> bool {
        self.content_hash() == other.content_hash()
    }
    pub fn to_dict(&self) -> Value {
        json!({
            "pattern": self.pattern,
            "replacement": self.replacement,
            "constraints": self.constraints.iter().map(Constraint::to_dict).collect::<Vec<_>>(),
        })
    }
}

// ------------- RuleSet -------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    name: String,
    areas: Vec<Dialect>,
    rules: Vec<Rule>,
    exempt_words: Vec<String>,
}

impl RuleSet {
    pub fn new(
        name: impl Into<String>,
        areas: impl IntoIterator<Item = Dialect>,
        rules: impl IntoIterator<Item = Rule>,
        exempt_words: Vec<String>,
    ) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(LexError::validation("rule set", "name must not be empty"));
        }
        let mut ruleset = Self {
            name,
            areas: Vec::new(),
            rules: Vec::new(),
            exempt_words: Vec::new(),
        };
        for area in areas {
            if !ruleset.areas.contains(&area) {
                ruleset.areas.push(area);
            }
        }
        for rule in rules {
            ruleset.add_rule(rule);
        }
        ruleset.extend_exempt_words(exempt_words);
        Ok(ruleset)
    }
    /// Builds a rule set from its dictionary form, rejecting any malformed part.
    pub fn from_dict(value: &Value) -> Result<Self> {
        Validator::new(ValidationMode::Strict).ruleset(value)
    }
    pub fn to_dict(&self) -> Value {
        json!({
            "name": self.name,
            "areas": self.areas.iter().map(Dialect::as_str).collect::<Vec<_>>(),
            "rules": self.rules.iter().map(Rule::to_dict).collect::<Vec<_>>(),
            "exempt_words": self.exempt_words,
        })
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn areas(&self) -> &[Dialect] {
        &self.areas
    }
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
    pub fn exempt_words(&self) -> &[String] {
        &self.exempt_words
    }
    /// Adds a rule unless one with the same pattern and replacement is already kept.
    pub fn add_rule(&mut self, rule: Rule) -> bool {
        if let Some(index) = self.rules.iter().position(|kept| kept.same_pattern_as(&rule)) {
            debug!(
                ruleset = self.name.as_str(),
                pattern = rule.pattern(),
                replacement = rule.replacement(),
                existing = index,
                "skipping rule that already exists"
            );
            return false;
        }
        self.rules.push(rule);
        true
    }
    pub fn extend_exempt_words<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for word in words {
            let word = word.into();
            if !self.exempt_words.contains(&word) {
                self.exempt_words.push(word);
            }
        }
    }
    /// Attaches the exempt words registered for this rule set's name.
    pub fn with_exemptions(mut self, exemptions: &ExemptionMap) -> Self {
        let words = exemptions.words_for(&self.name).to_vec();
        self.extend_exempt_words(words);
        self
    }
    pub fn rule_id(&self, index: usize) -> String {
        format!("{}_{}", self.name, index)
    }
    pub fn rules_with_ids(&self) -> impl Iterator<Item = (String, &Rule)> {
        self.rules
            .iter()
            .enumerate()
            .map(|(index, rule)| (self.rule_id(index), rule))
    }
    pub fn exemption(&self) -> Exemption {
        Exemption {
            ruleset: self.name.clone(),
            words: self.exempt_words.clone(),
        }
    }
}

/// Fails when two rule sets share a name, listing every repeated name once.
pub fn ensure_unique_names(rulesets: &[RuleSet]) -> Result<()> {
    let mut seen: HashMap<&str, usize, FastHasher> = HashMap::default();
    let mut duplicates = Vec::new();
    for ruleset in rulesets {
        let count = seen.entry(ruleset.name()).or_insert(0);
        *count += 1;
        if *count == 2 {
            duplicates.push(ruleset.name().to_string());
        }
    }
    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(LexError::DuplicateRuleSet(duplicates))
    }
}

/// Appends `additions` to `existing`, refusing the merge if any name would repeat.
pub fn merge_rulesets(existing: Vec<RuleSet>, additions: Vec<RuleSet>) -> Result<Vec<RuleSet>> {
    let mut merged = existing;
    merged.extend(additions);
    ensure_unique_names(&merged)?;
    Ok(merged)
}

// ------------- Exemptions -------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Exemption {
    pub ruleset: String,
    pub words: Vec<String>,
}

/// Rule set name to exempt words. The first exemption seen for a name wins.
#[derive(Debug, Default, Clone)]
pub struct ExemptionMap {
    kept: HashMap<String, Vec<String>, FastHasher>,
}

impl ExemptionMap {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn from_exemptions(exemptions: impl IntoIterator<Item = Exemption>) -> Self {
        let mut map = Self::new();
        for exemption in exemptions {
            map.insert(exemption);
        }
        map
    }
    /// Returns false, leaving the map as is, when the rule set already has exemptions.
    pub fn insert(&mut self, exemption: Exemption) -> bool {
        match self.kept.entry(exemption.ruleset) {
            Entry::Vacant(e) => {
                e.insert(exemption.words);
                true
            }
            Entry::Occupied(e) => {
                warn!(ruleset = e.key().as_str(), "ignoring repeated exemption entry");
                false
            }
        }
    }
    pub fn words_for(&self, ruleset: &str) -> &[String] {
        self.kept.get(ruleset).map(Vec::as_slice).unwrap_or(&[])
    }
    pub fn len(&self) -> usize {
        self.kept.len()
    }
    pub fn is_empty(&self) -> bool {
        self.kept.is_empty()
    }
}
