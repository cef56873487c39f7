//! Structural validation of rule, rule set, constraint and exemption documents.
//!
//! Documents arrive as `serde_json::Value`s. Each entity has a typed definition
//! that rejects missing, extra and mistyped keys; the [`Validator`] turns those
//! definitions into domain objects. In [`ValidationMode::Strict`] the first invalid
//! item fails the whole batch, in [`ValidationMode::Tolerant`] it is logged and
//! skipped. Tolerance stops at batch items: a rule set with one bad rule or
//! constraint is rejected as a whole, since a rule without its constraints or
//! a chain missing a link would rewrite words it was never meant for.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::dialect::Dialect;
use crate::error::{LexError, Result};
use crate::rules::{Constraint, Exemption, ExemptionMap, Rule, RuleSet, ensure_unique_names};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    #[default]
    Strict,
    Tolerant,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ConstraintDef {
    field: String,
    pattern: String,
    is_regex: bool,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleDef {
    pattern: String,
    #[serde(alias = "repl")]
    replacement: String,
    #[serde(default)]
    constraints: Vec<Value>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleSetDef {
    name: String,
    areas: Vec<String>,
    rules: Vec<Value>,
    #[serde(default)]
    exempt_words: Vec<String>,
}

fn parse<'v, T: Deserialize<'v>>(entity: &'static str, value: &'v Value) -> Result<T> {
    T::deserialize(value).map_err(|e| LexError::validation(entity, e.to_string()))
}

/// Borrows the items of a document that must be a list.
pub fn as_list<'v>(entity: &'static str, document: &'v Value) -> Result<&'v [Value]> {
    document
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| LexError::validation(entity, "expected a list"))
}

#[derive(Debug, Clone, Copy)]
pub struct Validator {
    mode: ValidationMode,
}

impl Validator {
    pub fn new(mode: ValidationMode) -> Self {
        Self { mode }
    }
    pub fn mode(&self) -> ValidationMode {
        self.mode
    }
    pub fn constraint(&self, value: &Value) -> Result<Constraint> {
        let def: ConstraintDef = parse("constraint", value)?;
        Constraint::new(&def.field, def.pattern, def.is_regex)
    }
    pub fn rule(&self, value: &Value) -> Result<Rule> {
        let def: RuleDef = parse("rule", value)?;
        let constraints = def
            .constraints
            .iter()
            .map(|v| self.constraint(v))
            .collect::<Result<Vec<_>>>()?;
        Rule::new(def.pattern, def.replacement, constraints)
    }
    pub fn ruleset(&self, value: &Value) -> Result<RuleSet> {
        let def: RuleSetDef = parse("rule set", value)?;
        let rules = def.rules.iter().map(|v| self.rule(v)).collect::<Result<Vec<_>>>()?;
        RuleSet::new(def.name, Dialect::parse_list(&def.areas), rules, def.exempt_words)
    }
    pub fn exemption(&self, value: &Value) -> Result<Exemption> {
        parse("exemption", value)
    }
    /// Validates a batch of rule sets. Repeated names fail in either mode.
    pub fn rulesets(&self, values: &[Value]) -> Result<Vec<RuleSet>> {
        let rulesets = self.collect("rule set", values, |v| self.ruleset(v))?;
        ensure_unique_names(&rulesets)?;
        Ok(rulesets)
    }
    pub fn rulesets_with_exemptions(
        &self,
        values: &[Value],
        exemptions: &ExemptionMap,
    ) -> Result<Vec<RuleSet>> {
        Ok(self
            .rulesets(values)?
            .into_iter()
            .map(|ruleset| ruleset.with_exemptions(exemptions))
            .collect())
    }
    pub fn exemptions(&self, values: &[Value]) -> Result<ExemptionMap> {
        let exemptions = self.collect("exemption", values, |v| self.exemption(v))?;
        Ok(ExemptionMap::from_exemptions(exemptions))
    }
    fn collect<T>(
        &self,
        entity: &'static str,
        values: &[Value],
        build: impl Fn(&Value) -> Result<T>,
    ) -> Result<Vec<T>> {
        let mut kept = Vec::with_capacity(values.len());
        for (index, value) in values.iter().enumerate() {
            match build(value) {
                Ok(item) => kept.push(item),
                Err(error) if self.mode == ValidationMode::Tolerant => {
                    warn!(entity, index, %error, "skipping invalid item");
                }
                Err(error) => return Err(error),
            }
        }
        Ok(kept)
    }
}
