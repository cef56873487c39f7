//! Applies rule sets to the dialect snapshots.
//!
//! Rule sets run in the order given, and so do the rules inside each one, because
//! phonological rules may feed each other. A statement that fails at the store
//! (typically a pattern the regex engine rejects) is logged, recorded as a
//! [`StatementFailure`] and skipped; the rest of the batch still runs.

use std::collections::{BTreeMap, HashMap, HashSet};

use roaring::RoaringTreemap;
use rusqlite::Connection;
use tracing::{debug, error, info};

use crate::FastHasher;
use crate::condition::{Condition, compile_condition};
use crate::config::RunConfig;
use crate::dialect::Dialect;
use crate::error::{LexError, Result};
use crate::rules::{Rule, RuleSet};
use crate::snapshot::{LexiconRow, MatchRow, NewWord, Snapshot};
use crate::statement::{compile_select, compile_select_by_ids, compile_update};

/// Row ids looked up per post-state statement, well below SQLite's parameter limit.
pub const POST_STATE_CHUNK: usize = 500;

/// Rule ids (`<rule set>_<index>`) or whole rule set names to capture changes for.
#[derive(Debug, Default, Clone)]
pub struct TrackedRules {
    ids: HashSet<String, FastHasher>,
}

impl TrackedRules {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }
    pub fn tracks(&self, ruleset: &str, rule_id: &str) -> bool {
        self.ids.contains(rule_id) || self.ids.contains(ruleset)
    }
    pub fn len(&self) -> usize {
        self.ids.len()
    }
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for TrackedRules {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut tracked = Self::new();
        for id in iter {
            tracked.insert(id);
        }
        tracked
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub rule_id: String,
    pub dialect: Dialect,
    pub pron_id: i64,
    pub wordform: String,
    pub old_transcription: String,
    pub new_transcription: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatches {
    pub rule_id: String,
    pub pattern: String,
    pub rows: Vec<MatchRow>,
}

/// A statement that was skipped. `rule_id` is the rule set name when the whole
/// (rule set, dialect) pair could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementFailure {
    pub rule_id: String,
    pub dialect: Dialect,
    pub message: String,
}

pub struct Updater {
    snapshot: Snapshot,
    failures: Vec<StatementFailure>,
}

impl Updater {
    pub fn new(connection: Connection, config: &RunConfig, new_words: &[NewWord]) -> Result<Self> {
        let snapshot = Snapshot::create(
            connection,
            &config.dialects,
            config.new_word_prefix.as_str(),
            new_words,
        )?;
        Ok(Self {
            snapshot,
            failures: Vec::new(),
        })
    }
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }
    pub fn insert_new_words(&mut self, words: &[NewWord]) -> Result<Vec<String>> {
        self.snapshot.insert_new_words(words)
    }
    pub fn failures(&self) -> &[StatementFailure] {
        &self.failures
    }
    pub fn take_failures(&mut self) -> Vec<StatementFailure> {
        std::mem::take(&mut self.failures)
    }
    pub fn close(self) -> Result<()> {
        self.snapshot.close()
    }

    /// Applies every rule and returns the resulting rows of each requested dialect.
    pub fn apply(
        &mut self,
        rulesets: &[RuleSet],
        dialects: &[Dialect],
    ) -> Result<BTreeMap<Dialect, Vec<LexiconRow>>> {
        info!(rulesets = rulesets.len(), dialects = dialects.len(), "applying rules");
        self.run(rulesets, dialects, None);
        self.results(dialects)
    }

    /// Applies every rule, capturing before and after transcriptions for the tracked ones.
    pub fn apply_tracked(
        &mut self,
        rulesets: &[RuleSet],
        dialects: &[Dialect],
        tracked: &TrackedRules,
    ) -> Result<Vec<ChangeRecord>> {
        info!(
            rulesets = rulesets.len(),
            dialects = dialects.len(),
            tracked = tracked.len(),
            "applying rules with change tracking"
        );
        Ok(self.run(rulesets, dialects, Some(tracked)))
    }

    /// Lists the rows each rule would touch, without changing anything.
    pub fn matching_rows(
        &mut self,
        rulesets: &[RuleSet],
        dialects: &[Dialect],
    ) -> BTreeMap<Dialect, Vec<RuleMatches>> {
        let mut matches: BTreeMap<Dialect, Vec<RuleMatches>> = BTreeMap::new();
        for ruleset in rulesets {
            for dialect in self.targets(ruleset, dialects) {
                for (rule_id, rule) in ruleset.rules_with_ids() {
                    let condition = compile_condition(rule.constraints(), ruleset.exempt_words(), None);
                    match self.snapshot.matches(&compile_select(dialect, rule, &condition)) {
                        Ok(rows) => {
                            debug!(rule_id = rule_id.as_str(), %dialect, rows = rows.len(), "matched rule");
                            matches.entry(dialect).or_default().push(RuleMatches {
                                rule_id,
                                pattern: rule.pattern().to_string(),
                                rows,
                            });
                        }
                        Err(error) => self.record_failure(&rule_id, dialect, error),
                    }
                }
            }
        }
        matches
    }

    /// Current rows of each requested dialect that has a snapshot.
    pub fn results(&self, dialects: &[Dialect]) -> Result<BTreeMap<Dialect, Vec<LexiconRow>>> {
        let mut results = BTreeMap::new();
        for dialect in dialects.iter().copied().filter(|d| self.snapshot.contains(*d)) {
            results.insert(dialect, self.snapshot.dialect_rows(dialect)?);
        }
        Ok(results)
    }

    fn run(
        &mut self,
        rulesets: &[RuleSet],
        dialects: &[Dialect],
        tracked: Option<&TrackedRules>,
    ) -> Vec<ChangeRecord> {
        let mut changes = Vec::new();
        for ruleset in rulesets {
            for dialect in self.targets(ruleset, dialects) {
                for (rule_id, rule) in ruleset.rules_with_ids() {
                    let condition = compile_condition(rule.constraints(), ruleset.exempt_words(), None);
                    let outcome = if tracked.is_some_and(|t| t.tracks(ruleset.name(), &rule_id)) {
                        self.apply_rule_tracked(dialect, &rule_id, rule, &condition)
                            .map(|records| changes.extend(records))
                    } else {
                        self.apply_rule(dialect, &rule_id, rule, &condition)
                    };
                    if let Err(error) = outcome {
                        self.record_failure(&rule_id, dialect, error);
                    }
                }
            }
        }
        info!(failures = self.failures.len(), changes = changes.len(), "finished applying rules");
        changes
    }

    /// The rule set's areas that were asked for, in the rule set's order.
    /// Areas without a snapshot are recorded as failures and left out.
    fn targets(&mut self, ruleset: &RuleSet, dialects: &[Dialect]) -> Vec<Dialect> {
        let mut targets = Vec::with_capacity(ruleset.areas().len());
        for dialect in ruleset.areas().iter().copied().filter(|d| dialects.contains(d)) {
            match self.snapshot.require(dialect) {
                Ok(()) => targets.push(dialect),
                Err(error) => self.record_failure(ruleset.name(), dialect, error),
            }
        }
        targets
    }

    fn apply_rule(&self, dialect: Dialect, rule_id: &str, rule: &Rule, condition: &Condition) -> Result<()> {
        let rows = self.snapshot.execute(&compile_update(dialect, rule, condition))?;
        debug!(rule_id, %dialect, rows, "applied rule");
        Ok(())
    }

    fn apply_rule_tracked(
        &self,
        dialect: Dialect,
        rule_id: &str,
        rule: &Rule,
        condition: &Condition,
    ) -> Result<Vec<ChangeRecord>> {
        let before = self.snapshot.matches(&compile_select(dialect, rule, condition))?;
        let rows = self.snapshot.execute(&compile_update(dialect, rule, condition))?;

        let mut captured = RoaringTreemap::new();
        for row in &before {
            captured.insert(row.pron_id as u64);
        }
        let ids: Vec<i64> = captured.iter().map(|id| id as i64).collect();
        let mut after: HashMap<i64, String, FastHasher> =
            HashMap::with_capacity_and_hasher(ids.len(), FastHasher::default());
        for chunk in ids.chunks(POST_STATE_CHUNK) {
            after.extend(self.snapshot.transcriptions(&compile_select_by_ids(dialect, chunk))?);
        }
        debug!(rule_id, %dialect, rows, captured = before.len(), "applied tracked rule");

        Ok(before
            .into_iter()
            .filter_map(|row| {
                let new_transcription = after.get(&row.pron_id)?.clone();
                Some(ChangeRecord {
                    rule_id: rule_id.to_string(),
                    dialect,
                    pron_id: row.pron_id,
                    wordform: row.wordform,
                    old_transcription: row.transcription,
                    new_transcription,
                })
            })
            .collect())
    }

    fn record_failure(&mut self, rule_id: &str, dialect: Dialect, error: LexError) {
        error!(rule_id, %dialect, %error, "skipping statement");
        self.failures.push(StatementFailure {
            rule_id: rule_id.to_string(),
            dialect,
            message: error.to_string(),
        });
    }
}
