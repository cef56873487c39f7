//! Tab-separated output files and phoneme inventory checks.

use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::FastHasher;
use crate::dialect::Dialect;
use crate::error::Result;
use crate::snapshot::LexiconRow;
use crate::updater::{ChangeRecord, RuleMatches};

pub const BASE_FILE: &str = "base.txt";
pub const LEXICON_PREFIX: &str = "updated_lexicon";
pub const MATCH_PREFIX: &str = "words_matching_rules";
pub const CHANGE_PREFIX: &str = "updates";
pub const INVALID_PREFIX: &str = "invalid_phonemes";
pub const CHANGE_ARROW: &str = "===>";

pub fn lexicon_path(dir: &Path, dialect: Dialect) -> PathBuf {
    dir.join(format!("{LEXICON_PREFIX}_{dialect}.txt"))
}
pub fn matches_path(dir: &Path, dialect: Dialect) -> PathBuf {
    dir.join(format!("{MATCH_PREFIX}_{dialect}.txt"))
}
pub fn invalid_path(dir: &Path, dialect: Dialect) -> PathBuf {
    dir.join(format!("{INVALID_PREFIX}_{dialect}.txt"))
}
pub fn changes_path(dir: &Path, rule_id: &str) -> PathBuf {
    dir.join(format!("{CHANGE_PREFIX}_{rule_id}.txt"))
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(BufWriter::new(File::create(path)?))
}

/// One `wordform, pos, feats, transcription` line per row.
pub fn write_lexicon(path: &Path, rows: &[LexiconRow]) -> Result<()> {
    info!(path = %path.display(), rows = rows.len(), "writing lexicon");
    let mut out = create(path)?;
    for row in rows {
        writeln!(
            out,
            "{}\t{}\t{}\t{}",
            row.wordform,
            row.pos.as_deref().unwrap_or(""),
            row.feats.as_deref().unwrap_or(""),
            row.transcription
        )?;
    }
    out.flush()?;
    Ok(())
}

/// One `rule_id, pattern, pron_id, wordform, transcription` line per matched row.
pub fn write_matches(path: &Path, matches: &[RuleMatches]) -> Result<()> {
    info!(path = %path.display(), rules = matches.len(), "writing rule matches");
    let mut out = create(path)?;
    for rule in matches {
        for row in &rule.rows {
            writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}",
                rule.rule_id, rule.pattern, row.pron_id, row.wordform, row.transcription
            )?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Writes a matches file for every dialect in `dialects`, empty when nothing
/// matched there, and returns the files written.
pub fn write_match_files(
    dir: &Path,
    dialects: &[Dialect],
    matches: &BTreeMap<Dialect, Vec<RuleMatches>>,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(dialects.len());
    for &dialect in dialects {
        let path = matches_path(dir, dialect);
        write_matches(&path, matches.get(&dialect).map(Vec::as_slice).unwrap_or(&[]))?;
        written.push(path);
    }
    Ok(written)
}

/// Writes one file per rule id into `dir`, returning the files written.
pub fn write_changes(dir: &Path, records: &[ChangeRecord]) -> Result<Vec<PathBuf>> {
    let mut per_rule: BTreeMap<&str, Vec<&ChangeRecord>> = BTreeMap::new();
    for record in records {
        per_rule.entry(record.rule_id.as_str()).or_default().push(record);
    }
    let mut written = Vec::with_capacity(per_rule.len());
    for (rule_id, records) in per_rule {
        let path = changes_path(dir, rule_id);
        info!(path = %path.display(), rule_id, rows = records.len(), "writing tracked changes");
        let mut out = create(&path)?;
        writeln!(out, "dialect\tpron_id\trule_id\twordform\ttranscription\tarrow\tnew_transcription")?;
        for record in records {
            writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}\t{CHANGE_ARROW}\t{}",
                record.dialect,
                record.pron_id,
                record.rule_id,
                record.wordform,
                record.old_transcription,
                record.new_transcription
            )?;
        }
        out.flush()?;
        written.push(path);
    }
    Ok(written)
}

/// The phonemes a transcription may be built from.
#[derive(Debug, Default, Clone)]
pub struct PhonemeInventory {
    phonemes: HashSet<String, FastHasher>,
}

impl PhonemeInventory {
    /// Reads whitespace separated phoneme symbols.
    pub fn from_text(text: &str) -> Self {
        Self {
            phonemes: text.split_whitespace().map(str::to_string).collect(),
        }
    }
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::from_text(&fs::read_to_string(path)?))
    }
    pub fn len(&self) -> usize {
        self.phonemes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.phonemes.is_empty()
    }
    pub fn contains(&self, phoneme: &str) -> bool {
        self.phonemes.contains(phoneme)
    }
    pub fn is_valid(&self, transcription: &str) -> bool {
        let mut phonemes = transcription.split_whitespace().peekable();
        phonemes.peek().is_some() && phonemes.all(|phoneme| self.contains(phoneme))
    }
    /// Splits rows into those with valid and those with invalid transcriptions.
    pub fn partition<'a>(&self, rows: &'a [LexiconRow]) -> (Vec<&'a LexiconRow>, Vec<&'a LexiconRow>) {
        rows.iter().partition(|row| {
            let valid = self.is_valid(&row.transcription);
            if !valid {
                debug!(wordform = row.wordform.as_str(), transcription = row.transcription.as_str(), "invalid phonemes");
            }
            valid
        })
    }
}
