use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use rusqlite::Connection;
use serde_json::Value;
use tracing::{error, info, warn};

use lexupdater::report::{self, PhonemeInventory};
use lexupdater::schema::as_list;
use lexupdater::{
    Dialect, LexError, LexiconRow, NewWord, Result, RunMode, Settings, TrackedRules, Updater,
    Validator, logging,
};

fn read_json(path: &Path) -> Result<Value> {
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}

fn write_lexica(
    output_dir: &Path,
    lexicon: &BTreeMap<Dialect, Vec<LexiconRow>>,
    inventory: Option<&PhonemeInventory>,
) -> Result<()> {
    for (dialect, rows) in lexicon {
        report::write_lexicon(&report::lexicon_path(output_dir, *dialect), rows)?;
        if let Some(inventory) = inventory {
            let (_, invalid) = inventory.partition(rows);
            if !invalid.is_empty() {
                warn!(%dialect, rows = invalid.len(), "transcriptions with unknown phonemes");
                let invalid: Vec<LexiconRow> = invalid.into_iter().cloned().collect();
                report::write_lexicon(&report::invalid_path(output_dir, *dialect), &invalid)?;
            }
        }
    }
    Ok(())
}

fn run(settings_file: Option<&Path>) -> Result<()> {
    let settings = Settings::load(settings_file)?;
    logging::init(&settings.log_filter)?;
    let run_config = settings.run_config();
    let dialects = run_config.dialects.as_slice();
    info!(mode = ?settings.mode, dialects = dialects.len(), "starting lexupdater");

    let validator = Validator::new(settings.validation);
    let exemptions = validator.exemptions(as_list("exemptions", &read_json(&settings.exemptions_file)?)?)?;
    let rulesets = validator
        .rulesets_with_exemptions(as_list("rule sets", &read_json(&settings.rules_file)?)?, &exemptions)?;
    let new_words: Vec<NewWord> = match &settings.new_words_file {
        Some(path) => serde_json::from_value(read_json(path)?)?,
        None => Vec::new(),
    };
    let inventory = settings
        .phoneme_inventory
        .as_deref()
        .map(PhonemeInventory::load)
        .transpose()?;
    info!(rulesets = rulesets.len(), exemptions = exemptions.len(), new_words = new_words.len(), "loaded rules");

    if !settings.database.is_file() {
        return Err(LexError::Config(format!(
            "database {} does not exist",
            settings.database.display()
        )));
    }
    let output_dir = settings.output_dir.as_path();
    fs::create_dir_all(output_dir)?;

    let mut updater = Updater::new(Connection::open(&settings.database)?, &run_config, &new_words)?;
    if settings.write_base {
        report::write_lexicon(&output_dir.join(report::BASE_FILE), &updater.snapshot().base_rows()?)?;
    }
    match settings.mode {
        RunMode::Apply => {
            let lexicon = updater.apply(&rulesets, dialects)?;
            write_lexica(output_dir, &lexicon, inventory.as_ref())?;
        }
        RunMode::Match => {
            let matches = updater.matching_rows(&rulesets, dialects);
            let prepared: Vec<Dialect> = dialects
                .iter()
                .copied()
                .filter(|dialect| updater.snapshot().contains(*dialect))
                .collect();
            report::write_match_files(output_dir, &prepared, &matches)?;
        }
        RunMode::Track => {
            let tracked: TrackedRules = settings.tracked.iter().collect();
            if tracked.is_empty() {
                warn!("tracking mode without tracked rules, no changes will be captured");
            }
            let changes = updater.apply_tracked(&rulesets, dialects, &tracked)?;
            report::write_changes(output_dir, &changes)?;
            write_lexica(output_dir, &updater.results(dialects)?, inventory.as_ref())?;
        }
    }

    for failure in updater.failures() {
        warn!(
            rule_id = failure.rule_id.as_str(),
            dialect = %failure.dialect,
            message = failure.message.as_str(),
            "statement was skipped"
        );
    }
    updater.close()?;
    info!(output = %output_dir.display(), "done");
    Ok(())
}

fn main() -> ExitCode {
    let settings_file = std::env::args_os().nth(1).map(PathBuf::from);
    match run(settings_file.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "lexupdater failed");
            eprintln!("lexupdater: {e}");
            ExitCode::FAILURE
        }
    }
}
