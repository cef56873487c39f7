mod common;

use lexupdater::schema::as_list;
use lexupdater::{Dialect, LexError, ValidationMode, Validator};
use serde_json::json;

fn strict() -> Validator {
    Validator::new(ValidationMode::Strict)
}
fn tolerant() -> Validator {
    Validator::new(ValidationMode::Tolerant)
}

#[test]
fn well_formed_rule_set_is_accepted() {
    let ruleset = strict().ruleset(&common::retrotest_dict()).expect("valid rule set");
    assert_eq!(ruleset.name(), "retrotest");
    assert_eq!(ruleset.areas(), &[Dialect::ESpoken]);
    assert_eq!(ruleset.rules().len(), 2);
}

#[test]
fn extra_and_missing_keys_are_rejected() {
    let extra = json!({"pattern": "X", "replacement": "Y", "constraints": [], "comment": "no"});
    assert!(matches!(
        strict().rule(&extra),
        Err(LexError::Validation { entity: "rule", .. })
    ));
    let missing = json!({"pattern": "X"});
    assert!(strict().rule(&missing).is_err());
    let constraint = json!({"field": "pos", "pattern": "NN"});
    assert!(matches!(
        strict().constraint(&constraint),
        Err(LexError::Validation { entity: "constraint", .. })
    ));
}

#[test]
fn wrong_value_types_are_rejected() {
    let constraint = json!({"field": "pos", "pattern": "NN", "is_regex": "yes"});
    assert!(strict().constraint(&constraint).is_err());
    let ruleset = json!({"name": "x", "areas": "e_spoken", "rules": []});
    assert!(strict().ruleset(&ruleset).is_err());
}

#[test]
fn repl_is_accepted_for_replacement() {
    let rule = strict()
        .rule(&json!({"pattern": r"\bRN\b", "repl": "R N"}))
        .expect("valid rule");
    assert_eq!(rule.replacement(), "R N");
    assert!(rule.constraints().is_empty());
}

#[test]
fn unknown_areas_are_dropped() {
    let ruleset = strict()
        .ruleset(&json!({
            "name": "mixed",
            "areas": ["n_written", "x_spoken", "n_written", "e_spoken"],
            "rules": [{"pattern": "A", "replacement": "B"}]
        }))
        .expect("valid rule set");
    assert_eq!(ruleset.areas(), &[Dialect::NWritten, Dialect::ESpoken]);
    assert!(ruleset.exempt_words().is_empty());
}

#[test]
fn one_bad_rule_rejects_the_whole_rule_set_in_either_mode() {
    let document = json!({
        "name": "partly",
        "areas": ["e_spoken"],
        "rules": [
            {"pattern": "A", "replacement": "B"},
            {"pattern": "C", "replacement": "D", "extra": true},
            {"pattern": "E", "replacement": "F", "constraints": [{"field": "colour", "pattern": "x", "is_regex": false}]}
        ]
    });
    assert!(strict().ruleset(&document).is_err());
    assert!(tolerant().ruleset(&document).is_err());

    let documents = json!([common::retrotest_dict(), document, common::masc().to_dict()]);
    let list = as_list("rule sets", &documents).expect("list");
    let kept = tolerant().rulesets(list).expect("tolerant batch");
    let names: Vec<&str> = kept.iter().map(|r| r.name()).collect();
    assert_eq!(names, vec!["retrotest", "masc"]);
}

#[test]
fn rule_with_a_bad_constraint_never_runs_unconstrained() {
    let mut document = common::masc().to_dict();
    document["name"] = json!("masc_loose");
    document["rules"][0]["constraints"][0] = json!({"field": "pos", "pattern": "NN", "is_regex": "false"});
    assert!(tolerant().rule(&document["rules"][0]).is_err());

    let documents = json!([document]);
    let list = as_list("rule sets", &documents).expect("list");
    let kept = tolerant().rulesets(list).expect("tolerant batch");
    assert!(kept.is_empty());

    let mut updater = common::updater(&[Dialect::NWritten]);
    let lexicon = updater.apply(&kept, &[Dialect::NWritten]).expect("apply");
    assert_eq!(
        common::transcription(&lexicon[&Dialect::NWritten], "hager"),
        "H AA1 G AX0 R"
    );
}

#[test]
fn tolerant_batches_skip_invalid_rule_sets() {
    let documents = json!([
        common::retrotest_dict(),
        {"name": "broken", "rules": []},
        common::masc().to_dict()
    ]);
    let list = as_list("rule sets", &documents).expect("list");
    assert!(strict().rulesets(list).is_err());
    let kept = tolerant().rulesets(list).expect("tolerant batch");
    let names: Vec<&str> = kept.iter().map(|r| r.name()).collect();
    assert_eq!(names, vec!["retrotest", "masc"]);
}

#[test]
fn duplicate_names_fail_in_either_mode() {
    let documents = json!([common::retrotest_dict(), common::retrotest_dict()]);
    let list = as_list("rule sets", &documents).expect("list");
    assert!(matches!(
        tolerant().rulesets(list),
        Err(LexError::DuplicateRuleSet(_))
    ));
}

#[test]
fn exemptions_are_validated_and_attached() {
    let exemptions = json!([
        {"ruleset": "retrotest", "words": ["barn"]},
        {"ruleset": "retrotest", "words": ["kart"]},
        {"ruleset": "masc", "word": ["hane"]}
    ]);
    let list = as_list("exemptions", &exemptions).expect("list");
    assert!(strict().exemptions(list).is_err());
    let map = tolerant().exemptions(list).expect("tolerant exemptions");
    assert_eq!(map.len(), 1);
    assert_eq!(map.words_for("retrotest"), &["barn".to_string()]);

    let rulesets = json!([common::retrotest_dict()]);
    let attached = tolerant()
        .rulesets_with_exemptions(as_list("rule sets", &rulesets).expect("list"), &map)
        .expect("rule sets");
    assert_eq!(
        attached[0].exempt_words(),
        &["garn".to_string(), "klarne".to_string(), "barn".to_string()]
    );
}

#[test]
fn documents_must_be_lists() {
    assert!(as_list("rule sets", &json!({"name": "x"})).is_err());
}
