#![allow(dead_code)]

use lexupdater::{Constraint, Dialect, LexiconRow, Rule, RuleSet, RunConfig, Updater};
use rusqlite::{Connection, params};
use serde_json::{Value, json};

/// (wordform, pos, feats, transcription)
pub const LEXICON: &[(&str, &str, &str, &str)] = &[
    ("garn", "NN", "NEU", "G AA1 RN"),
    ("barn", "NN", "NEU", "B AA1 RN"),
    ("lærer", "NN", "SIN|IND|MAS", "L AE1 R AX0 R"),
    ("hager", "NNS", "PLU|IND|MAS", "H AA1 G AX0 R"),
    ("vinter", "NN", "FEM", "V IH1 N T AX0 R"),
    ("søknader", "NN", "MAS", "S OE1 K N AA0 D AX0 R"),
    ("hane", "NN", "MAS", "H AA1 NX0 AX0"),
    ("kart", "NN", "NEU", "K AA1 RT"),
    ("klarne", "VB", "INF", "K L AA1 RN AX0"),
];

pub fn create_schema(connection: &Connection) {
    connection
        .execute_batch(
            "
            create table words (
                word_id integer primary key,
                wordform text not null,
                pos text,
                feats text,
                source text,
                unique_id text not null
            );
            create table base (
                pron_id integer primary key,
                nofabet text not null,
                certainty integer not null,
                unique_id text not null
            );
            ",
        )
        .expect("schema");
}

pub fn insert_word(connection: &Connection, unique_id: &str, wordform: &str, pos: &str, feats: &str, transcription: &str) {
    connection
        .execute(
            "insert into words (wordform, pos, feats, source, unique_id) values (?, ?, ?, 'fixture', ?)",
            params![wordform, pos, feats, unique_id],
        )
        .expect("word");
    connection
        .execute(
            "insert into base (nofabet, certainty, unique_id) values (?, 1, ?)",
            params![transcription, unique_id],
        )
        .expect("pronunciation");
}

/// In-memory store holding the fixture lexicon, one pronunciation per word.
pub fn lexicon_connection() -> Connection {
    let connection = Connection::open_in_memory().expect("in-memory db");
    create_schema(&connection);
    for (index, (wordform, pos, feats, transcription)) in LEXICON.iter().enumerate() {
        insert_word(&connection, &format!("w{index}"), wordform, pos, feats, transcription);
    }
    connection
}

pub fn updater(dialects: &[Dialect]) -> Updater {
    Updater::new(lexicon_connection(), &RunConfig::new(dialects.iter().copied()), &[]).expect("updater")
}

pub fn retrotest() -> RuleSet {
    RuleSet::new(
        "retrotest",
        [Dialect::ESpoken],
        [
            Rule::new(r"\b(R)([NTD])\b", r"\1 \2", vec![]).expect("rule"),
            Rule::new(r"\b(R)(NX0)\b", r"\1 AX0 N", vec![]).expect("rule"),
        ],
        vec!["garn".to_string(), "klarne".to_string()],
    )
    .expect("rule set")
}

fn masculine_constraints() -> Vec<Constraint> {
    vec![
        Constraint::exact("pos", "NN").expect("constraint"),
        Constraint::regex("feats", "MAS").expect("constraint"),
    ]
}

pub fn masc() -> RuleSet {
    RuleSet::new(
        "masc",
        [Dialect::NWritten, Dialect::SwSpoken],
        [
            Rule::new(r"\bAX0 R$", "AA0 R", masculine_constraints()).expect("rule"),
            Rule::new(r"\bNX0 AX0$", "AA0 N AX0", masculine_constraints()).expect("rule"),
        ],
        vec!["søknader".to_string()],
    )
    .expect("rule set")
}

pub fn retrotest_dict() -> Value {
    json!({
        "name": "retrotest",
        "areas": ["e_spoken"],
        "rules": [
            {"pattern": r"\b(R)([NTD])\b", "replacement": r"\1 \2", "constraints": []},
            {"pattern": r"\b(R)(NX0)\b", "replacement": r"\1 AX0 N", "constraints": []}
        ],
        "exempt_words": ["garn", "klarne"]
    })
}

pub fn transcription<'a>(rows: &'a [LexiconRow], wordform: &str) -> &'a str {
    rows.iter()
        .find(|row| row.wordform == wordform)
        .map(|row| row.transcription.as_str())
        .unwrap_or_else(|| panic!("no row for {wordform}"))
}
