use lexupdater::Constraint;
use lexupdater::condition::{JoinPrefix, compile_condition};

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

#[test]
fn no_constraints_and_no_exemptions_is_no_restriction() {
    let condition = compile_condition(&[], &[], None);
    assert!(condition.is_empty());
    assert_eq!(condition.fragment(), "");
    assert!(condition.values().is_empty());

    // a prefix never dangles in front of an empty fragment
    let prefixed = compile_condition(&[], &[], Some(JoinPrefix::Where));
    assert_eq!(prefixed.sql(), "");
}

#[test]
fn constraints_become_comparisons_in_order() {
    let constraints = vec![
        Constraint::exact("pos", "NN").expect("constraint"),
        Constraint::regex("feats", "MAS").expect("constraint"),
    ];
    let condition = compile_condition(&constraints, &[], None);
    assert_eq!(condition.fragment(), "w.pos = ? AND w.feats REGEXP ?");
    assert_eq!(condition.values(), &["NN".to_string(), "MAS".to_string()]);
}

#[test]
fn exempt_words_become_one_not_in_list() {
    let condition = compile_condition(&[], &words(&["garn", "klarne", "barn"]), None);
    assert_eq!(condition.fragment(), "w.wordform NOT IN (?, ?, ?)");
    assert_eq!(condition.values(), &words(&["garn", "klarne", "barn"]));
}

#[test]
fn constraint_values_come_before_exempt_words() {
    let constraints = vec![
        Constraint::regex("feats", "MAS").expect("constraint"),
        Constraint::exact("pos", "NN").expect("constraint"),
    ];
    let condition = compile_condition(&constraints, &words(&["søknader"]), Some(JoinPrefix::And));
    assert_eq!(
        condition.sql(),
        " AND w.feats REGEXP ? AND w.pos = ? AND w.wordform NOT IN (?)"
    );
    assert_eq!(condition.values(), &words(&["MAS", "NN", "søknader"]));
}

#[test]
fn placeholders_always_match_values() {
    let constraints = vec![
        Constraint::exact("pos", "NN").expect("constraint"),
        Constraint::regex("source", "^nst").expect("constraint"),
        Constraint::exact("lemma", "what?").expect("constraint"),
    ];
    let exempt = words(&["a", "b", "c", "d"]);
    for constraint_count in 0..=constraints.len() {
        for exempt_count in 0..=exempt.len() {
            let condition =
                compile_condition(&constraints[..constraint_count], &exempt[..exempt_count], None);
            assert_eq!(condition.placeholder_count(), condition.values().len());
            assert_eq!(condition.values().len(), constraint_count + exempt_count);
        }
    }
}

#[test]
fn values_never_appear_in_the_fragment() {
    let constraints = vec![Constraint::exact("pos", "NN' OR 1=1 --").expect("constraint")];
    let condition = compile_condition(&constraints, &words(&["o'neil"]), Some(JoinPrefix::Where));
    assert!(!condition.sql().contains("OR 1=1"));
    assert!(!condition.sql().contains("o'neil"));
    assert_eq!(condition.sql(), " WHERE w.pos = ? AND w.wordform NOT IN (?)");
}

#[test]
fn unknown_fields_are_rejected() {
    assert!(Constraint::exact("pos; drop table words", "NN").is_err());
    assert!(Constraint::regex("nofabet", "X").is_err());
}
