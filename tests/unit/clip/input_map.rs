use super::*;

fn names(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

#[test]
fn declared_ordering_is_identity() {
    let m = InputMap::new(names(&["Source", "Mask"]), InputOrdering::Declared).unwrap();
    assert_eq!(m.input_index("Source"), Some(0));
    assert_eq!(m.input_index("Mask"), Some(1));
    assert_eq!(m.clip_name(1), Some("Mask"));
}

#[test]
fn reversed_ordering_matches_legacy_mapping() {
    let m = InputMap::new(names(&["A", "B", "C"]), InputOrdering::Reversed).unwrap();
    assert_eq!(m.input_index("A"), Some(2));
    assert_eq!(m.input_index("B"), Some(1));
    assert_eq!(m.input_index("C"), Some(0));
    assert_eq!(m.clip_name(0), Some("C"));
}

#[test]
fn both_orderings_are_bijections() {
    let clip_names = names(&["A", "B", "C", "D"]);
    for ordering in [InputOrdering::Declared, InputOrdering::Reversed] {
        let m = InputMap::new(clip_names.clone(), ordering).unwrap();
        let mut seen = vec![false; m.len()];
        for name in &clip_names {
            let i = m.input_index(name).unwrap();
            assert!(!seen[i], "{ordering:?}: input {i} mapped twice");
            seen[i] = true;
            assert_eq!(m.clip_name(i), Some(name.as_str()));
        }
        assert!(seen.iter().all(|&s| s));
    }
}

#[test]
fn unknown_names_and_indices_are_not_mapped() {
    let m = InputMap::new(names(&["Source"]), InputOrdering::Declared).unwrap();
    assert_eq!(m.input_index("Mask"), None);
    assert_eq!(m.clip_name(1), None);

    let empty = InputMap::new(Vec::new(), InputOrdering::Reversed).unwrap();
    assert!(empty.is_empty());
    assert_eq!(empty.input_index("Source"), None);
    assert_eq!(empty.clip_name(0), None);
}

#[test]
fn duplicate_names_are_rejected() {
    assert!(InputMap::new(names(&["A", "A"]), InputOrdering::Declared).is_err());
}
