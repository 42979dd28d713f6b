use std::io::Write;

use concept_extract::{ConceptExtractor, MAX_CONCEPT_LEN};

fn cuisine_extractor() -> ConceptExtractor {
    ConceptExtractor::from_phrases([
        "Indian",
        "Thai",
        "Sushi",
        "Caribbean",
        "Italian",
        "West Indian",
        "Pub",
        "East Asian",
        "BBQ",
        "Chinese",
        "Portuguese",
        "Spanish",
        "French",
        "East European",
    ])
}

#[test]
fn single_match_keeps_original_casing() {
    let extractor = cuisine_extractor();
    assert_eq!(extractor.get("I would like some thai food"), ["Thai"]);
    assert_eq!(extractor.get("Where can I find good sushi"), ["Sushi"]);
}

#[test]
fn no_match_yields_empty_result() {
    let extractor = cuisine_extractor();
    assert!(extractor.get("Find me a place that does tapas").is_empty());
    assert!(extractor.get("What is the weather like today").is_empty());
}

#[test]
fn multi_word_concept_matches_whole() {
    let extractor = cuisine_extractor();
    assert_eq!(
        extractor.get("Which restaurants do East Asian food"),
        ["East Asian"]
    );
}

#[test]
fn overlapping_concepts_are_all_reported() {
    let extractor = cuisine_extractor();
    // "West Indian" starts at "west"; "Indian" starts one word later.
    assert_eq!(
        extractor.get("Which restaurants do West Indian food"),
        ["West Indian", "Indian"]
    );
}

#[test]
fn same_start_word_emits_shorter_before_longer() {
    let extractor = ConceptExtractor::from_phrases(["East", "East Asian"]);
    assert_eq!(
        extractor.get("do East Asian food"),
        ["East", "East Asian"]
    );
}

#[test]
fn first_word_alone_is_not_a_match() {
    let extractor = ConceptExtractor::from_phrases(["West Indian"]);
    assert!(extractor.get("Heading west on the motorway").is_empty());
    assert!(extractor.get("The west wing of the indian embassy").is_empty());
}

#[test]
fn matching_is_case_insensitive() {
    let extractor = cuisine_extractor();
    assert_eq!(extractor.get("wEsT iNdIaN"), ["West Indian", "Indian"]);
    assert_eq!(extractor.get("THAI FOOD PLEASE"), ["Thai"]);
}

#[test]
fn punctuation_does_not_break_matches() {
    let extractor = cuisine_extractor();
    assert_eq!(extractor.get("thai, food!"), ["Thai"]);
    assert_eq!(extractor.get(" West   Indian ? "), ["West Indian", "Indian"]);
}

#[test]
fn duplicate_occurrences_are_reported_each_time() {
    let extractor = cuisine_extractor();
    assert_eq!(extractor.get("sushi then more sushi"), ["Sushi", "Sushi"]);
}

#[test]
fn empty_and_punctuation_only_inputs_are_fine() {
    let extractor = cuisine_extractor();
    assert!(extractor.get("").is_empty());
    assert!(extractor.get(" ,;.!? ").is_empty());
}

#[test]
fn reregistering_a_concept_does_not_duplicate_matches() {
    let extractor = ConceptExtractor::from_phrases(["Thai", "Thai"]);
    assert_eq!(extractor.get("some thai food"), ["Thai"]);
}

#[test]
fn loads_concepts_from_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "Thai").unwrap();
    writeln!(file).unwrap();
    writeln!(file, "West Indian").unwrap();
    writeln!(file, "   ").unwrap();
    writeln!(file, "Sushi").unwrap();

    let extractor = ConceptExtractor::from_file(file.path()).expect("load concept list");
    assert_eq!(
        extractor.get("west indian or thai or sushi"),
        ["West Indian", "Thai", "Sushi"]
    );
}

#[test]
fn file_loader_rejects_overlong_and_non_ascii_lines() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "{}", "x".repeat(MAX_CONCEPT_LEN + 1)).unwrap();
    writeln!(file, "crème brûlée").unwrap();
    writeln!(file, "BBQ").unwrap();

    let extractor = ConceptExtractor::from_file(file.path()).expect("load concept list");
    let long_input = "x".repeat(MAX_CONCEPT_LEN + 1);
    assert!(extractor.get(&long_input).is_empty());
    assert_eq!(extractor.get("some bbq tonight"), ["BBQ"]);
}

#[test]
fn missing_file_is_an_error() {
    assert!(ConceptExtractor::from_file("/no/such/concepts.txt").is_err());
}
