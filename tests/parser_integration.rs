//! Integration tests for the Swift front end against the fixtures.

use std::path::PathBuf;

use pretty_assertions::assert_eq;

use archsmell::analysis::{get_analyzer, DeclarationKind, LanguageAnalyzer, SwiftAnalyzer};

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata").join(name);
    std::fs::read_to_string(path).expect("fixture should exist")
}

#[test]
fn test_analyzer_lookup() {
    let analyzer = get_analyzer("swift").expect("swift analyzer");
    assert_eq!(analyzer.language_id(), "swift");
    assert!(analyzer.handles_extension("swift"));
    assert!(get_analyzer("kt").is_none());
}

#[test]
fn test_god_object_declarations() {
    let tree = SwiftAnalyzer::new()
        .parse(&fixture("GodObject.swift"), "GodObject.swift")
        .unwrap();

    assert_eq!(tree.imports, vec!["Foundation"]);
    assert!(tree.declares_type("AppManager"));
    let members = tree.members_of_type("AppManager");
    assert_eq!(members.methods.len(), 22);
    assert_eq!(members.stored_properties.len(), 2);
    assert_eq!(tree.line_count, 95);
}

#[test]
fn test_cycle_fixture_field_types() {
    let tree = SwiftAnalyzer::new()
        .parse(&fixture("Cycles.swift"), "Cycles.swift")
        .unwrap();

    let customer_field = tree
        .iter()
        .map(|(_, d)| d)
        .find(|d| d.name == "customer")
        .unwrap();
    assert_eq!(customer_field.kind, DeclarationKind::Variable);
    assert_eq!(customer_field.type_refs, vec!["Customer"]);

    let orders_field = tree.iter().map(|(_, d)| d).find(|d| d.name == "orders").unwrap();
    assert_eq!(orders_field.type_refs, vec!["Order"]);
}

#[test]
fn test_chain_fixture_bodies() {
    let tree = SwiftAnalyzer::new()
        .parse(&fixture("Chains.swift"), "Chains.swift")
        .unwrap();

    let line = tree.iter().map(|(_, d)| d).find(|d| d.name == "Line").unwrap();
    assert_eq!(line.supertypes, vec!["Shape"]);

    let city = tree.iter().map(|(_, d)| d).find(|d| d.name == "city").unwrap();
    let body = city.body.as_ref().unwrap();
    let longest = body.member_accesses.iter().map(|a| a.chain_length()).max();
    assert_eq!(longest, Some(5));
}

#[test]
fn test_broken_fixture_is_rejected() {
    let err = SwiftAnalyzer::new()
        .parse(&fixture("Broken.swift"), "Broken.swift")
        .unwrap_err();
    assert_eq!(err.path, "Broken.swift");
    assert!(err.to_string().starts_with("Broken.swift:"));
}
