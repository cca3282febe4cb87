//! Dependency-graph detectors: cyclic dependencies and dense structure.
//!
//! Each invocation builds its own [`DependencyGraph`] from the tree and
//! drops it on return.

use crate::analysis::graph::{DependencyGraph, EdgeKind};
use crate::analysis::model::Span;
use crate::error::DetectorError;

use super::detector::{distinct_types, DetectionContext, Detector};
use super::types::{tiered_severity, ArchitecturalDefect, DefectType, Severity};

/// Severity of a cycle by the number of types in it.
fn cycle_severity(length: usize) -> Severity {
    match length {
        0 | 1 => Severity::Low,
        2 => Severity::Medium,
        3 | 4 => Severity::High,
        _ => Severity::Critical,
    }
}

/// Structural cycles among the module's types.
pub struct CyclicDependencyDetector;

impl Detector for CyclicDependencyDetector {
    fn name(&self) -> &'static str {
        "cyclic-dependency"
    }

    fn detectable_types(&self) -> &'static [DefectType] {
        &[DefectType::CyclicDependency]
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<ArchitecturalDefect>, DetectorError> {
        let graph = DependencyGraph::build(ctx.tree);

        let defects = graph
            .structural_cycles()
            .into_iter()
            .filter_map(|cycle| {
                let first = cycle.first()?;
                let last_line = cycle.iter().map(|n| n.line).max().unwrap_or(first.line);
                let message = if cycle.len() == 1 {
                    format!("type '{}' depends on itself", first.name)
                } else {
                    let mut names: Vec<&str> = cycle.iter().map(|n| n.name.as_str()).collect();
                    names.push(&first.name);
                    format!(
                        "cyclic dependency between {} types: {}",
                        cycle.len(),
                        names.join(" -> ")
                    )
                };
                Some(ArchitecturalDefect::new(
                    DefectType::CyclicDependency,
                    cycle_severity(cycle.len()),
                    message,
                    ctx.location(Span::new(first.line, last_line)),
                ))
            })
            .collect();

        Ok(defects)
    }
}

/// Hub types that reference too many sibling types through their fields.
pub struct DenseStructureDetector;

impl Detector for DenseStructureDetector {
    fn name(&self) -> &'static str {
        "dense-structure"
    }

    fn detectable_types(&self) -> &'static [DefectType] {
        &[DefectType::DenseStructure]
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<ArchitecturalDefect>, DetectorError> {
        let limit = ctx.thresholds.dependency_smells.dense_structure_max_degree;
        let graph = DependencyGraph::build(ctx.tree);
        let others = graph.node_count().saturating_sub(1);
        let mut defects = Vec::new();

        for decl in distinct_types(ctx.tree) {
            let referenced = graph.dependencies_of(&decl.name, &[EdgeKind::FieldType]);
            let degree = referenced.len();
            if let Some(severity) = tiered_severity(degree, limit) {
                let listed: Vec<&str> = referenced.iter().map(String::as_str).collect();
                defects.push(ctx.defect(
                    DefectType::DenseStructure,
                    severity,
                    format!(
                        "type '{}' directly references {} of {} other types in the module ({}), exceeds maximum of {}",
                        decl.name,
                        degree,
                        others,
                        listed.join(", "),
                        limit
                    ),
                    decl,
                ));
            }
        }

        Ok(defects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::model::{Declaration, DeclarationKind, DeclarationTree};
    use crate::thresholds::Thresholds;

    fn hub(tree: &mut DeclarationTree, name: &str, line: usize, fields: &[&str]) {
        let id = tree.add(
            Declaration::new(name, DeclarationKind::Class).with_span(line, line + 3),
            None,
        );
        for (i, field) in fields.iter().enumerate() {
            tree.add(
                Declaration::new(format!("f{}", i), DeclarationKind::Variable)
                    .with_type_refs([*field]),
                Some(id),
            );
        }
    }

    fn run(detector: &dyn Detector, tree: &DeclarationTree, thresholds: &Thresholds) -> Vec<ArchitecturalDefect> {
        let ctx = DetectionContext::new(tree, "Graph.swift", thresholds);
        detector.detect(&ctx).unwrap()
    }

    #[test]
    fn test_two_and_three_node_cycles() {
        let mut tree = DeclarationTree::new();
        hub(&mut tree, "A", 1, &["B"]);
        hub(&mut tree, "B", 10, &["A"]);
        hub(&mut tree, "X", 20, &["Y"]);
        hub(&mut tree, "Y", 30, &["Z"]);
        hub(&mut tree, "Z", 40, &["X"]);

        let defects = run(&CyclicDependencyDetector, &tree, &Thresholds::default());
        assert_eq!(defects.len(), 2);
        assert_eq!(defects[0].severity, Severity::Medium);
        assert!(defects[0].message.contains("A -> B -> A"));
        assert_eq!(defects[1].severity, Severity::High);
        assert!(defects[1].message.contains("X -> Y -> Z -> X"));
    }

    #[test]
    fn test_acyclic_module_has_no_cycles() {
        let mut tree = DeclarationTree::new();
        hub(&mut tree, "A", 1, &["B", "C"]);
        hub(&mut tree, "B", 10, &["C"]);
        hub(&mut tree, "C", 20, &[]);
        assert!(run(&CyclicDependencyDetector, &tree, &Thresholds::default()).is_empty());
    }

    #[test]
    fn test_cycle_severity_grows_with_length() {
        let tiers: Vec<_> = (1..=6).map(cycle_severity).collect();
        assert!(tiers.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(cycle_severity(5), Severity::Critical);
    }

    #[test]
    fn test_dense_structure_scenario() {
        let siblings = ["S1", "S2", "S3", "S4", "S5", "S6"];
        let mut tree = DeclarationTree::new();
        hub(&mut tree, "Hub", 1, &siblings);
        for (i, s) in siblings.iter().enumerate() {
            hub(&mut tree, s, 10 + i * 5, &[]);
        }

        let mut thresholds = Thresholds::default();
        thresholds.dependency_smells.dense_structure_max_degree = 4;

        let defects = run(&DenseStructureDetector, &tree, &thresholds);
        assert_eq!(defects.len(), 1);
        assert_eq!(defects[0].defect_type, DefectType::DenseStructure);
        assert!(defects[0].message.contains("'Hub' directly references 6 of 6"));
    }

    #[test]
    fn test_sparse_module_is_not_dense() {
        let mut tree = DeclarationTree::new();
        hub(&mut tree, "A", 1, &["B", "C"]);
        hub(&mut tree, "B", 10, &["C"]);
        hub(&mut tree, "C", 20, &[]);

        let mut thresholds = Thresholds::default();
        thresholds.dependency_smells.dense_structure_max_degree = 4;
        assert!(run(&DenseStructureDetector, &tree, &thresholds).is_empty());
    }
}
