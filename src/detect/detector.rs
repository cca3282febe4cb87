//! Shared interface implemented by every detector.

use crate::analysis::model::{Declaration, DeclarationTree, Span};
use crate::error::DetectorError;
use crate::thresholds::Thresholds;

use super::types::{ArchitecturalDefect, DefectType, Location, Severity};
use super::{abstraction, classes, dependencies, duplicates, hierarchy, methods, modularity};

/// Everything a detector may read. Nothing here is mutable.
#[derive(Debug, Clone, Copy)]
pub struct DetectionContext<'a> {
    pub tree: &'a DeclarationTree,
    pub file: &'a str,
    pub thresholds: &'a Thresholds,
}

impl<'a> DetectionContext<'a> {
    pub fn new(tree: &'a DeclarationTree, file: &'a str, thresholds: &'a Thresholds) -> Self {
        Self {
            tree,
            file,
            thresholds,
        }
    }

    pub fn location(&self, span: Span) -> Location {
        Location::new(self.file, span)
    }

    /// Location covering the whole file.
    pub fn file_location(&self) -> Location {
        self.location(Span::new(1, self.tree.line_count.max(1)))
    }

    pub fn defect(
        &self,
        defect_type: DefectType,
        severity: Severity,
        message: impl Into<String>,
        decl: &Declaration,
    ) -> ArchitecturalDefect {
        ArchitecturalDefect::new(defect_type, severity, message, self.location(decl.span))
    }

    /// Fail when the tree has a declaration whose parent handle does not resolve.
    pub fn require_valid_tree(&self) -> Result<(), DetectorError> {
        self.tree
            .validate()
            .map_err(DetectorError::DanglingDeclaration)
    }
}

/// A single smell analysis over one declaration tree.
///
/// Detectors are stateless between invocations: anything derived from the
/// tree (such as a dependency graph) is built inside `detect` and dropped
/// when it returns.
pub trait Detector: Send + Sync {
    /// Short name used in logs and skipped-detector reports.
    fn name(&self) -> &'static str;

    /// Defect types this detector may emit.
    fn detectable_types(&self) -> &'static [DefectType];

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<ArchitecturalDefect>, DetectorError>;
}

/// Declared types, first declaration per name, in declaration order.
pub(crate) fn distinct_types(tree: &DeclarationTree) -> Vec<&Declaration> {
    let mut seen = std::collections::HashSet::new();
    tree.types()
        .filter(|(_, d)| seen.insert(d.name.as_str()))
        .map(|(_, d)| d)
        .collect()
}

/// Supertypes of a type across its declaration and same-file extensions.
pub(crate) fn supertypes_of<'t>(tree: &'t DeclarationTree, name: &str) -> Vec<&'t str> {
    let mut out: Vec<&str> = Vec::new();
    for id in tree.type_parts(name) {
        if let Some(part) = tree.get(id) {
            for s in &part.supertypes {
                if !out.contains(&s.as_str()) {
                    out.push(s);
                }
            }
        }
    }
    out
}

/// The closed, ordered detector set. Output order follows this order.
pub fn default_detectors() -> Vec<Box<dyn Detector>> {
    vec![
        Box::new(classes::GodClassDetector),
        Box::new(classes::MassiveControllerDetector),
        Box::new(abstraction::MultifacetedAbstractionDetector),
        Box::new(abstraction::UnnecessaryAbstractionDetector),
        Box::new(abstraction::ImperativeAbstractionDetector),
        Box::new(modularity::MissingAbstractionDetector),
        Box::new(modularity::InsufficientModularizationDetector),
        Box::new(duplicates::DuplicateBlockDetector),
        Box::new(hierarchy::BrokenHierarchyDetector),
        Box::new(modularity::UnstructuredModuleDetector),
        Box::new(dependencies::DenseStructureDetector),
        Box::new(abstraction::DeficientEncapsulationDetector),
        Box::new(modularity::WeakenedModularityDetector),
        Box::new(methods::LongMethodDetector),
        Box::new(classes::LazyClassDetector),
        Box::new(classes::DataClassDetector),
        Box::new(methods::MessageChainDetector),
        Box::new(methods::FeatureEnvyDetector),
        Box::new(dependencies::CyclicDependencyDetector),
    ]
}
