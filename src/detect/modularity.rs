//! Module-level detectors: missing abstraction, insufficient modularization,
//! unstructured modules and weakened modularity.

use std::collections::BTreeSet;

use phf::{phf_map, phf_set};

use crate::analysis::model::{DeclarationKind, Span};
use crate::error::DetectorError;

use super::detector::{DetectionContext, Detector};
use super::types::{tiered_severity, ArchitecturalDefect, DefectType};

/// Type-name suffix -> architectural layer. The longest matching suffix wins.
static LAYER_SUFFIXES: phf::Map<&'static str, &'static str> = phf_map! {
    "View" => "presentation",
    "Cell" => "presentation",
    "Screen" => "presentation",
    "Controller" => "presentation",
    "ViewController" => "presentation",
    "ViewModel" => "presentation logic",
    "Presenter" => "presentation logic",
    "Store" => "presentation logic",
    "Reducer" => "presentation logic",
    "Coordinator" => "navigation",
    "Router" => "navigation",
    "UseCase" => "domain",
    "Interactor" => "domain",
    "Service" => "domain",
    "Manager" => "domain",
    "Repository" => "data",
    "Storage" => "data",
    "Database" => "data",
    "Cache" => "data",
    "DAO" => "data",
    "Dao" => "data",
    "Client" => "networking",
    "API" => "networking",
    "Api" => "networking",
    "Endpoint" => "networking",
    "Request" => "networking",
    "Response" => "networking",
    "Model" => "model",
    "Entity" => "model",
    "DTO" => "model",
    "Dto" => "model",
};

/// Standard library and Foundation types that never count as coupling.
static PLATFORM_TYPES: phf::Set<&'static str> = phf_set! {
    "Any", "AnyObject", "Array", "Bool", "Character", "Codable", "Comparable",
    "CustomStringConvertible", "Data", "Date", "Decodable", "Dictionary", "Double",
    "Encodable", "Equatable", "Error", "Float", "Hashable", "Identifiable", "Int",
    "Int8", "Int16", "Int32", "Int64", "Never", "Optional", "Result", "Self",
    "Sendable", "Set", "String", "Substring", "UInt", "UInt8", "UInt16", "UInt32",
    "UInt64", "Void", "CGFloat", "CGPoint", "CGRect", "CGSize", "TimeInterval",
    "URL", "URLRequest", "URLSession", "UUID", "NSObject", "NSError", "Bundle",
    "DispatchQueue", "FileManager", "JSONDecoder", "JSONEncoder", "NotificationCenter",
    "UserDefaults", "Task", "MainActor", "CaseIterable", "RawRepresentable",
    "Sequence", "Collection", "Range", "ClosedRange",
};

/// Layer a type belongs to, judged by its name suffix.
pub(crate) fn layer_of(type_name: &str) -> Option<&'static str> {
    LAYER_SUFFIXES
        .entries()
        .filter(|(suffix, _)| type_name.ends_with(*suffix))
        .max_by_key(|(suffix, _)| suffix.len())
        .map(|(_, layer)| *layer)
}

pub(crate) fn is_platform_type(name: &str) -> bool {
    PLATFORM_TYPES.contains(name)
}

/// Too many top-level variables, functions and type aliases outside any type.
pub struct MissingAbstractionDetector;

impl Detector for MissingAbstractionDetector {
    fn name(&self) -> &'static str {
        "missing-abstraction"
    }

    fn detectable_types(&self) -> &'static [DefectType] {
        &[DefectType::MissingAbstraction]
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<ArchitecturalDefect>, DetectorError> {
        ctx.require_valid_tree()?;
        let limit = ctx.thresholds.module_smells.missing_abstraction_max_elements;

        let free: Vec<Span> = ctx
            .tree
            .iter()
            .filter(|(id, d)| {
                let loose = match d.kind {
                    DeclarationKind::Variable
                    | DeclarationKind::Function
                    | DeclarationKind::TypeAlias => true,
                    DeclarationKind::Class
                    | DeclarationKind::Struct
                    | DeclarationKind::Enum
                    | DeclarationKind::Protocol
                    | DeclarationKind::Actor
                    | DeclarationKind::Extension => false,
                };
                loose && !ctx.tree.is_nested(*id)
            })
            .map(|(_, d)| d.span)
            .collect();

        let Some(severity) = tiered_severity(free.len(), limit) else {
            return Ok(Vec::new());
        };

        let start = free.iter().map(|s| s.start_line).min().unwrap_or(1);
        let end = free.iter().map(|s| s.end_line).max().unwrap_or(start);
        Ok(vec![ArchitecturalDefect::new(
            DefectType::MissingAbstraction,
            severity,
            format!(
                "module has {} unencapsulated top-level elements (variables, functions, type aliases), exceeds maximum of {}",
                free.len(),
                limit
            ),
            ctx.location(Span::new(start, end)),
        )])
    }
}

/// Files with too many declarations or lines.
pub struct InsufficientModularizationDetector;

impl Detector for InsufficientModularizationDetector {
    fn name(&self) -> &'static str {
        "insufficient-modularization"
    }

    fn detectable_types(&self) -> &'static [DefectType] {
        &[DefectType::InsufficientModularization]
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<ArchitecturalDefect>, DetectorError> {
        let limits = &ctx.thresholds.module_smells;
        let declarations = ctx.tree.len();
        let lines = ctx.tree.line_count;

        let severity = [
            tiered_severity(declarations, limits.max_declarations_per_file),
            tiered_severity(lines, limits.max_lines_per_file),
        ]
        .into_iter()
        .flatten()
        .max();

        let Some(severity) = severity else {
            return Ok(Vec::new());
        };

        Ok(vec![ArchitecturalDefect::new(
            DefectType::InsufficientModularization,
            severity,
            format!(
                "file has {} declarations (max {}) and {} lines (max {})",
                declarations, limits.max_declarations_per_file, lines, limits.max_lines_per_file
            ),
            ctx.file_location(),
        )])
    }
}

/// Files that mix more architectural layers than allowed.
pub struct UnstructuredModuleDetector;

impl Detector for UnstructuredModuleDetector {
    fn name(&self) -> &'static str {
        "unstructured-module"
    }

    fn detectable_types(&self) -> &'static [DefectType] {
        &[DefectType::UnstructuredModule]
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<ArchitecturalDefect>, DetectorError> {
        ctx.require_valid_tree()?;
        let limits = &ctx.thresholds.module_smells;

        let mut layers: BTreeSet<&'static str> = BTreeSet::new();
        let mut free_elements = 0;
        for (id, decl) in ctx.tree.top_level() {
            if ctx.tree.is_nested(id) {
                continue;
            }
            match decl.kind {
                DeclarationKind::Class
                | DeclarationKind::Struct
                | DeclarationKind::Enum
                | DeclarationKind::Protocol
                | DeclarationKind::Actor
                | DeclarationKind::Extension => {
                    if let Some(layer) = layer_of(&decl.name) {
                        layers.insert(layer);
                    }
                }
                DeclarationKind::Function | DeclarationKind::Variable => free_elements += 1,
                DeclarationKind::TypeAlias => {}
            }
        }
        if free_elements > 0 && free_elements >= limits.unstructured_utility_min_elements {
            layers.insert("utility");
        }

        let Some(severity) = tiered_severity(layers.len(), limits.max_layers_per_module) else {
            return Ok(Vec::new());
        };

        let listed: Vec<_> = layers.iter().copied().collect();
        Ok(vec![ArchitecturalDefect::new(
            DefectType::UnstructuredModule,
            severity,
            format!(
                "module mixes {} layers ({}), exceeds maximum of {}",
                layers.len(),
                listed.join(", "),
                limits.max_layers_per_module
            ),
            ctx.file_location(),
        )])
    }
}

/// Modules whose type references mostly point at types declared elsewhere.
pub struct WeakenedModularityDetector;

impl Detector for WeakenedModularityDetector {
    fn name(&self) -> &'static str {
        "weakened-modularity"
    }

    fn detectable_types(&self) -> &'static [DefectType] {
        &[DefectType::WeakenedModularity]
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<ArchitecturalDefect>, DetectorError> {
        let limits = &ctx.thresholds.module_smells;
        let tree = ctx.tree;

        let mut internal = 0usize;
        let mut external = 0usize;
        let mut count = |name: &str| {
            if is_platform_type(name) {
                return;
            }
            if tree.declares_type(name) {
                internal += 1;
            } else {
                external += 1;
            }
        };

        for (_, decl) in tree.iter() {
            for name in decl.supertypes.iter().chain(decl.type_refs.iter()) {
                count(name);
            }
            if let Some(body) = &decl.body {
                for name in &body.constructed_types {
                    count(name);
                }
                for access in &body.member_accesses {
                    if let Some(name) = access.base.type_name() {
                        count(name);
                    }
                }
            }
        }

        let total = internal + external;
        if total == 0 || total < limits.weakened_modularity_min_references {
            return Ok(Vec::new());
        }
        let percent = external * 100 / total;
        let Some(severity) =
            tiered_severity(percent, limits.weakened_modularity_max_external_percent)
        else {
            return Ok(Vec::new());
        };

        Ok(vec![ArchitecturalDefect::new(
            DefectType::WeakenedModularity,
            severity,
            format!(
                "{} of {} type references ({}%) point outside the module, exceeds maximum of {}%",
                external, total, percent, limits.weakened_modularity_max_external_percent
            ),
            ctx.file_location(),
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::model::{Declaration, DeclarationTree};
    use crate::detect::types::Severity;
    use crate::thresholds::Thresholds;

    fn run_with(
        detector: &dyn Detector,
        tree: &DeclarationTree,
        thresholds: &Thresholds,
    ) -> Vec<ArchitecturalDefect> {
        let ctx = DetectionContext::new(tree, "Module.swift", thresholds);
        detector.detect(&ctx).unwrap()
    }

    fn loose_elements(tree: &mut DeclarationTree, count: usize) {
        for i in 0..count {
            let kind = match i % 3 {
                0 => DeclarationKind::Variable,
                1 => DeclarationKind::Function,
                _ => DeclarationKind::TypeAlias,
            };
            tree.add(
                Declaration::new(format!("element{}", i), kind).with_span(i + 1, i + 1),
                None,
            );
        }
    }

    #[test]
    fn test_missing_abstraction_scenario() {
        let mut tree = DeclarationTree::new();
        loose_elements(&mut tree, 25);
        // members of a type are encapsulated and do not count
        let t = tree.add(Declaration::new("Box", DeclarationKind::Struct), None);
        tree.add(Declaration::new("value", DeclarationKind::Variable), Some(t));

        let mut thresholds = Thresholds::default();
        thresholds.module_smells.missing_abstraction_max_elements = 20;

        let defects = run_with(&MissingAbstractionDetector, &tree, &thresholds);
        assert_eq!(defects.len(), 1);
        assert_eq!(defects[0].defect_type, DefectType::MissingAbstraction);
        assert_eq!(defects[0].severity, Severity::Medium);
        assert!(defects[0].message.contains("25"));
        assert!(defects[0].message.contains("20"));
    }

    #[test]
    fn test_missing_abstraction_at_threshold() {
        let mut tree = DeclarationTree::new();
        loose_elements(&mut tree, 20);
        let mut thresholds = Thresholds::default();
        thresholds.module_smells.missing_abstraction_max_elements = 20;
        assert!(run_with(&MissingAbstractionDetector, &tree, &thresholds).is_empty());
    }

    #[test]
    fn test_insufficient_modularization() {
        let mut tree = DeclarationTree::new();
        tree.line_count = 1300;
        let defects = run_with(
            &InsufficientModularizationDetector,
            &tree,
            &Thresholds::default(),
        );
        assert_eq!(defects.len(), 1);
        assert_eq!(defects[0].severity, Severity::High);
        assert!(defects[0].message.contains("1300 lines"));
    }

    #[test]
    fn test_layer_suffixes_prefer_longest_match() {
        assert_eq!(layer_of("LoginViewModel"), Some("presentation logic"));
        assert_eq!(layer_of("LoginViewController"), Some("presentation"));
        assert_eq!(layer_of("UserRepository"), Some("data"));
        assert_eq!(layer_of("Helpers"), None);
    }

    #[test]
    fn test_unstructured_module() {
        let mut tree = DeclarationTree::new();
        for name in ["ProfileView", "ProfileViewModel", "ProfileRepository"] {
            tree.add(Declaration::new(name, DeclarationKind::Class), None);
        }
        let defects = run_with(&UnstructuredModuleDetector, &tree, &Thresholds::default());
        assert_eq!(defects.len(), 1);
        assert!(defects[0].message.contains("3 layers"));

        let mut layered = DeclarationTree::new();
        layered.add(Declaration::new("ProfileView", DeclarationKind::Struct), None);
        layered.add(Declaration::new("ProfileViewModel", DeclarationKind::Class), None);
        loose_elements(&mut layered, 2);
        assert!(run_with(&UnstructuredModuleDetector, &layered, &Thresholds::default()).is_empty());
    }

    #[test]
    fn test_free_functions_form_utility_layer() {
        let mut tree = DeclarationTree::new();
        tree.add(Declaration::new("ProfileView", DeclarationKind::Struct), None);
        tree.add(Declaration::new("ProfileService", DeclarationKind::Class), None);
        for i in 0..5 {
            tree.add(
                Declaration::new(format!("helper{}", i), DeclarationKind::Function),
                None,
            );
        }
        let defects = run_with(&UnstructuredModuleDetector, &tree, &Thresholds::default());
        assert_eq!(defects.len(), 1);
        assert!(defects[0].message.contains("utility"));
    }

    #[test]
    fn test_weakened_modularity() {
        let mut tree = DeclarationTree::new();
        let local = tree.add(Declaration::new("Cart", DeclarationKind::Struct), None);
        for i in 0..11 {
            tree.add(
                Declaration::new(format!("dep{}", i), DeclarationKind::Variable)
                    .with_type_refs([format!("Remote{}", i), "String".to_string()]),
                Some(local),
            );
        }

        let defects = run_with(&WeakenedModularityDetector, &tree, &Thresholds::default());
        assert_eq!(defects.len(), 1);
        assert!(defects[0].message.contains("11 of 11"));

        // below the reference minimum the ratio is not meaningful
        let mut small = DeclarationTree::new();
        small.add(
            Declaration::new("x", DeclarationKind::Variable).with_type_refs(["Remote"]),
            None,
        );
        assert!(run_with(&WeakenedModularityDetector, &small, &Thresholds::default()).is_empty());
    }
}
