//! Type size detectors: god classes, massive controllers, lazy and data classes.
//!
//! Every metric is taken over the type merged with its same-file
//! extensions, so splitting a type across extensions does not hide it.

use crate::analysis::model::DeclarationKind;
use crate::error::DetectorError;

use super::abstraction::is_imperative_shaped;
use super::detector::{distinct_types, DetectionContext, Detector};
use super::types::{overage_ratio, tiered_severity, ArchitecturalDefect, DefectType, Severity};

/// Too many methods or stored properties.
pub struct GodClassDetector;

impl Detector for GodClassDetector {
    fn name(&self) -> &'static str {
        "god-class"
    }

    fn detectable_types(&self) -> &'static [DefectType] {
        &[DefectType::GodClass]
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<ArchitecturalDefect>, DetectorError> {
        let limits = &ctx.thresholds.class_smells;
        let mut defects = Vec::new();

        for decl in distinct_types(ctx.tree) {
            match decl.kind {
                DeclarationKind::Class
                | DeclarationKind::Struct
                | DeclarationKind::Actor
                | DeclarationKind::Enum => {}
                DeclarationKind::Protocol
                | DeclarationKind::Extension
                | DeclarationKind::Function
                | DeclarationKind::Variable
                | DeclarationKind::TypeAlias => continue,
            }

            let members = ctx.tree.members_of_type(&decl.name);
            let methods = members.methods.len();
            let properties = members.stored_properties.len();

            let severity = [
                tiered_severity(methods, limits.god_class_max_methods),
                tiered_severity(properties, limits.god_class_max_properties),
            ]
            .into_iter()
            .flatten()
            .max();

            if let Some(severity) = severity {
                defects.push(ctx.defect(
                    DefectType::GodClass,
                    severity,
                    format!(
                        "{} '{}' has {} methods (max {}) and {} stored properties (max {})",
                        decl.kind,
                        decl.name,
                        methods,
                        limits.god_class_max_methods,
                        properties,
                        limits.god_class_max_properties
                    ),
                    decl,
                ));
            }
        }

        Ok(defects)
    }
}

/// `*Controller` types whose declaration and extensions span too many lines.
pub struct MassiveControllerDetector;

impl Detector for MassiveControllerDetector {
    fn name(&self) -> &'static str {
        "massive-controller"
    }

    fn detectable_types(&self) -> &'static [DefectType] {
        &[DefectType::MassiveController]
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<ArchitecturalDefect>, DetectorError> {
        let limit = ctx.thresholds.class_smells.massive_controller_max_lines;
        let mut defects = Vec::new();

        for decl in distinct_types(ctx.tree) {
            if !decl.kind.is_concrete_type() || !decl.name.ends_with("Controller") {
                continue;
            }
            let lines = ctx.tree.type_extent(&decl.name);
            if let Some(severity) = tiered_severity(lines, limit) {
                defects.push(ctx.defect(
                    DefectType::MassiveController,
                    severity,
                    format!(
                        "controller '{}' spans {} lines, exceeds maximum of {}",
                        decl.name, lines, limit
                    ),
                    decl,
                ));
            }
        }

        Ok(defects)
    }
}

/// Types with too few members to justify their existence.
///
/// This is an undersize rule: it fires when the member count is below
/// `classSmells.lazyClassMinMembers`. Empty types are left to the
/// unnecessary-abstraction detector and single-operation stateless types to
/// the imperative-abstraction detector.
pub struct LazyClassDetector;

impl Detector for LazyClassDetector {
    fn name(&self) -> &'static str {
        "lazy-class"
    }

    fn detectable_types(&self) -> &'static [DefectType] {
        &[DefectType::LazyClass]
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<ArchitecturalDefect>, DetectorError> {
        let min = ctx.thresholds.class_smells.lazy_class_min_members;
        let max_ops = ctx.thresholds.abstraction_smells.imperative_max_operations;
        let mut defects = Vec::new();

        for decl in distinct_types(ctx.tree) {
            if !decl.kind.is_concrete_type() {
                continue;
            }
            let members = ctx.tree.members_of_type(&decl.name);
            let count = members.member_count();
            if count == 0 || count >= min || is_imperative_shaped(&members, max_ops) {
                continue;
            }
            defects.push(ctx.defect(
                DefectType::LazyClass,
                Severity::Low,
                format!(
                    "{} '{}' has only {} member(s), below the minimum of {}",
                    decl.kind, decl.name, count, min
                ),
                decl,
            ));
        }

        Ok(defects)
    }
}

/// Classes that only hold data and expose no behavior.
pub struct DataClassDetector;

impl Detector for DataClassDetector {
    fn name(&self) -> &'static str {
        "data-class"
    }

    fn detectable_types(&self) -> &'static [DefectType] {
        &[DefectType::DataClass]
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<ArchitecturalDefect>, DetectorError> {
        let limit = ctx.thresholds.class_smells.data_class_max_properties;
        let mut defects = Vec::new();

        for decl in distinct_types(ctx.tree) {
            if decl.kind != DeclarationKind::Class {
                continue;
            }
            let members = ctx.tree.members_of_type(&decl.name);
            if !members.methods.is_empty() {
                continue;
            }
            let properties = members.stored_properties.len();
            if properties <= limit {
                continue;
            }
            let severity = if overage_ratio(properties, limit) < 2.0 {
                Severity::Low
            } else {
                Severity::Medium
            };
            defects.push(ctx.defect(
                DefectType::DataClass,
                severity,
                format!(
                    "class '{}' has {} stored properties and no behavior (max {})",
                    decl.name, properties, limit
                ),
                decl,
            ));
        }

        Ok(defects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::model::{Declaration, DeclarationTree, Modifiers};
    use crate::thresholds::Thresholds;

    fn add_type(
        tree: &mut DeclarationTree,
        kind: DeclarationKind,
        name: &str,
        methods: usize,
        properties: usize,
    ) {
        let id = tree.add(Declaration::new(name, kind).with_span(1, 10), None);
        for i in 0..properties {
            tree.add(
                Declaration::new(format!("field{}", i), DeclarationKind::Variable).with_modifiers(
                    Modifiers {
                        is_mutable: true,
                        ..Default::default()
                    },
                ),
                Some(id),
            );
        }
        for i in 0..methods {
            tree.add(
                Declaration::new(format!("doWork{}", i), DeclarationKind::Function),
                Some(id),
            );
        }
    }

    fn run(detector: &dyn Detector, tree: &DeclarationTree) -> Vec<ArchitecturalDefect> {
        let thresholds = Thresholds::default();
        let ctx = DetectionContext::new(tree, "Test.swift", &thresholds);
        detector.detect(&ctx).unwrap()
    }

    #[test]
    fn test_god_class_on_methods() {
        let mut tree = DeclarationTree::new();
        add_type(&mut tree, DeclarationKind::Class, "Everything", 41, 2);
        add_type(&mut tree, DeclarationKind::Class, "Small", 20, 2);

        let defects = run(&GodClassDetector, &tree);
        assert_eq!(defects.len(), 1);
        assert_eq!(defects[0].severity, Severity::High);
        assert!(defects[0].message.contains("'Everything'"));
        assert!(defects[0].message.contains("41 methods"));
    }

    #[test]
    fn test_god_class_counts_extension_members() {
        let mut tree = DeclarationTree::new();
        add_type(&mut tree, DeclarationKind::Struct, "Store", 12, 0);
        add_type(&mut tree, DeclarationKind::Extension, "Store", 12, 0);

        let defects = run(&GodClassDetector, &tree);
        assert_eq!(defects.len(), 1);
        assert!(defects[0].message.contains("24 methods"));
    }

    #[test]
    fn test_massive_controller() {
        let mut tree = DeclarationTree::new();
        tree.add(
            Declaration::new("ProfileViewController", DeclarationKind::Class).with_span(1, 450),
            None,
        );
        tree.add(
            Declaration::new("ProfileView", DeclarationKind::Class).with_span(460, 1000),
            None,
        );

        let defects = run(&MassiveControllerDetector, &tree);
        assert_eq!(defects.len(), 1);
        assert!(defects[0].message.contains("450 lines"));
        assert_eq!(defects[0].severity, Severity::Medium);
    }

    #[test]
    fn test_lazy_class() {
        let mut tree = DeclarationTree::new();
        add_type(&mut tree, DeclarationKind::Class, "Wrapper", 0, 1);
        add_type(&mut tree, DeclarationKind::Class, "Empty", 0, 0);
        add_type(&mut tree, DeclarationKind::Class, "Healthy", 2, 2);
        // single stateless operation belongs to imperative abstraction
        add_type(&mut tree, DeclarationKind::Struct, "Command", 1, 0);

        let defects = run(&LazyClassDetector, &tree);
        assert_eq!(defects.len(), 1);
        assert!(defects[0].message.contains("'Wrapper'"));
        assert_eq!(defects[0].severity, Severity::Low);
    }

    #[test]
    fn test_data_class() {
        let mut tree = DeclarationTree::new();
        add_type(&mut tree, DeclarationKind::Class, "UserRecord", 0, 8);
        add_type(&mut tree, DeclarationKind::Class, "HugeRecord", 0, 20);
        add_type(&mut tree, DeclarationKind::Class, "Account", 3, 8);
        add_type(&mut tree, DeclarationKind::Struct, "Point", 0, 9);

        let defects = run(&DataClassDetector, &tree);
        assert_eq!(defects.len(), 2);
        assert_eq!(defects[0].severity, Severity::Low);
        assert_eq!(defects[1].severity, Severity::Medium);
    }
}
