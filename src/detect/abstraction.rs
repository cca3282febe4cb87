//! Abstraction design detectors.
//!
//! - Multifaceted abstraction: one type with many unrelated responsibilities
//! - Unnecessary abstraction: a type with nothing in it
//! - Imperative abstraction: a stateless type wrapping one or two operations
//! - Deficient encapsulation: stored state writable from outside the type

use std::collections::BTreeSet;

use phf::phf_map;

use crate::analysis::model::{DeclarationKind, TypeMembers};
use crate::error::DetectorError;

use super::detector::{distinct_types, supertypes_of, DetectionContext, Detector};
use super::types::{tiered_severity, ArchitecturalDefect, DefectType, Severity};

/// Leading verb of a method name -> responsibility it suggests.
static RESPONSIBILITY_VERBS: phf::Map<&'static str, &'static str> = phf_map! {
    "fetch" => "networking",
    "download" => "networking",
    "upload" => "networking",
    "request" => "networking",
    "send" => "networking",
    "post" => "networking",
    "save" => "persistence",
    "load" => "persistence",
    "persist" => "persistence",
    "store" => "persistence",
    "delete" => "persistence",
    "insert" => "persistence",
    "query" => "persistence",
    "cache" => "persistence",
    "read" => "persistence",
    "write" => "persistence",
    "render" => "presentation",
    "draw" => "presentation",
    "display" => "presentation",
    "show" => "presentation",
    "hide" => "presentation",
    "present" => "presentation",
    "layout" => "presentation",
    "animate" => "presentation",
    "style" => "presentation",
    "validate" => "validation",
    "verify" => "validation",
    "check" => "validation",
    "ensure" => "validation",
    "parse" => "transformation",
    "decode" => "transformation",
    "encode" => "transformation",
    "format" => "transformation",
    "serialize" => "transformation",
    "deserialize" => "transformation",
    "convert" => "transformation",
    "transform" => "transformation",
    "calculate" => "computation",
    "compute" => "computation",
    "process" => "computation",
    "evaluate" => "computation",
    "apply" => "computation",
    "log" => "logging",
    "track" => "logging",
    "report" => "logging",
    "handle" => "event handling",
    "on" => "event handling",
    "did" => "event handling",
    "will" => "event handling",
    "navigate" => "navigation",
    "route" => "navigation",
    "open" => "navigation",
    "dismiss" => "navigation",
    "authenticate" => "security",
    "login" => "security",
    "logout" => "security",
    "authorize" => "security",
    "encrypt" => "security",
    "decrypt" => "security",
};

/// First lowercase word of a camelCase name (`fetchUsers` -> `fetch`).
fn leading_verb(name: &str) -> &str {
    let end = name
        .char_indices()
        .skip(1)
        .find(|(_, c)| c.is_ascii_uppercase() || *c == '_')
        .map(|(i, _)| i)
        .unwrap_or(name.len());
    &name[..end]
}

/// Responsibilities suggested by a set of method names.
pub(crate) fn responsibilities<'a>(names: impl IntoIterator<Item = &'a str>) -> BTreeSet<&'static str> {
    names
        .into_iter()
        .filter_map(|name| RESPONSIBILITY_VERBS.get(leading_verb(name)).copied())
        .collect()
}

/// No state and only a handful of operations.
pub(crate) fn is_imperative_shaped(members: &TypeMembers<'_>, max_operations: usize) -> bool {
    members.stored_properties.is_empty()
        && members.computed_properties.is_empty()
        && members.nested_types.is_empty()
        && (1..=max_operations).contains(&members.methods.len())
}

/// Too many distinct responsibilities in one type.
pub struct MultifacetedAbstractionDetector;

impl Detector for MultifacetedAbstractionDetector {
    fn name(&self) -> &'static str {
        "multifaceted-abstraction"
    }

    fn detectable_types(&self) -> &'static [DefectType] {
        &[DefectType::MultifacetedAbstraction]
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<ArchitecturalDefect>, DetectorError> {
        let limit = ctx.thresholds.abstraction_smells.multifaceted_max_responsibilities;
        let mut defects = Vec::new();

        for decl in distinct_types(ctx.tree) {
            if !decl.kind.is_concrete_type() {
                continue;
            }
            let members = ctx.tree.members_of_type(&decl.name);
            let found = responsibilities(members.methods.iter().map(|m| m.name.as_str()));
            if let Some(severity) = tiered_severity(found.len(), limit) {
                let listed: Vec<_> = found.iter().copied().collect();
                defects.push(ctx.defect(
                    DefectType::MultifacetedAbstraction,
                    severity,
                    format!(
                        "{} '{}' has {} responsibilities ({}), exceeds maximum of {}",
                        decl.kind,
                        decl.name,
                        found.len(),
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

/// Classes and structs with no members, nested types or supertypes.
pub struct UnnecessaryAbstractionDetector;

impl Detector for UnnecessaryAbstractionDetector {
    fn name(&self) -> &'static str {
        "unnecessary-abstraction"
    }

    fn detectable_types(&self) -> &'static [DefectType] {
        &[DefectType::UnnecessaryAbstraction]
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<ArchitecturalDefect>, DetectorError> {
        let mut defects = Vec::new();

        for decl in distinct_types(ctx.tree) {
            match decl.kind {
                DeclarationKind::Class | DeclarationKind::Struct => {}
                DeclarationKind::Enum
                | DeclarationKind::Protocol
                | DeclarationKind::Actor
                | DeclarationKind::Extension
                | DeclarationKind::Function
                | DeclarationKind::Variable
                | DeclarationKind::TypeAlias => continue,
            }
            let members = ctx.tree.members_of_type(&decl.name);
            let contents =
                members.member_count() + members.nested_types.len() + members.initializers.len();
            if contents > 0 || !supertypes_of(ctx.tree, &decl.name).is_empty() {
                continue;
            }
            defects.push(ctx.defect(
                DefectType::UnnecessaryAbstraction,
                Severity::Low,
                format!("{} '{}' declares no members", decl.kind, decl.name),
                decl,
            ));
        }

        Ok(defects)
    }
}

/// Stateless classes and structs that only wrap one or two operations.
pub struct ImperativeAbstractionDetector;

impl Detector for ImperativeAbstractionDetector {
    fn name(&self) -> &'static str {
        "imperative-abstraction"
    }

    fn detectable_types(&self) -> &'static [DefectType] {
        &[DefectType::ImperativeAbstraction]
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<ArchitecturalDefect>, DetectorError> {
        let max_ops = ctx.thresholds.abstraction_smells.imperative_max_operations;
        let mut defects = Vec::new();

        for decl in distinct_types(ctx.tree) {
            if !matches!(decl.kind, DeclarationKind::Class | DeclarationKind::Struct) {
                continue;
            }
            // conforming types implement an operation someone else asked for
            if !supertypes_of(ctx.tree, &decl.name).is_empty() {
                continue;
            }
            let members = ctx.tree.members_of_type(&decl.name);
            if !is_imperative_shaped(&members, max_ops) {
                continue;
            }
            let names: Vec<_> = members.methods.iter().map(|m| m.name.as_str()).collect();
            defects.push(ctx.defect(
                DefectType::ImperativeAbstraction,
                Severity::Medium,
                format!(
                    "{} '{}' has no state and only wraps {}",
                    decl.kind,
                    decl.name,
                    names.join(", ")
                ),
                decl,
            ));
        }

        Ok(defects)
    }
}

/// Stored `var`s that code outside the type may assign.
pub struct DeficientEncapsulationDetector;

impl Detector for DeficientEncapsulationDetector {
    fn name(&self) -> &'static str {
        "deficient-encapsulation"
    }

    fn detectable_types(&self) -> &'static [DefectType] {
        &[DefectType::DeficientEncapsulation]
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<ArchitecturalDefect>, DetectorError> {
        let limit = ctx.thresholds.encapsulation.max_exposed_fields;
        let mut defects = Vec::new();

        for decl in distinct_types(ctx.tree) {
            if !decl.kind.is_concrete_type() || decl.modifiers.access.is_private() {
                continue;
            }
            let members = ctx.tree.members_of_type(&decl.name);
            let exposed: Vec<&str> = members
                .stored_properties
                .iter()
                .filter(|p| {
                    p.modifiers.is_mutable && !p.modifiers.effective_setter_access().is_private()
                })
                .map(|p| p.name.as_str())
                .collect();

            if let Some(severity) = tiered_severity(exposed.len(), limit) {
                defects.push(ctx.defect(
                    DefectType::DeficientEncapsulation,
                    severity,
                    format!(
                        "{} '{}' exposes {} writable stored properties ({}), exceeds maximum of {}",
                        decl.kind,
                        decl.name,
                        exposed.len(),
                        exposed.join(", "),
                        limit
                    ),
                    decl,
                ));
            }
        }

        Ok(defects)
    }
}
