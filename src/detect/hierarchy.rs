//! Broken hierarchy: overrides that refuse the behavior they inherit.

use crate::error::DetectorError;

use super::detector::{distinct_types, supertypes_of, DetectionContext, Detector};
use super::types::{ArchitecturalDefect, DefectType, Severity};

/// Override methods whose body only throws or traps.
///
/// A subtype that answers an inherited call with `fatalError` or an
/// unconditional `throw` cannot stand in for its supertype.
pub struct BrokenHierarchyDetector;

impl Detector for BrokenHierarchyDetector {
    fn name(&self) -> &'static str {
        "broken-hierarchy"
    }

    fn detectable_types(&self) -> &'static [DefectType] {
        &[DefectType::BrokenHierarchy]
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<ArchitecturalDefect>, DetectorError> {
        let mut defects = Vec::new();

        for decl in distinct_types(ctx.tree) {
            let supertypes = supertypes_of(ctx.tree, &decl.name);
            if supertypes.is_empty() {
                continue;
            }

            let members = ctx.tree.members_of_type(&decl.name);
            let refused: Vec<&str> = members
                .methods
                .iter()
                .filter(|m| m.modifiers.is_override)
                .filter(|m| m.body.as_ref().is_some_and(|b| b.always_fails))
                .map(|m| m.name.as_str())
                .collect();

            if refused.is_empty() {
                continue;
            }

            let severity = if refused.len() >= 3 {
                Severity::Critical
            } else {
                Severity::High
            };
            defects.push(ctx.defect(
                DefectType::BrokenHierarchy,
                severity,
                format!(
                    "{} '{}' overrides {} inherited from {} only to fail: {}",
                    decl.kind,
                    decl.name,
                    if refused.len() == 1 { "a member" } else { "members" },
                    supertypes.join(", "),
                    refused.join(", ")
                ),
                decl,
            ));
        }

        Ok(defects)
    }
}
