//! Function-level detectors: long methods, message chains and feature envy.

use std::collections::HashSet;

use crate::analysis::model::{AccessBase, FunctionBody, MemberAccess};
use crate::error::DetectorError;

use super::detector::{DetectionContext, Detector};
use super::types::{tiered_severity, ArchitecturalDefect, DefectType, Severity};

/// Functions with too many statements, lines or branches.
pub struct LongMethodDetector;

impl Detector for LongMethodDetector {
    fn name(&self) -> &'static str {
        "long-method"
    }

    fn detectable_types(&self) -> &'static [DefectType] {
        &[DefectType::LongMethod]
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<ArchitecturalDefect>, DetectorError> {
        let limits = &ctx.thresholds.method_smells;
        let mut defects = Vec::new();

        for (_, func) in ctx.tree.functions() {
            let Some(body) = &func.body else {
                continue;
            };

            let checks = [
                ("statements", body.statement_count, limits.long_method_max_statements),
                ("lines", func.span.line_count(), limits.long_method_max_lines),
                (
                    "cyclomatic complexity",
                    body.control_flow.cyclomatic_complexity(),
                    limits.long_method_max_complexity,
                ),
            ];

            let mut severity = None;
            let mut exceeded = Vec::new();
            for (label, metric, limit) in checks {
                if let Some(s) = tiered_severity(metric, limit) {
                    severity = severity.max(Some(s));
                    exceeded.push(format!("{} {} (max {})", label, metric, limit));
                }
            }

            if let Some(severity) = severity {
                defects.push(ctx.defect(
                    DefectType::LongMethod,
                    severity,
                    format!("function '{}' is too long: {}", func.name, exceeded.join(", ")),
                    func,
                ));
            }
        }

        Ok(defects)
    }
}

fn render_chain(access: &MemberAccess) -> String {
    let base = match &access.base {
        AccessBase::SelfRef => "self",
        AccessBase::Identifier(name) => name.as_str(),
        AccessBase::Expression => "(...)",
    };
    let mut text = base.to_string();
    for segment in &access.segments {
        text.push('.');
        text.push_str(segment);
    }
    text
}

/// Member-access chains longer than the configured length.
///
/// Only the longest chain of each function is reported.
pub struct MessageChainDetector;

impl Detector for MessageChainDetector {
    fn name(&self) -> &'static str {
        "message-chain"
    }

    fn detectable_types(&self) -> &'static [DefectType] {
        &[DefectType::MessageChain]
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<ArchitecturalDefect>, DetectorError> {
        let limit = ctx.thresholds.method_smells.message_chain_max_length;
        let mut defects = Vec::new();

        for (_, func) in ctx.tree.functions() {
            let Some(body) = &func.body else {
                continue;
            };
            // first of the longest chains wins ties
            let Some(longest) = body
                .member_accesses
                .iter()
                .rev()
                .max_by_key(|a| a.chain_length())
            else {
                continue;
            };
            let length = longest.chain_length();
            if let Some(severity) = tiered_severity(length, limit) {
                defects.push(ctx.defect(
                    DefectType::MessageChain,
                    severity,
                    format!(
                        "function '{}' navigates a chain of {} members ({}) on line {}, exceeds maximum of {}",
                        func.name,
                        length,
                        render_chain(longest),
                        longest.line,
                        limit
                    ),
                    func,
                ));
            }
        }

        Ok(defects)
    }
}

/// Self and foreign data accesses of one method body.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AccessProfile {
    pub own: usize,
    pub foreign: usize,
}

impl AccessProfile {
    pub fn total(&self) -> usize {
        self.own + self.foreign
    }

    pub fn foreign_percent(&self) -> usize {
        if self.total() == 0 {
            0
        } else {
            self.foreign * 100 / self.total()
        }
    }
}

/// Classify the accesses of a body against the owner's property names.
///
/// `self.x` and bare or receiver use of an own property count as own data.
/// A lowercase receiver that is not an own property (a parameter or local)
/// counts as foreign. Static access on capitalized names is ignored.
pub(crate) fn access_profile(body: &FunctionBody, own_properties: &HashSet<&str>) -> AccessProfile {
    let mut profile = AccessProfile::default();
    for access in &body.member_accesses {
        match &access.base {
            AccessBase::SelfRef => profile.own += 1,
            AccessBase::Identifier(name) if own_properties.contains(name.as_str()) => {
                profile.own += 1
            }
            AccessBase::Identifier(_) if access.base.type_name().is_some() => {}
            AccessBase::Identifier(_) => profile.foreign += 1,
            AccessBase::Expression => {}
        }
    }
    profile.own += body
        .identifiers
        .iter()
        .filter(|name| own_properties.contains(name.as_str()))
        .count();
    profile
}

/// Methods that work more with other objects' data than with their own.
///
/// One defect per enclosing type, listing its envious methods.
pub struct FeatureEnvyDetector;

impl Detector for FeatureEnvyDetector {
    fn name(&self) -> &'static str {
        "feature-envy"
    }

    fn detectable_types(&self) -> &'static [DefectType] {
        &[DefectType::FeatureEnvy]
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<ArchitecturalDefect>, DetectorError> {
        ctx.require_valid_tree()?;
        let limits = &ctx.thresholds.method_smells;

        // owner name -> (owner span, envious methods), in first-seen order
        let mut envy: Vec<(String, crate::analysis::model::Span, Vec<String>)> = Vec::new();

        for (id, func) in ctx.tree.functions() {
            let (Some((_, owner)), Some(body)) = (ctx.tree.enclosing_type(id), &func.body) else {
                continue;
            };
            if func.is_initializer() || func.modifiers.is_static {
                continue;
            }

            let members = ctx.tree.members_of_type(&owner.name);
            let own: HashSet<&str> = members.property_names().collect();
            let profile = access_profile(body, &own);
            if profile.total() < limits.feature_envy_min_accesses
                || profile.foreign_percent() <= limits.feature_envy_max_foreign_percent
            {
                continue;
            }

            let entry = format!(
                "{} ({} of {} accesses foreign)",
                func.name,
                profile.foreign,
                profile.total()
            );
            match envy.iter_mut().find(|(name, _, _)| *name == owner.name) {
                Some((_, _, methods)) => methods.push(entry),
                None => envy.push((owner.name.clone(), owner.span, vec![entry])),
            }
        }

        let defects = envy
            .into_iter()
            .map(|(owner, span, methods)| {
                let severity = if methods.len() >= 3 {
                    Severity::High
                } else {
                    Severity::Medium
                };
                ArchitecturalDefect::new(
                    DefectType::FeatureEnvy,
                    severity,
                    format!(
                        "type '{}' has {} method(s) more interested in other objects' data than its own: {}",
                        owner,
                        methods.len(),
                        methods.join(", ")
                    ),
                    ctx.location(span),
                )
            })
            .collect();

        Ok(defects)
    }
}
