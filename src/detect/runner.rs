//! Analysis coordinator: runs every detector over one declaration tree.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::analysis::model::DeclarationTree;
use crate::error::DetectorError;
use crate::score;
use crate::thresholds::Thresholds;

use super::detector::{default_detectors, DetectionContext, Detector};
use super::suppress::{filter_suppressed, parse_suppressions, SuppressedDefect};
use super::types::{ArchitecturalDefect, Severity};

/// A detector that failed on a file and was left out of its result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedDetector {
    pub detector: String,
    pub reason: String,
}

/// Result of analyzing one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub file_path: String,
    /// Defects in detector registration order, then declaration order.
    pub defects: Vec<ArchitecturalDefect>,
    /// 0..=100, higher is healthier.
    pub maintainability_score: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_detectors: Vec<SkippedDetector>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suppressed: Vec<SuppressedDefect>,
}

impl AnalysisResult {
    pub fn total_defects(&self) -> usize {
        self.defects.len()
    }

    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.defects.iter().filter(|d| d.severity == severity).count()
    }

    /// Defects grouped by severity, each group in report order.
    pub fn defects_by_severity(&self) -> BTreeMap<Severity, Vec<&ArchitecturalDefect>> {
        let mut buckets: BTreeMap<Severity, Vec<&ArchitecturalDefect>> = BTreeMap::new();
        for defect in &self.defects {
            buckets.entry(defect.severity).or_default().push(defect);
        }
        buckets
    }

    pub fn has_critical(&self) -> bool {
        self.defects.iter().any(|d| d.severity == Severity::Critical)
    }
}

/// Runs the registered detectors against parsed modules.
pub struct Runner<'a> {
    thresholds: &'a Thresholds,
    detectors: Vec<Box<dyn Detector>>,
}

impl<'a> Runner<'a> {
    /// Create a runner with the full detector set.
    pub fn new(thresholds: &'a Thresholds) -> Self {
        Self::with_detectors(thresholds, default_detectors())
    }

    pub fn with_detectors(thresholds: &'a Thresholds, detectors: Vec<Box<dyn Detector>>) -> Self {
        Self {
            thresholds,
            detectors,
        }
    }

    pub fn thresholds(&self) -> &Thresholds {
        self.thresholds
    }

    /// Run every detector and score the combined output.
    ///
    /// A detector that errors, or emits a defect type it did not declare,
    /// is logged and recorded in `skipped_detectors`; the others still run.
    pub fn analyze(&self, tree: &DeclarationTree, file_path: &str) -> AnalysisResult {
        let (defects, skipped_detectors) = self.run_detectors(tree, file_path);
        AnalysisResult {
            file_path: file_path.to_string(),
            maintainability_score: score::maintainability_score(&defects),
            defects,
            skipped_detectors,
            suppressed: Vec::new(),
        }
    }

    /// Like [`Runner::analyze`], but drops defects silenced by
    /// `archsmell:ignore` comments in `source` before scoring.
    pub fn analyze_with_suppressions(
        &self,
        tree: &DeclarationTree,
        file_path: &str,
        source: &str,
    ) -> AnalysisResult {
        let (defects, skipped_detectors) = self.run_detectors(tree, file_path);
        let suppressions = parse_suppressions(file_path, source);
        let (defects, suppressed) = filter_suppressed(defects, &suppressions);
        AnalysisResult {
            file_path: file_path.to_string(),
            maintainability_score: score::maintainability_score(&defects),
            defects,
            skipped_detectors,
            suppressed,
        }
    }

    fn run_detectors(
        &self,
        tree: &DeclarationTree,
        file_path: &str,
    ) -> (Vec<ArchitecturalDefect>, Vec<SkippedDetector>) {
        let ctx = DetectionContext::new(tree, file_path, self.thresholds);
        let mut defects = Vec::new();
        let mut skipped = Vec::new();

        for detector in &self.detectors {
            let outcome = detector.detect(&ctx).and_then(|found| {
                let declared = detector.detectable_types();
                match found.iter().find(|d| !declared.contains(&d.defect_type)) {
                    Some(stray) => Err(DetectorError::UndeclaredDefectType(stray.defect_type)),
                    None => Ok(found),
                }
            });

            match outcome {
                Ok(found) => {
                    tracing::trace!(
                        detector = detector.name(),
                        file = file_path,
                        count = found.len(),
                        "detector finished"
                    );
                    defects.extend(found);
                }
                Err(err) => {
                    tracing::warn!(
                        detector = detector.name(),
                        file = file_path,
                        error = %err,
                        "detector failed, skipping"
                    );
                    skipped.push(SkippedDetector {
                        detector: detector.name().to_string(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        (defects, skipped)
    }
}
