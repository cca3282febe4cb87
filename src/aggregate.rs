//! Directory-level aggregation of per-file results.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::detect::{AnalysisResult, ArchitecturalDefect, Severity};
use crate::score::{self, HealthStatus};

/// A file that could not be read or parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    pub path: String,
    pub error: String,
}

/// What happened to one discovered file.
#[derive(Debug, Clone)]
pub enum FileOutcome {
    Analyzed(AnalysisResult),
    Failed(FileFailure),
}

/// Result of analyzing a directory (or a single file).
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryAnalysisResult {
    pub root: PathBuf,
    /// Sorted by file path.
    pub results: Vec<AnalysisResult>,
    /// Sorted by file path.
    pub failed_files: Vec<FileFailure>,
    pub duration: Duration,
    pub timestamp: DateTime<Utc>,
}

impl DirectoryAnalysisResult {
    /// Files that were analyzed successfully.
    pub fn total_files(&self) -> usize {
        self.results.len()
    }

    pub fn total_defects(&self) -> usize {
        self.results.iter().map(AnalysisResult::total_defects).sum()
    }

    /// Mean of per-file scores, 0.0 when nothing was analyzed.
    pub fn average_maintainability_score(&self) -> f64 {
        if self.results.is_empty() {
            return 0.0;
        }
        let sum: u64 = self
            .results
            .iter()
            .map(|r| u64::from(r.maintainability_score))
            .sum();
        sum as f64 / self.results.len() as f64
    }

    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.results
            .iter()
            .map(|r| r.count_by_severity(severity))
            .sum()
    }

    /// All defects grouped by severity, files in path order.
    pub fn defects_by_severity(&self) -> BTreeMap<Severity, Vec<&ArchitecturalDefect>> {
        let mut buckets: BTreeMap<Severity, Vec<&ArchitecturalDefect>> = BTreeMap::new();
        for defect in self.results.iter().flat_map(|r| r.defects.iter()) {
            buckets.entry(defect.severity).or_default().push(defect);
        }
        buckets
    }

    /// At least one critical defect, or an average score below 50.
    pub fn requires_refactoring(&self) -> bool {
        self.count_by_severity(Severity::Critical) > 0
            || self.average_maintainability_score() < score::REFACTORING_SCORE
    }

    pub fn health_status(&self) -> HealthStatus {
        if self.requires_refactoring() {
            HealthStatus::RequiresRefactoring
        } else if self.average_maintainability_score() >= score::HEALTHY_SCORE
            && self.count_by_severity(Severity::High) == 0
        {
            HealthStatus::Healthy
        } else {
            HealthStatus::NeedsAttention
        }
    }
}

/// Fold per-file results and failures into a directory result.
pub fn aggregate(
    root: impl Into<PathBuf>,
    mut results: Vec<AnalysisResult>,
    mut failures: Vec<FileFailure>,
    duration: Duration,
) -> DirectoryAnalysisResult {
    results.sort_by(|a, b| a.file_path.cmp(&b.file_path));
    failures.sort_by(|a, b| a.path.cmp(&b.path));
    DirectoryAnalysisResult {
        root: root.into(),
        results,
        failed_files: failures,
        duration,
        timestamp: Utc::now(),
    }
}

/// Like [`aggregate`], from tagged outcomes.
pub fn aggregate_outcomes(
    root: impl Into<PathBuf>,
    outcomes: impl IntoIterator<Item = FileOutcome>,
    duration: Duration,
) -> DirectoryAnalysisResult {
    let mut results = Vec::new();
    let mut failures = Vec::new();
    for outcome in outcomes {
        match outcome {
            FileOutcome::Analyzed(result) => results.push(result),
            FileOutcome::Failed(failure) => failures.push(failure),
        }
    }
    aggregate(root, results, failures, duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{DefectType, Location};

    fn result(path: &str, severities: &[Severity]) -> AnalysisResult {
        let defects: Vec<_> = severities
            .iter()
            .map(|s| {
                ArchitecturalDefect::new(
                    DefectType::LongMethod,
                    *s,
                    "too long",
                    Location {
                        file: path.to_string(),
                        start_line: 1,
                        end_line: 2,
                    },
                )
            })
            .collect();
        AnalysisResult {
            file_path: path.to_string(),
            maintainability_score: score::maintainability_score(&defects),
            defects,
            skipped_detectors: Vec::new(),
            suppressed: Vec::new(),
        }
    }

    #[test]
    fn test_empty_directory_summary() {
        let dir = aggregate("src", Vec::new(), Vec::new(), Duration::ZERO);
        assert_eq!(dir.total_files(), 0);
        assert_eq!(dir.total_defects(), 0);
        assert_eq!(dir.average_maintainability_score(), 0.0);
        assert!(dir.requires_refactoring());
    }

    #[test]
    fn test_results_sorted_by_path() {
        let dir = aggregate(
            "src",
            vec![result("b.swift", &[]), result("a.swift", &[Severity::Low])],
            vec![
                FileFailure {
                    path: "z.swift".into(),
                    error: "bad".into(),
                },
                FileFailure {
                    path: "c.swift".into(),
                    error: "bad".into(),
                },
            ],
            Duration::from_millis(5),
        );
        let paths: Vec<_> = dir.results.iter().map(|r| r.file_path.as_str()).collect();
        assert_eq!(paths, vec!["a.swift", "b.swift"]);
        assert_eq!(dir.failed_files[0].path, "c.swift");
    }

    #[test]
    fn test_aggregation_is_order_independent() {
        let a = result("a.swift", &[Severity::High]);
        let b = result("b.swift", &[Severity::Medium, Severity::Low]);
        let one = aggregate("src", vec![a.clone(), b.clone()], Vec::new(), Duration::ZERO);
        let two = aggregate("src", vec![b, a], Vec::new(), Duration::ZERO);
        assert_eq!(one.results, two.results);
        assert_eq!(
            one.average_maintainability_score(),
            two.average_maintainability_score()
        );
    }

    #[test]
    fn test_summaries() {
        let dir = aggregate(
            "src",
            vec![
                result("a.swift", &[Severity::High, Severity::Low]),
                result("b.swift", &[]),
            ],
            Vec::new(),
            Duration::ZERO,
        );
        assert_eq!(dir.total_defects(), 2);
        assert_eq!(dir.count_by_severity(Severity::High), 1);
        assert_eq!(dir.average_maintainability_score(), (88.0 + 100.0) / 2.0);
        assert!(!dir.requires_refactoring());
        assert_eq!(dir.health_status(), HealthStatus::NeedsAttention);

        let buckets = dir.defects_by_severity();
        assert_eq!(buckets[&Severity::Low].len(), 1);
        assert!(!buckets.contains_key(&Severity::Critical));
    }

    #[test]
    fn test_critical_defect_requires_refactoring() {
        let dir = aggregate(
            "src",
            vec![result("a.swift", &[Severity::Critical])],
            Vec::new(),
            Duration::ZERO,
        );
        assert!(dir.average_maintainability_score() >= 50.0);
        assert!(dir.requires_refactoring());
        assert_eq!(dir.health_status(), HealthStatus::RequiresRefactoring);
    }

    #[test]
    fn test_healthy_directory() {
        let dir = aggregate_outcomes(
            "src",
            vec![
                FileOutcome::Analyzed(result("a.swift", &[Severity::Low])),
                FileOutcome::Failed(FileFailure {
                    path: "broken.swift".into(),
                    error: "parse error".into(),
                }),
            ],
            Duration::ZERO,
        );
        assert_eq!(dir.total_files(), 1);
        assert_eq!(dir.failed_files.len(), 1);
        assert_eq!(dir.health_status(), HealthStatus::Healthy);
    }
}
