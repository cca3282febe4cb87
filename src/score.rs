//! Maintainability scoring and grading.
//!
//! A file starts at 100 and loses points for every defect according to its
//! severity; the result is clamped to 0..=100.

use serde::{Deserialize, Serialize};

use crate::detect::{ArchitecturalDefect, Severity};

/// Point penalty per defect by severity.
pub mod weights {
    pub const CRITICAL: u32 = 20;
    pub const HIGH: u32 = 10;
    pub const MEDIUM: u32 = 5;
    pub const LOW: u32 = 2;
}

/// Grade thresholds (minimum score for each letter).
pub mod grades {
    pub const A_MIN: f64 = 90.0;
    pub const B_MIN: f64 = 75.0;
    pub const C_MIN: f64 = 60.0;
    pub const D_MIN: f64 = 50.0;
}

/// Directory-level averages below this require refactoring.
pub const REFACTORING_SCORE: f64 = 50.0;

/// Average needed to count as healthy.
pub const HEALTHY_SCORE: f64 = 75.0;

pub const MAX_SCORE: u32 = 100;

/// Penalty for one defect of the given severity.
pub fn weight(severity: Severity) -> u32 {
    match severity {
        Severity::Critical => weights::CRITICAL,
        Severity::High => weights::HIGH,
        Severity::Medium => weights::MEDIUM,
        Severity::Low => weights::LOW,
    }
}

/// `clamp(100 - sum(weights), 0, 100)`.
pub fn maintainability_score(defects: &[ArchitecturalDefect]) -> u32 {
    let penalty: u32 = defects
        .iter()
        .map(|d| weight(d.severity))
        .fold(0u32, u32::saturating_add);
    MAX_SCORE.saturating_sub(penalty)
}

/// Letter grade for a score.
pub fn grade(score: f64) -> &'static str {
    match score {
        s if s >= grades::A_MIN => "A",
        s if s >= grades::B_MIN => "B",
        s if s >= grades::C_MIN => "C",
        s if s >= grades::D_MIN => "D",
        _ => "F",
    }
}

/// Overall health of an analyzed directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    NeedsAttention,
    RequiresRefactoring,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::NeedsAttention => "needs attention",
            HealthStatus::RequiresRefactoring => "requires refactoring",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
