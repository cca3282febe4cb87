//! Core types for detection results.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::analysis::model::Span;

/// Severity levels for defects, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// All levels, most severe first.
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            _ => Err(format!("unknown severity: {}", s)),
        }
    }
}

/// The 19 architectural defect categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefectType {
    GodClass,
    MassiveController,
    MultifacetedAbstraction,
    UnnecessaryAbstraction,
    ImperativeAbstraction,
    MissingAbstraction,
    InsufficientModularization,
    DuplicateBlock,
    BrokenHierarchy,
    UnstructuredModule,
    DenseStructure,
    DeficientEncapsulation,
    WeakenedModularity,
    LongMethod,
    LazyClass,
    DataClass,
    MessageChain,
    FeatureEnvy,
    CyclicDependency,
}

impl DefectType {
    pub const ALL: [DefectType; 19] = [
        DefectType::GodClass,
        DefectType::MassiveController,
        DefectType::MultifacetedAbstraction,
        DefectType::UnnecessaryAbstraction,
        DefectType::ImperativeAbstraction,
        DefectType::MissingAbstraction,
        DefectType::InsufficientModularization,
        DefectType::DuplicateBlock,
        DefectType::BrokenHierarchy,
        DefectType::UnstructuredModule,
        DefectType::DenseStructure,
        DefectType::DeficientEncapsulation,
        DefectType::WeakenedModularity,
        DefectType::LongMethod,
        DefectType::LazyClass,
        DefectType::DataClass,
        DefectType::MessageChain,
        DefectType::FeatureEnvy,
        DefectType::CyclicDependency,
    ];

    /// Stable identifier used in reports and suppression comments.
    pub fn as_str(&self) -> &'static str {
        match self {
            DefectType::GodClass => "god_class",
            DefectType::MassiveController => "massive_controller",
            DefectType::MultifacetedAbstraction => "multifaceted_abstraction",
            DefectType::UnnecessaryAbstraction => "unnecessary_abstraction",
            DefectType::ImperativeAbstraction => "imperative_abstraction",
            DefectType::MissingAbstraction => "missing_abstraction",
            DefectType::InsufficientModularization => "insufficient_modularization",
            DefectType::DuplicateBlock => "duplicate_block",
            DefectType::BrokenHierarchy => "broken_hierarchy",
            DefectType::UnstructuredModule => "unstructured_module",
            DefectType::DenseStructure => "dense_structure",
            DefectType::DeficientEncapsulation => "deficient_encapsulation",
            DefectType::WeakenedModularity => "weakened_modularity",
            DefectType::LongMethod => "long_method",
            DefectType::LazyClass => "lazy_class",
            DefectType::DataClass => "data_class",
            DefectType::MessageChain => "message_chain",
            DefectType::FeatureEnvy => "feature_envy",
            DefectType::CyclicDependency => "cyclic_dependency",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        DefectType::ALL.into_iter().find(|t| t.as_str() == s)
    }

    /// Human readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            DefectType::GodClass => "God Class",
            DefectType::MassiveController => "Massive Controller",
            DefectType::MultifacetedAbstraction => "Multifaceted Abstraction",
            DefectType::UnnecessaryAbstraction => "Unnecessary Abstraction",
            DefectType::ImperativeAbstraction => "Imperative Abstraction",
            DefectType::MissingAbstraction => "Missing Abstraction",
            DefectType::InsufficientModularization => "Insufficient Modularization",
            DefectType::DuplicateBlock => "Duplicate Block",
            DefectType::BrokenHierarchy => "Broken Hierarchy",
            DefectType::UnstructuredModule => "Unstructured Module",
            DefectType::DenseStructure => "Dense Structure",
            DefectType::DeficientEncapsulation => "Deficient Encapsulation",
            DefectType::WeakenedModularity => "Weakened Modularity",
            DefectType::LongMethod => "Long Method",
            DefectType::LazyClass => "Lazy Class",
            DefectType::DataClass => "Data Class",
            DefectType::MessageChain => "Message Chain",
            DefectType::FeatureEnvy => "Feature Envy",
            DefectType::CyclicDependency => "Cyclic Dependency",
        }
    }

    /// Default remediation advice.
    pub fn default_suggestion(&self) -> &'static str {
        match self {
            DefectType::GodClass => {
                "Split the type into smaller types that each own one responsibility"
            }
            DefectType::MassiveController => {
                "Move presentation logic into a view model or coordinator and keep the controller thin"
            }
            DefectType::MultifacetedAbstraction => {
                "Extract each responsibility into its own type and compose them"
            }
            DefectType::UnnecessaryAbstraction => {
                "Remove the empty type or give it real state and behavior"
            }
            DefectType::ImperativeAbstraction => {
                "Turn the single operation into a function or move it onto the data it works on"
            }
            DefectType::MissingAbstraction => {
                "Group related top-level functions and variables into a type or namespace enum"
            }
            DefectType::InsufficientModularization => {
                "Split the file into several files grouped by responsibility"
            }
            DefectType::DuplicateBlock => "Extract the repeated statements into a shared function",
            DefectType::BrokenHierarchy => {
                "Do not override members only to reject them; reconsider the inheritance relationship"
            }
            DefectType::UnstructuredModule => {
                "Keep one architectural layer per file and move the rest into their own files"
            }
            DefectType::DenseStructure => {
                "Reduce direct dependencies by introducing protocols or a mediator"
            }
            DefectType::DeficientEncapsulation => {
                "Make stored properties private or private(set) and expose intent-revealing methods"
            }
            DefectType::WeakenedModularity => {
                "Move the code closer to the types it depends on or depend on local abstractions"
            }
            DefectType::LongMethod => "Break the function into smaller well-named helpers",
            DefectType::LazyClass => "Inline the type into its caller or merge it with a related type",
            DefectType::DataClass => "Move the behavior that uses these properties into the type",
            DefectType::MessageChain => {
                "Hide the navigation behind a method on the first receiver (Law of Demeter)"
            }
            DefectType::FeatureEnvy => "Move the method to the type whose data it uses most",
            DefectType::CyclicDependency => {
                "Break the cycle with a protocol or by moving the shared part into its own type"
            }
        }
    }
}

impl fmt::Display for DefectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a defect was found.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub start_line: usize,
    pub end_line: usize,
}

impl Location {
    pub fn new(file: impl Into<String>, span: Span) -> Self {
        Self {
            file: file.into(),
            start_line: span.start_line,
            end_line: span.end_line,
        }
    }

    /// Whether `line` falls inside this location.
    pub fn contains_line(&self, line: usize) -> bool {
        (self.start_line..=self.end_line).contains(&line)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start_line == self.end_line {
            write!(f, "{}:{}", self.file, self.start_line)
        } else {
            write!(f, "{}:{}-{}", self.file, self.start_line, self.end_line)
        }
    }
}

/// A single detected smell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchitecturalDefect {
    pub defect_type: DefectType,
    pub severity: Severity,
    pub message: String,
    pub location: Location,
    pub suggestion: String,
}

impl ArchitecturalDefect {
    /// Create a defect with the type's default suggestion.
    pub fn new(
        defect_type: DefectType,
        severity: Severity,
        message: impl Into<String>,
        location: Location,
    ) -> Self {
        Self {
            defect_type,
            severity,
            message: message.into(),
            location,
            suggestion: defect_type.default_suggestion().to_string(),
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = suggestion.into();
        self
    }

    /// Key for comparing defects across runs.
    pub fn key(&self) -> String {
        format!("{}|{}|{}", self.defect_type, self.location.file, self.message)
    }
}

/// Overage ratio of a metric against its threshold (`M / max(T, 1)`).
pub fn overage_ratio(metric: usize, threshold: usize) -> f64 {
    metric as f64 / threshold.max(1) as f64
}

/// Standard tiering for a metric that exceeds its threshold.
///
/// Returns `None` when `metric <= threshold`. Above the threshold the ratio
/// picks the tier: below 2x medium, from 2x high, from 3x critical.
pub fn tiered_severity(metric: usize, threshold: usize) -> Option<Severity> {
    if metric <= threshold {
        return None;
    }
    Some(severity_for_ratio(overage_ratio(metric, threshold)))
}

/// Standard tier for a ratio already known to be over the limit.
pub fn severity_for_ratio(ratio: f64) -> Severity {
    if ratio >= 3.0 {
        Severity::Critical
    } else if ratio >= 2.0 {
        Severity::High
    } else {
        Severity::Medium
    }
}
