//! Architectural defect detection.
//!
//! Each detector implements [`Detector`] and declares the defect types it may
//! emit. [`Runner`] executes the ordered set from [`default_detectors`] over
//! one declaration tree and builds an [`AnalysisResult`].

mod abstraction;
mod classes;
mod dependencies;
mod detector;
mod duplicates;
mod hierarchy;
mod methods;
mod modularity;
mod runner;
mod suppress;
mod types;

pub use abstraction::{
    DeficientEncapsulationDetector, ImperativeAbstractionDetector,
    MultifacetedAbstractionDetector, UnnecessaryAbstractionDetector,
};
pub use classes::{
    DataClassDetector, GodClassDetector, LazyClassDetector, MassiveControllerDetector,
};
pub use dependencies::{CyclicDependencyDetector, DenseStructureDetector};
pub use detector::{default_detectors, DetectionContext, Detector};
pub use duplicates::DuplicateBlockDetector;
pub use hierarchy::BrokenHierarchyDetector;
pub use methods::{FeatureEnvyDetector, LongMethodDetector, MessageChainDetector};
pub use modularity::{
    InsufficientModularizationDetector, MissingAbstractionDetector, UnstructuredModuleDetector,
    WeakenedModularityDetector,
};
pub use runner::{AnalysisResult, Runner, SkippedDetector};
pub use suppress::{
    filter_suppressed, matches_suppression, parse_suppressions, SuppressedDefect, Suppression,
    SuppressionType,
};
pub use types::{
    overage_ratio, severity_for_ratio, tiered_severity, ArchitecturalDefect, DefectType,
    Location, Severity,
};
