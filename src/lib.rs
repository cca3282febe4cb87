//! Archsmell - architectural smell detection for Swift.
//!
//! Archsmell parses Swift sources into declaration trees and runs a fixed
//! set of detectors over them: god classes, cyclic dependencies, message
//! chains, missing abstractions and fifteen more design smells. Each defect
//! carries a severity, a location and a remediation hint, and every file
//! gets a maintainability score.
//!
//! # Architecture
//!
//! - `analysis`: declaration tree model, dependency graph and the
//!   tree-sitter Swift front end
//! - `detect`: the detectors and the [`Runner`] that coordinates them
//! - `thresholds`: profiles and override files
//! - `scan`: file discovery and per-file analysis
//! - `aggregate`: directory-level results
//! - `report`: output formatting (pretty, JSON, Markdown)
//! - `score`: maintainability scoring and grading

pub mod aggregate;
pub mod analysis;
pub mod cli;
pub mod detect;
pub mod error;
pub mod report;
pub mod scan;
pub mod score;
pub mod thresholds;

pub use aggregate::{aggregate, aggregate_outcomes, DirectoryAnalysisResult, FileFailure, FileOutcome};
pub use analysis::{get_analyzer, Declaration, DeclarationKind, DeclarationTree, LanguageAnalyzer};
#[cfg(feature = "tree-sitter")]
pub use analysis::SwiftAnalyzer;
pub use detect::{AnalysisResult, ArchitecturalDefect, DefectType, Detector, Runner, Severity};
pub use error::{AnalysisError, ConfigError, DetectorError, ParseError};
pub use scan::{analyze_path, ScanOptions};
pub use thresholds::{Profile, Thresholds};
