//! Error types for analysis, parsing, detection and configuration.

use std::path::PathBuf;

use thiserror::Error;

use crate::analysis::model::DeclId;
use crate::detect::DefectType;

/// A source file that could not be turned into a declaration tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{path}:{line}: {reason}")]
pub struct ParseError {
    pub path: String,
    pub line: usize,
    pub reason: String,
}

impl ParseError {
    pub fn new(path: impl Into<String>, line: usize, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }
}

/// Errors raised while locating, reading or parsing input.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("path not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("unsupported file type: {} (expected a .swift file)", .0.display())]
    UnsupportedFileType(PathBuf),
    #[error("no source files found under {}", .0.display())]
    NoSourceFiles(PathBuf),
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is not valid UTF-8", .0.display())]
    Decode(PathBuf),
    #[error("parse error in {0}")]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A detector that could not evaluate a tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetectorError {
    #[error("declaration {0} refers to a parent that is not in the tree")]
    DanglingDeclaration(DeclId),
    #[error("emitted {0} which is not in its declared set")]
    UndeclaredDefectType(DefectType),
    #[error("malformed tree: {0}")]
    Malformed(String),
}

/// Invalid threshold configuration. Always fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config syntax in {}: {source}", path.display())]
    Syntax {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
    #[error("invalid exclude pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}
