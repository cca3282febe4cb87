//! Source analysis: from Swift text to a declaration tree.
//!
//! ```text
//! ┌─────────────────┐     ┌───────────────┐     ┌──────────────────┐
//! │ .swift source   │────▶│ SwiftAnalyzer │────▶│ DeclarationTree  │
//! └─────────────────┘     └───────────────┘     └──────────────────┘
//!                                                        │
//!                                                        ▼
//!                                               ┌──────────────────┐
//!                                               │ DependencyGraph  │
//!                                               └──────────────────┘
//! ```
//!
//! Detectors only ever see [`model::DeclarationTree`] and the graph built
//! from it, never tree-sitter nodes.

pub mod graph;
pub mod model;
#[cfg(feature = "tree-sitter")]
mod swift;

pub use graph::{DependencyGraph, EdgeKind, TypeNode};
pub use model::{
    AccessBase, AccessLevel, ControlFlowInfo, DeclId, Declaration, DeclarationKind,
    DeclarationTree, FunctionBody, MemberAccess, Modifiers, SourceModule, Span, Statement,
    TypeMembers,
};
#[cfg(feature = "tree-sitter")]
pub use swift::SwiftAnalyzer;

use crate::error::ParseError;

/// Language front end producing declaration trees.
///
/// tree_sitter::Parser is not Sync, so implementations create a parser
/// per call.
pub trait LanguageAnalyzer: Send + Sync {
    /// Returns the language identifier (e.g., "swift").
    fn language_id(&self) -> &'static str;

    /// Returns file extensions this analyzer handles (without dot).
    fn file_extensions(&self) -> &'static [&'static str];

    /// Parse `source` into a declaration tree. `path` is only used in errors.
    ///
    /// Sources with syntax errors are rejected rather than partially analyzed.
    fn parse(&self, source: &str, path: &str) -> Result<DeclarationTree, ParseError>;

    /// Check if this analyzer handles the given file extension.
    fn handles_extension(&self, ext: &str) -> bool {
        self.file_extensions().contains(&ext)
    }
}

#[cfg(feature = "tree-sitter")]
static SWIFT_ANALYZER: once_cell::sync::OnceCell<SwiftAnalyzer> = once_cell::sync::OnceCell::new();

/// Get an analyzer for the given file extension.
///
/// Returns None if no analyzer handles the extension.
pub fn get_analyzer(ext: &str) -> Option<&'static dyn LanguageAnalyzer> {
    #[cfg(feature = "tree-sitter")]
    {
        let swift = SWIFT_ANALYZER.get_or_init(SwiftAnalyzer::new);
        if swift.handles_extension(ext) {
            return Some(swift);
        }
    }
    let _ = ext;
    None
}

/// Whether any analyzer handles the file extension.
pub fn is_supported_extension(ext: &str) -> bool {
    get_analyzer(ext).is_some()
}

#[cfg(all(test, feature = "tree-sitter"))]
mod tests {
    use super::*;

    #[test]
    fn test_get_analyzer() {
        assert_eq!(get_analyzer("swift").map(|a| a.language_id()), Some("swift"));
        assert!(get_analyzer("rs").is_none());
        assert!(!is_supported_extension("m"));
    }
}
