//! Inline suppression of defects via comments.
//!
//! Supports suppression comments like:
//! - `// archsmell:ignore <defect> - <reason>`
//! - `// archsmell:ignore-next-line <defect> - <reason>`
//! - `// archsmell:ignore-file <defect> - <reason>`
//!
//! `<defect>` is a defect id such as `god_class`, or `*` for all of them.
//! A defect is matched by the first line of its location.

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::types::{ArchitecturalDefect, DefectType};

/// File-level directives are only honored in the leading comment block or
/// within this many lines of the top.
const FILE_DIRECTIVE_WINDOW: usize = 10;

/// How a suppression applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuppressionType {
    /// Applies to the same line
    Line,
    /// Applies to the next line
    NextLine,
    /// Applies to the entire file
    File,
}

/// An inline suppression directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suppression {
    /// Defect id to suppress (e.g., "god_class") or "*" for all
    pub rule: String,
    pub reason: String,
    pub file: String,
    /// Line number (0 for file-level)
    pub line: usize,
    pub suppression_type: SuppressionType,
}

/// A defect that was suppressed, with the directive that silenced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuppressedDefect {
    pub defect: ArchitecturalDefect,
    pub suppression: Suppression,
}

lazy_static::lazy_static! {
    static ref SUPPRESSION_PATTERNS: Vec<Regex> = vec![
        // Line comment: // archsmell:...
        Regex::new(r"//\s*archsmell:(ignore(?:-file|-next-line)?)\s+(\S+)\s*(?:-\s*(.*))?").unwrap(),
        // Block comment: /* archsmell:... */
        Regex::new(r"/\*\s*archsmell:(ignore(?:-file|-next-line)?)\s+(\S+)\s*(?:-\s*(.*?))?\s*\*/").unwrap(),
    ];
}

/// Parse suppression directives from Swift source.
pub fn parse_suppressions(file_path: &str, content: &str) -> Vec<Suppression> {
    let mut suppressions = Vec::new();
    let mut in_header = true;

    for (line_num, line) in content.lines().enumerate() {
        let line_number = line_num + 1;
        let trimmed = line.trim();

        if in_header && !is_comment_or_empty(trimmed) {
            in_header = false;
        }

        for pattern in SUPPRESSION_PATTERNS.iter() {
            let Some(caps) = pattern.captures(line) else {
                continue;
            };
            let directive = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            let rule = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            let reason = caps
                .get(3)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default();

            let suppression_type = match directive {
                "ignore-file" => {
                    if !in_header && line_number > FILE_DIRECTIVE_WINDOW {
                        continue;
                    }
                    SuppressionType::File
                }
                "ignore-next-line" => SuppressionType::NextLine,
                "ignore" => {
                    // alone on its line it covers the next line, after code the same line
                    let alone = caps
                        .get(0)
                        .map(|m| line[..m.start()].trim().is_empty())
                        .unwrap_or(true);
                    if alone {
                        SuppressionType::NextLine
                    } else {
                        SuppressionType::Line
                    }
                }
                _ => continue,
            };

            suppressions.push(Suppression {
                rule: rule.to_string(),
                reason,
                file: file_path.to_string(),
                line: if suppression_type == SuppressionType::File {
                    0
                } else {
                    line_number
                },
                suppression_type,
            });
            break;
        }
    }

    suppressions
}

fn is_comment_or_empty(line: &str) -> bool {
    line.is_empty() || line.starts_with("//") || line.starts_with("/*") || line.starts_with('*')
}

/// Check if a defect matches a suppression.
pub fn matches_suppression(defect: &ArchitecturalDefect, suppression: &Suppression) -> bool {
    if defect.location.file != suppression.file {
        return false;
    }

    if suppression.rule != "*" {
        match DefectType::parse(&suppression.rule) {
            Some(rule) if rule == defect.defect_type => {}
            _ => return false,
        }
    }

    let line = defect.location.start_line;
    match suppression.suppression_type {
        SuppressionType::File => true,
        SuppressionType::Line => line == suppression.line,
        SuppressionType::NextLine => line == suppression.line + 1,
    }
}

/// Separate defects into active and suppressed.
pub fn filter_suppressed(
    defects: Vec<ArchitecturalDefect>,
    suppressions: &[Suppression],
) -> (Vec<ArchitecturalDefect>, Vec<SuppressedDefect>) {
    if suppressions.is_empty() {
        return (defects, Vec::new());
    }

    let mut active = Vec::new();
    let mut suppressed = Vec::new();

    for defect in defects {
        match suppressions.iter().find(|s| matches_suppression(&defect, s)) {
            Some(suppression) => suppressed.push(SuppressedDefect {
                defect,
                suppression: suppression.clone(),
            }),
            None => active.push(defect),
        }
    }

    (active, suppressed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::types::{Location, Severity};

    fn defect(defect_type: DefectType, line: usize) -> ArchitecturalDefect {
        ArchitecturalDefect::new(
            defect_type,
            Severity::Medium,
            "test",
            Location {
                file: "App.swift".to_string(),
                start_line: line,
                end_line: line + 10,
            },
        )
    }

    #[test]
    fn test_parse_suppressions() {
        let content = r#"// archsmell:ignore-file missing_abstraction - Constants file
import Foundation

// archsmell:ignore god_class - Legacy, tracked separately
final class Everything {
    var a = 1 // archsmell:ignore deficient_encapsulation
}
/* archsmell:ignore-next-line lazy_class - Placeholder */
struct Thin {}
"#;
        let suppressions = parse_suppressions("App.swift", content);
        assert_eq!(suppressions.len(), 4);

        assert_eq!(suppressions[0].suppression_type, SuppressionType::File);
        assert_eq!(suppressions[0].rule, "missing_abstraction");
        assert_eq!(suppressions[0].reason, "Constants file");

        assert_eq!(suppressions[1].suppression_type, SuppressionType::NextLine);
        assert_eq!(suppressions[1].line, 4);

        assert_eq!(suppressions[2].suppression_type, SuppressionType::Line);
        assert_eq!(suppressions[2].line, 6);

        assert_eq!(suppressions[3].suppression_type, SuppressionType::NextLine);
        assert_eq!(suppressions[3].reason, "Placeholder");
    }

    #[test]
    fn test_file_directive_outside_header_is_ignored() {
        let mut content = String::from("import Foundation\n");
        for _ in 0..20 {
            content.push_str("let x = 1\n");
        }
        content.push_str("// archsmell:ignore-file * - too late\n");
        assert!(parse_suppressions("App.swift", &content).is_empty());
    }

    #[test]
    fn test_matches_suppression() {
        let d = defect(DefectType::GodClass, 5);

        let next_line = Suppression {
            rule: "god_class".to_string(),
            reason: String::new(),
            file: "App.swift".to_string(),
            line: 4,
            suppression_type: SuppressionType::NextLine,
        };
        assert!(matches_suppression(&d, &next_line));

        let wrong_rule = Suppression {
            rule: "lazy_class".to_string(),
            ..next_line.clone()
        };
        assert!(!matches_suppression(&d, &wrong_rule));

        let unknown_rule = Suppression {
            rule: "not_a_defect".to_string(),
            ..next_line.clone()
        };
        assert!(!matches_suppression(&d, &unknown_rule));

        let wildcard_file = Suppression {
            rule: "*".to_string(),
            line: 0,
            suppression_type: SuppressionType::File,
            ..next_line.clone()
        };
        assert!(matches_suppression(&d, &wildcard_file));

        let other_file = Suppression {
            file: "Other.swift".to_string(),
            ..wildcard_file
        };
        assert!(!matches_suppression(&d, &other_file));
    }

    #[test]
    fn test_filter_suppressed() {
        let defects = vec![defect(DefectType::GodClass, 5), defect(DefectType::LongMethod, 9)];
        let suppressions = vec![Suppression {
            rule: "long_method".to_string(),
            reason: "generated".to_string(),
            file: "App.swift".to_string(),
            line: 0,
            suppression_type: SuppressionType::File,
        }];
        let (active, suppressed) = filter_suppressed(defects, &suppressions);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].defect_type, DefectType::GodClass);
        assert_eq!(suppressed.len(), 1);
        assert_eq!(suppressed[0].suppression.reason, "generated");
    }
}
